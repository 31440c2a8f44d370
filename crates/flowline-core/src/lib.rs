//!
//! Flowline Core - a lightweight in-process workflow engine
//!
//! Flows are declared as states and transitions; the session starts,
//! locates, and advances instances of them, persisting each instance's
//! descriptor through a pluggable persister dispatched by descriptor
//! kind. A timeout sweep re-evaluates pending instances and fires the
//! transitions whose timeout expressions have elapsed.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Domain layer - flow definitions, descriptors, and collaborator traits
pub mod domain;

/// Application services - the session orchestrator and instance delegate
pub mod application;

/// Core types
pub mod types;

/// Error types
pub mod error;

// Re-export key types
pub use error::EngineError;
pub use types::DataPacket;

// Re-export main API types for easy use
pub use application::flow_instance::FlowInstance;
pub use application::flow_session::FlowSession;
pub use domain::action::{action_fn, TransitionAction, TransitionContext};
pub use domain::descriptor::{
    DefaultDescriptorSource, DescriptorCreator, DescriptorId, DescriptorInitializer,
    DescriptorKind, FlowInstanceDescriptor, DEFAULT_PERSISTER_KIND,
};
pub use domain::flow_definition::{
    FlowDefinition, FlowId, StateDefinition, StateId, TransitionDefinition, TransitionId,
};
pub use domain::persister::{DescriptorPersister, NoopDescriptorPersister, PersisterRegistry};
pub use domain::registry::DefinitionRegistry;
pub use domain::roles::{RoleExtractor, StaticRoleExtractor};
pub use domain::trigger::{SimpleTimeoutTrigger, TimeoutTrigger};

#[cfg(feature = "testing")]
pub use domain::persister::memory::MemoryDescriptorPersister;
#[cfg(feature = "testing")]
pub use domain::registry::MemoryDefinitionRegistry;
