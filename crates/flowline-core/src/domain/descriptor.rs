use crate::domain::flow_definition::{FlowId, StateId};
use crate::DataPacket;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reserved registry key for the fallback persister
pub const DEFAULT_PERSISTER_KIND: &str = "default";

/// Value object: Descriptor ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DescriptorId(pub String);

/// Tag identifying the kind of a descriptor for persister dispatch
///
/// Dispatch is an explicit mapping from this tag to a persister,
/// resolved at configuration time. Extensions mint their own kinds;
/// descriptors with an unregistered kind fall back to the persister
/// registered under [`DEFAULT_PERSISTER_KIND`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DescriptorKind(pub String);

impl Default for DescriptorKind {
    fn default() -> Self {
        Self(DEFAULT_PERSISTER_KIND.to_string())
    }
}

/// The persisted, mutable state of one running flow instance
///
/// Created at start time, persisted immediately after creation and after
/// every transition. Mutated through the flow instance delegate during
/// transitions; the payload is free for extensions to use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowInstanceDescriptor {
    /// Unique identifier, minted at creation
    pub id: DescriptorId,

    /// Kind tag used for persister dispatch
    pub kind: DescriptorKind,

    /// ID of the flow definition this instance runs
    pub flow_id: FlowId,

    /// Current state of the instance
    pub state_id: StateId,

    /// When the instance entered its current state
    pub entered_at: DateTime<Utc>,

    /// Whether the current state has timeout-triggered transitions
    pub with_timeouts: bool,

    /// Extension-specific payload, opaque to the engine
    pub payload: DataPacket,
}

impl FlowInstanceDescriptor {
    /// Create a blank descriptor of the given kind
    ///
    /// Flow id, state id, and the timeout flag are filled in by the
    /// session when the instance starts.
    pub fn new(kind: DescriptorKind) -> Self {
        Self {
            id: DescriptorId(Uuid::new_v4().to_string()),
            kind,
            flow_id: FlowId(String::new()),
            state_id: StateId(String::new()),
            entered_at: Utc::now(),
            with_timeouts: false,
            payload: DataPacket::null(),
        }
    }
}

/// Creates fresh descriptors
///
/// A flow definition carries one as its descriptor source; callers may
/// also supply one per `start` call to mint extension descriptors.
pub trait DescriptorCreator: Send + Sync {
    /// Create a fresh, uninitialized descriptor
    fn create(&self) -> FlowInstanceDescriptor;
}

/// Mutates a freshly initialized descriptor before it is persisted
///
/// Runs after the session's built-in initialization, so it sees the
/// start state, flow id, and entry timestamp already set.
pub trait DescriptorInitializer: Send + Sync {
    /// Apply caller-specific initialization to the descriptor
    fn initialize(&self, descriptor: &mut FlowInstanceDescriptor);
}

/// Default descriptor source: plain descriptors of the default kind
#[derive(Debug, Default)]
pub struct DefaultDescriptorSource;

impl DescriptorCreator for DefaultDescriptorSource {
    fn create(&self) -> FlowInstanceDescriptor {
        FlowInstanceDescriptor::new(DescriptorKind::default())
    }
}
