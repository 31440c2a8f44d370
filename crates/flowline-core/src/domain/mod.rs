/// Flow definition domain models
pub mod flow_definition;

/// Flow instance descriptors and descriptor factories
pub mod descriptor;

/// Descriptor persistence interfaces and kind-based dispatch
pub mod persister;

/// Flow definition registry interface
pub mod registry;

/// Timeout triggers
pub mod trigger;

/// Transition actions
pub mod action;

/// Role extraction
pub mod roles;
