use thiserror::Error;

/// Core error type for the Flowline engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// No registered flow definition matches the requested id
    #[error("Flow definition not found: {0}")]
    NoSuchFlowDefinition(String),

    /// A descriptor references a state its flow definition does not contain
    #[error("Unknown state: {0}")]
    UnknownState(String),

    /// The requested transition does not exist on the current state
    #[error("Invalid transition `{transition}` from state `{state}`")]
    InvalidTransition {
        /// Current state of the instance
        state: String,
        /// The transition id that was requested
        transition: String,
    },

    /// Flow definition validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// A transition action failed
    #[error("Transition action error: {0}")]
    Action(String),

    /// A persister failed to store or enumerate descriptors
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// A timeout expression could not be evaluated
    #[error("Timeout expression error: {0}")]
    TimeoutExpression(String),
}
