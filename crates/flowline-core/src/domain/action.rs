use async_trait::async_trait;
use std::sync::Arc;

use super::descriptor::FlowInstanceDescriptor;
use super::flow_definition::{FlowId, TransitionId};
use crate::EngineError;

/// Context handed to a transition action
///
/// Borrows the descriptor as it was when the transition was requested;
/// the delegate only mutates and persists after the action returns
/// successfully.
pub struct TransitionContext<'a> {
    /// ID of the flow definition the instance runs
    pub flow_id: &'a FlowId,

    /// ID of the transition being performed
    pub transition_id: &'a TransitionId,

    /// The instance descriptor, pre-transition
    pub descriptor: &'a FlowInstanceDescriptor,

    /// Roles produced by the session's role extractor, empty when none
    /// is configured
    pub roles: Vec<String>,
}

/// Action executed when a transition is performed
///
/// Failures propagate uncaught through `perform_transition` and veto the
/// transition: the descriptor is neither mutated nor persisted.
#[async_trait]
pub trait TransitionAction: Send + Sync {
    /// Run the action
    async fn perform(&self, context: TransitionContext<'_>) -> Result<(), EngineError>;
}

struct FnTransitionAction<F> {
    action: F,
}

#[async_trait]
impl<F> TransitionAction for FnTransitionAction<F>
where
    F: for<'a> Fn(TransitionContext<'a>) -> Result<(), EngineError> + Send + Sync,
{
    async fn perform(&self, context: TransitionContext<'_>) -> Result<(), EngineError> {
        (self.action)(context)
    }
}

/// Wrap a plain closure as a transition action
///
/// ```
/// use flowline_core::{action_fn, EngineError};
///
/// let action = action_fn(|context| {
///     if context.roles.iter().any(|role| role == "admin") {
///         Ok(())
///     } else {
///         Err(EngineError::Action("admin role required".to_string()))
///     }
/// });
/// ```
pub fn action_fn<F>(action: F) -> Arc<dyn TransitionAction>
where
    F: for<'a> Fn(TransitionContext<'a>) -> Result<(), EngineError> + Send + Sync + 'static,
{
    Arc::new(FnTransitionAction { action })
}
