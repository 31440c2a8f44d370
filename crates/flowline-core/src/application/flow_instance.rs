use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::domain::action::TransitionContext;
use crate::domain::descriptor::FlowInstanceDescriptor;
use crate::domain::flow_definition::{
    FlowDefinition, StateDefinition, TransitionDefinition, TransitionId,
};
use crate::domain::persister::DescriptorPersister;
use crate::domain::roles::RoleExtractor;
use crate::EngineError;

/// One running execution of a flow
///
/// A transient delegate binding a flow definition, an instance
/// descriptor, the persister resolved for the descriptor's kind, and the
/// session's role extractor. Never persisted itself; the session
/// recreates it from a descriptor on demand via `find`.
pub struct FlowInstance {
    definition: Arc<FlowDefinition>,
    descriptor: FlowInstanceDescriptor,
    persister: Arc<dyn DescriptorPersister>,
    role_extractor: Option<Arc<dyn RoleExtractor>>,
}

impl FlowInstance {
    pub(crate) fn new(
        definition: Arc<FlowDefinition>,
        descriptor: FlowInstanceDescriptor,
        persister: Arc<dyn DescriptorPersister>,
        role_extractor: Option<Arc<dyn RoleExtractor>>,
    ) -> Self {
        Self {
            definition,
            descriptor,
            persister,
            role_extractor,
        }
    }

    /// The flow definition this instance runs
    pub fn definition(&self) -> &FlowDefinition {
        &self.definition
    }

    /// The instance descriptor
    pub fn descriptor(&self) -> &FlowInstanceDescriptor {
        &self.descriptor
    }

    /// Consume the delegate, yielding its descriptor
    pub fn into_descriptor(self) -> FlowInstanceDescriptor {
        self.descriptor
    }

    /// When the instance entered its current state
    pub fn entered_at(&self) -> DateTime<Utc> {
        self.descriptor.entered_at
    }

    /// The definition of the instance's current state
    pub fn current_state(&self) -> Result<&StateDefinition, EngineError> {
        self.definition
            .find_state(&self.descriptor.state_id)
            .ok_or_else(|| EngineError::UnknownState(self.descriptor.state_id.0.clone()))
    }

    /// The current state's outgoing transitions
    ///
    /// A live view, not a snapshot: after a transition, repeated calls
    /// reflect the new state.
    pub fn transition_definitions(&self) -> Result<&[TransitionDefinition], EngineError> {
        Ok(self.current_state()?.transitions.as_slice())
    }

    /// Perform the transition with the given id
    ///
    /// Locates the transition among the current state's outgoing
    /// transitions, runs its action, and only after the action succeeds
    /// moves the descriptor to the target state (resetting the entry
    /// timestamp and timeout flag) and persists it. A failed action
    /// leaves the descriptor untouched and unpersisted.
    pub async fn perform_transition(
        &mut self,
        transition_id: &TransitionId,
    ) -> Result<(), EngineError> {
        let state = self.current_state()?;
        let transition = state.find_transition(transition_id).ok_or_else(|| {
            EngineError::InvalidTransition {
                state: state.id.0.clone(),
                transition: transition_id.0.clone(),
            }
        })?;

        let target_id = transition.target.clone();
        let action = transition.action.clone();
        let target_state = self
            .definition
            .find_state(&target_id)
            .ok_or_else(|| EngineError::UnknownState(target_id.0.clone()))?;
        let target_has_timeouts = target_state.has_timeouts();

        if let Some(action) = action {
            let roles = self
                .role_extractor
                .as_ref()
                .map(|extractor| extractor.roles(&self.descriptor))
                .unwrap_or_default();

            let context = TransitionContext {
                flow_id: &self.descriptor.flow_id,
                transition_id,
                descriptor: &self.descriptor,
                roles,
            };

            action.perform(context).await?;
        }

        debug!(
            flow = %self.descriptor.flow_id.0,
            from = %self.descriptor.state_id.0,
            to = %target_id.0,
            transition = %transition_id.0,
            "performing transition"
        );

        self.descriptor.state_id = target_id;
        self.descriptor.entered_at = Utc::now();
        self.descriptor.with_timeouts = target_has_timeouts;

        self.persister.persist(&self.descriptor).await
    }
}

impl fmt::Debug for FlowInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowInstance")
            .field("definition", &self.definition.id)
            .field("descriptor", &self.descriptor)
            .finish()
    }
}
