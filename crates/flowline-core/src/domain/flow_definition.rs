use crate::domain::action::TransitionAction;
use crate::domain::descriptor::{DefaultDescriptorSource, DescriptorCreator};
use crate::EngineError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Value object: Flow ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlowId(pub String);

/// Value object: State ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateId(pub String);

/// Value object: Transition ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransitionId(pub String);

/// An edge between two states, optionally timeout-triggered
///
/// The action, if any, is a plain closure or trait object registered
/// directly on the transition. It runs before the instance moves to the
/// target state and may veto the transition by failing.
#[derive(Clone)]
pub struct TransitionDefinition {
    /// ID of the transition
    pub id: TransitionId,

    /// The state this transition leads to
    pub target: StateId,

    /// Optional timeout expression; absence means not timeout-triggered
    pub timeout: Option<String>,

    /// Optional action executed when the transition is performed
    pub action: Option<Arc<dyn TransitionAction>>,
}

impl TransitionDefinition {
    /// Create a transition with no timeout and no action
    pub fn new(id: TransitionId, target: StateId) -> Self {
        Self {
            id,
            target,
            timeout: None,
            action: None,
        }
    }

    /// Attach a timeout expression to this transition
    pub fn with_timeout(mut self, expression: impl Into<String>) -> Self {
        self.timeout = Some(expression.into());
        self
    }

    /// Attach an action to this transition
    pub fn with_action(mut self, action: Arc<dyn TransitionAction>) -> Self {
        self.action = Some(action);
        self
    }

    /// Check whether this transition carries a timeout expression
    #[inline]
    pub fn is_timeout_triggered(&self) -> bool {
        self.timeout.is_some()
    }
}

impl fmt::Debug for TransitionDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionDefinition")
            .field("id", &self.id)
            .field("target", &self.target)
            .field("timeout", &self.timeout)
            .field("has_action", &self.action.is_some())
            .finish()
    }
}

/// A state within a flow definition
#[derive(Debug, Clone)]
pub struct StateDefinition {
    /// ID of the state
    pub id: StateId,

    /// Outgoing transitions from this state
    pub transitions: Vec<TransitionDefinition>,
}

impl StateDefinition {
    /// Create a state with the given outgoing transitions
    pub fn new(id: StateId, transitions: Vec<TransitionDefinition>) -> Self {
        Self { id, transitions }
    }

    /// Create a terminal state with no outgoing transitions
    pub fn terminal(id: StateId) -> Self {
        Self {
            id,
            transitions: Vec::new(),
        }
    }

    /// Whether any outgoing transition is timeout-triggered
    ///
    /// Derived from the transitions rather than stored, so the flag can
    /// never drift from the actual timeout expressions.
    pub fn has_timeouts(&self) -> bool {
        self.transitions.iter().any(|t| t.is_timeout_triggered())
    }

    /// Find an outgoing transition by id
    pub fn find_transition(&self, id: &TransitionId) -> Option<&TransitionDefinition> {
        self.transitions.iter().find(|t| &t.id == id)
    }
}

/// A named workflow type: states, transitions, and a designated start state
///
/// Immutable after registration. The descriptor source creates fresh
/// descriptors for `start` calls that do not supply their own creator.
#[derive(Clone)]
pub struct FlowDefinition {
    /// ID of the flow
    pub id: FlowId,

    /// The state a fresh instance enters
    pub start_state: StateId,

    /// The states in this flow
    pub states: Vec<StateDefinition>,

    descriptor_source: Arc<dyn DescriptorCreator>,
}

impl FlowDefinition {
    /// Create a flow definition with the default descriptor source
    pub fn new(id: FlowId, start_state: StateId, states: Vec<StateDefinition>) -> Self {
        Self {
            id,
            start_state,
            states,
            descriptor_source: Arc::new(DefaultDescriptorSource),
        }
    }

    /// Replace the source used to create fresh descriptors
    pub fn with_descriptor_source(mut self, source: Arc<dyn DescriptorCreator>) -> Self {
        self.descriptor_source = source;
        self
    }

    /// The source used to create fresh descriptors
    pub fn descriptor_source(&self) -> &Arc<dyn DescriptorCreator> {
        &self.descriptor_source
    }

    /// Find a state by id
    pub fn find_state(&self, id: &StateId) -> Option<&StateDefinition> {
        self.states.iter().find(|s| &s.id == id)
    }

    /// The definition of the designated start state
    pub fn start_state_definition(&self) -> Result<&StateDefinition, EngineError> {
        self.find_state(&self.start_state)
            .ok_or_else(|| EngineError::UnknownState(self.start_state.0.clone()))
    }

    /// Validate the flow definition
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.states.is_empty() {
            return Err(EngineError::Validation(
                "Flow must have at least one state".to_string(),
            ));
        }

        // Check for state ID uniqueness
        let mut state_ids = std::collections::HashSet::new();
        for state in &self.states {
            if !state_ids.insert(&state.id) {
                return Err(EngineError::Validation(format!(
                    "Duplicate state ID: {}",
                    state.id.0
                )));
            }
        }

        // The start state must exist
        if !state_ids.contains(&self.start_state) {
            return Err(EngineError::Validation(format!(
                "Start state does not exist: {}",
                self.start_state.0
            )));
        }

        // Every transition target must resolve to a state
        for state in &self.states {
            for transition in &state.transitions {
                if !state_ids.contains(&transition.target) {
                    return Err(EngineError::Validation(format!(
                        "Transition {} in state {} targets non-existent state: {}",
                        transition.id.0, state.id.0, transition.target.0
                    )));
                }
            }
        }

        Ok(())
    }
}

impl fmt::Debug for FlowDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowDefinition")
            .field("id", &self.id)
            .field("start_state", &self.start_state)
            .field("states", &self.states)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_state_flow() -> FlowDefinition {
        FlowDefinition::new(
            FlowId("order".to_string()),
            StateId("new".to_string()),
            vec![
                StateDefinition::new(
                    StateId("new".to_string()),
                    vec![TransitionDefinition::new(
                        TransitionId("ship".to_string()),
                        StateId("shipped".to_string()),
                    )
                    .with_timeout("24h")],
                ),
                StateDefinition::terminal(StateId("shipped".to_string())),
            ],
        )
    }

    #[test]
    fn test_valid_definition() {
        assert!(two_state_flow().validate().is_ok());
    }

    #[test]
    fn test_empty_states_rejected() {
        let definition = FlowDefinition::new(
            FlowId("empty".to_string()),
            StateId("new".to_string()),
            Vec::new(),
        );

        assert!(matches!(
            definition.validate(),
            Err(EngineError::Validation(_))
        ));
    }

    #[test]
    fn test_duplicate_state_ids_rejected() {
        let definition = FlowDefinition::new(
            FlowId("dupes".to_string()),
            StateId("new".to_string()),
            vec![
                StateDefinition::terminal(StateId("new".to_string())),
                StateDefinition::terminal(StateId("new".to_string())),
            ],
        );

        let err = definition.validate().unwrap_err();
        assert_eq!(
            err,
            EngineError::Validation("Duplicate state ID: new".to_string())
        );
    }

    #[test]
    fn test_missing_start_state_rejected() {
        let definition = FlowDefinition::new(
            FlowId("order".to_string()),
            StateId("missing".to_string()),
            vec![StateDefinition::terminal(StateId("new".to_string()))],
        );

        assert!(matches!(
            definition.validate(),
            Err(EngineError::Validation(_))
        ));
    }

    #[test]
    fn test_dangling_transition_target_rejected() {
        let definition = FlowDefinition::new(
            FlowId("order".to_string()),
            StateId("new".to_string()),
            vec![StateDefinition::new(
                StateId("new".to_string()),
                vec![TransitionDefinition::new(
                    TransitionId("ship".to_string()),
                    StateId("nowhere".to_string()),
                )],
            )],
        );

        assert!(matches!(
            definition.validate(),
            Err(EngineError::Validation(_))
        ));
    }

    #[test]
    fn test_has_timeouts_is_derived() {
        let flow = two_state_flow();
        assert!(flow.find_state(&StateId("new".to_string())).unwrap().has_timeouts());
        assert!(!flow
            .find_state(&StateId("shipped".to_string()))
            .unwrap()
            .has_timeouts());
    }

    #[test]
    fn test_find_transition() {
        let flow = two_state_flow();
        let state = flow.start_state_definition().unwrap();

        assert!(state.find_transition(&TransitionId("ship".to_string())).is_some());
        assert!(state.find_transition(&TransitionId("cancel".to_string())).is_none());
    }
}
