use super::descriptor::FlowInstanceDescriptor;

/// Extracts the roles of the caller driving a flow instance
///
/// Configured explicitly on the session, never auto-detected. The engine
/// treats it as a pass-through: the extracted roles reach transition
/// actions via the transition context, and any permission decision
/// belongs to the action.
pub trait RoleExtractor: Send + Sync {
    /// The roles relevant to the given instance descriptor
    fn roles(&self, descriptor: &FlowInstanceDescriptor) -> Vec<String>;
}

/// Role extractor returning a fixed set of roles
///
/// Useful for tests and for single-principal embeddings where the role
/// set is known at wiring time.
#[derive(Debug, Clone, Default)]
pub struct StaticRoleExtractor {
    roles: Vec<String>,
}

impl StaticRoleExtractor {
    /// Create an extractor that always reports the given roles
    pub fn new(roles: Vec<String>) -> Self {
        Self { roles }
    }
}

impl RoleExtractor for StaticRoleExtractor {
    fn roles(&self, _descriptor: &FlowInstanceDescriptor) -> Vec<String> {
        self.roles.clone()
    }
}
