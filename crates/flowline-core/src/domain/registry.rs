use async_trait::async_trait;
use std::sync::Arc;
#[cfg(feature = "testing")]
use tokio::sync::RwLock;

use super::flow_definition::FlowDefinition;
use crate::EngineError;

/// Lookup capability over the registered flow definitions
///
/// The session scans the returned definitions and matches ids itself;
/// the registry only has to enumerate. Implementations must not contain
/// duplicate ids, since the scan stops at the first match.
#[async_trait]
pub trait DefinitionRegistry: Send + Sync {
    /// All registered flow definitions
    async fn all_definitions(&self) -> Result<Vec<Arc<FlowDefinition>>, EngineError>;
}

/// In-memory definition registry
///
/// Validates definitions and rejects duplicate ids at registration time,
/// so a scan over `all_definitions` has a single match per id.
#[cfg(feature = "testing")]
#[derive(Default)]
pub struct MemoryDefinitionRegistry {
    definitions: RwLock<Vec<Arc<FlowDefinition>>>,
}

#[cfg(feature = "testing")]
impl MemoryDefinitionRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            definitions: RwLock::new(Vec::new()),
        }
    }

    /// Register a flow definition
    ///
    /// Fails with a validation error when the definition is invalid or
    /// another definition with the same id is already registered.
    pub async fn register(&self, definition: FlowDefinition) -> Result<(), EngineError> {
        definition.validate()?;

        let mut definitions = self.definitions.write().await;
        if definitions.iter().any(|d| d.id == definition.id) {
            return Err(EngineError::Validation(format!(
                "Duplicate flow definition ID: {}",
                definition.id.0
            )));
        }

        definitions.push(Arc::new(definition));
        Ok(())
    }
}

#[cfg(feature = "testing")]
#[async_trait]
impl DefinitionRegistry for MemoryDefinitionRegistry {
    async fn all_definitions(&self) -> Result<Vec<Arc<FlowDefinition>>, EngineError> {
        Ok(self.definitions.read().await.clone())
    }
}
