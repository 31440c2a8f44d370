//! Descriptor persistence interfaces
//!
//! The engine defines the persister contract and the kind-based dispatch
//! registry; external crates implement the contract to provide real
//! storage. Policy decisions such as archiving terminal instances belong
//! to the persister, not the engine.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use super::descriptor::{DescriptorKind, FlowInstanceDescriptor, DEFAULT_PERSISTER_KIND};
use crate::EngineError;

/// Storage strategy for descriptors of a given kind
#[async_trait]
pub trait DescriptorPersister: Send + Sync {
    /// Persist the descriptor
    async fn persist(&self, descriptor: &FlowInstanceDescriptor) -> Result<(), EngineError>;

    /// Enumerate descriptors whose timeout deadline has passed
    ///
    /// A persister with no overdue descriptors returns an empty vector;
    /// the timeout sweep skips it.
    async fn overdue_descriptors(&self) -> Result<Vec<FlowInstanceDescriptor>, EngineError>;
}

/// Persister that stores nothing and reports nothing overdue
#[derive(Debug, Default)]
pub struct NoopDescriptorPersister;

#[async_trait]
impl DescriptorPersister for NoopDescriptorPersister {
    async fn persist(&self, _descriptor: &FlowInstanceDescriptor) -> Result<(), EngineError> {
        Ok(())
    }

    async fn overdue_descriptors(&self) -> Result<Vec<FlowInstanceDescriptor>, EngineError> {
        Ok(Vec::new())
    }
}

/// Maps descriptor kinds to persisters, with a guaranteed default
///
/// The reserved `"default"` entry always exists: construction populates
/// it with a no-op persister, and [`PersisterRegistry::with_default`]
/// replaces it. Lookup never fails; kinds without a specific persister
/// silently resolve to the default.
pub struct PersisterRegistry {
    persisters: HashMap<String, Arc<dyn DescriptorPersister>>,
}

impl PersisterRegistry {
    /// Create a registry holding only the no-op default persister
    pub fn new() -> Self {
        let mut persisters: HashMap<String, Arc<dyn DescriptorPersister>> = HashMap::new();
        persisters.insert(
            DEFAULT_PERSISTER_KIND.to_string(),
            Arc::new(NoopDescriptorPersister),
        );
        Self { persisters }
    }

    /// Register a persister for a specific descriptor kind
    pub fn with_persister(
        mut self,
        kind: DescriptorKind,
        persister: Arc<dyn DescriptorPersister>,
    ) -> Self {
        self.persisters.insert(kind.0, persister);
        self
    }

    /// Replace the default persister
    pub fn with_default(mut self, persister: Arc<dyn DescriptorPersister>) -> Self {
        self.persisters
            .insert(DEFAULT_PERSISTER_KIND.to_string(), persister);
        self
    }

    /// Resolve the persister for a descriptor kind
    ///
    /// Falls back to the default entry when no specific persister is
    /// registered. Total: the default always exists.
    pub fn find(&self, kind: &DescriptorKind) -> Arc<dyn DescriptorPersister> {
        if let Some(persister) = self.persisters.get(&kind.0) {
            return persister.clone();
        }

        self.persisters
            .get(DEFAULT_PERSISTER_KIND)
            .expect("registry always holds a default persister")
            .clone()
    }

    /// All registered persisters, each distinct persister exactly once
    ///
    /// A persister registered under several kinds (or as both a specific
    /// kind and the default) is yielded a single time so a timeout sweep
    /// never processes its descriptors twice.
    pub fn distinct(&self) -> Vec<Arc<dyn DescriptorPersister>> {
        let mut result: Vec<Arc<dyn DescriptorPersister>> = Vec::new();

        for persister in self.persisters.values() {
            if !result.iter().any(|seen| Arc::ptr_eq(seen, persister)) {
                result.push(persister.clone());
            }
        }

        result
    }
}

impl Default for PersisterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Memory implementations for testing
#[cfg(feature = "testing")]
pub mod memory {
    use super::*;
    use chrono::Utc;
    use dashmap::DashMap;

    /// In-memory descriptor persister backed by a concurrent map
    ///
    /// Overdue enumeration returns every stored descriptor flagged with
    /// timeouts whose entry timestamp is in the past; the sweep's
    /// trigger evaluation decides whether anything actually fires.
    pub struct MemoryDescriptorPersister {
        descriptors: Arc<DashMap<String, FlowInstanceDescriptor>>,
    }

    impl MemoryDescriptorPersister {
        /// Create a new empty memory persister
        pub fn new() -> Self {
            Self {
                descriptors: Arc::new(DashMap::new()),
            }
        }

        /// Fetch a stored descriptor by id
        pub fn get(&self, id: &str) -> Option<FlowInstanceDescriptor> {
            self.descriptors.get(id).map(|d| d.clone())
        }

        /// Number of stored descriptors
        pub fn len(&self) -> usize {
            self.descriptors.len()
        }

        /// Whether the persister holds no descriptors
        pub fn is_empty(&self) -> bool {
            self.descriptors.is_empty()
        }
    }

    impl Default for MemoryDescriptorPersister {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl DescriptorPersister for MemoryDescriptorPersister {
        async fn persist(&self, descriptor: &FlowInstanceDescriptor) -> Result<(), EngineError> {
            self.descriptors
                .insert(descriptor.id.0.clone(), descriptor.clone());
            Ok(())
        }

        async fn overdue_descriptors(&self) -> Result<Vec<FlowInstanceDescriptor>, EngineError> {
            let now = Utc::now();

            Ok(self
                .descriptors
                .iter()
                .filter(|entry| entry.with_timeouts && entry.entered_at < now)
                .map(|entry| entry.clone())
                .collect())
        }
    }
}
