use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::application::flow_instance::FlowInstance;
use crate::domain::descriptor::{DescriptorCreator, DescriptorInitializer, FlowInstanceDescriptor};
use crate::domain::flow_definition::{FlowDefinition, FlowId, TransitionId};
use crate::domain::persister::PersisterRegistry;
use crate::domain::registry::DefinitionRegistry;
use crate::domain::roles::RoleExtractor;
use crate::domain::trigger::{SimpleTimeoutTrigger, TimeoutTrigger};
use crate::EngineError;

/// The flow-session orchestrator
///
/// Starts and locates flow instances and drives the timeout sweep. Holds
/// no locks of its own: safe to share across tasks as long as the
/// injected collaborators are thread-safe.
pub struct FlowSession {
    definitions: Arc<dyn DefinitionRegistry>,
    persisters: PersisterRegistry,
    role_extractor: Option<Arc<dyn RoleExtractor>>,
    timeout_trigger: Arc<dyn TimeoutTrigger>,
}

impl FlowSession {
    /// Create a session over the given definitions and persisters
    ///
    /// No role extractor is configured; timeout expressions are
    /// evaluated by [`SimpleTimeoutTrigger`] until overridden.
    pub fn new(definitions: Arc<dyn DefinitionRegistry>, persisters: PersisterRegistry) -> Self {
        Self {
            definitions,
            persisters,
            role_extractor: None,
            timeout_trigger: Arc::new(SimpleTimeoutTrigger),
        }
    }

    /// Configure the role extractor passed to every flow instance
    pub fn with_role_extractor(mut self, extractor: Arc<dyn RoleExtractor>) -> Self {
        self.role_extractor = Some(extractor);
        self
    }

    /// Replace the trigger used to evaluate timeout expressions
    pub fn with_timeout_trigger(mut self, trigger: Arc<dyn TimeoutTrigger>) -> Self {
        self.timeout_trigger = trigger;
        self
    }

    /// Start a new instance of the flow with the given id
    ///
    /// The descriptor comes from the definition's descriptor source.
    pub async fn start(&self, flow_id: &FlowId) -> Result<FlowInstance, EngineError> {
        self.do_start(flow_id, None, None).await
    }

    /// Start a new instance with a caller-supplied descriptor creator
    pub async fn start_with_creator(
        &self,
        flow_id: &FlowId,
        creator: &dyn DescriptorCreator,
    ) -> Result<FlowInstance, EngineError> {
        self.do_start(flow_id, Some(creator), None).await
    }

    /// Start a new instance with a caller-supplied descriptor initializer
    ///
    /// The initializer runs after the built-in initialization and may
    /// further mutate the descriptor before it is persisted. Callers
    /// needing both a creator and an initializer compose them into a
    /// creator before calling.
    pub async fn start_with_initializer(
        &self,
        flow_id: &FlowId,
        initializer: &dyn DescriptorInitializer,
    ) -> Result<FlowInstance, EngineError> {
        self.do_start(flow_id, None, Some(initializer)).await
    }

    async fn do_start(
        &self,
        flow_id: &FlowId,
        creator: Option<&dyn DescriptorCreator>,
        initializer: Option<&dyn DescriptorInitializer>,
    ) -> Result<FlowInstance, EngineError> {
        let definition = self.lookup_definition(flow_id).await?;

        let mut descriptor = match creator {
            Some(creator) => creator.create(),
            None => definition.descriptor_source().create(),
        };

        let start_state = definition.start_state_definition()?;
        descriptor.state_id = start_state.id.clone();
        descriptor.flow_id = flow_id.clone();
        descriptor.entered_at = Utc::now();
        descriptor.with_timeouts = start_state.has_timeouts();

        if let Some(initializer) = initializer {
            initializer.initialize(&mut descriptor);
        }

        let persister = self.persisters.find(&descriptor.kind);
        persister.persist(&descriptor).await?;

        info!(
            flow = %flow_id.0,
            state = %descriptor.state_id.0,
            descriptor = %descriptor.id.0,
            "started flow instance"
        );

        Ok(FlowInstance::new(
            definition,
            descriptor,
            persister,
            self.role_extractor.clone(),
        ))
    }

    /// Reconstruct the flow instance for an existing descriptor
    ///
    /// Purely resolves the transient delegate; neither mutates nor
    /// persists the descriptor.
    pub async fn find(
        &self,
        descriptor: FlowInstanceDescriptor,
    ) -> Result<FlowInstance, EngineError> {
        let definition = self.lookup_definition(&descriptor.flow_id).await?;
        let persister = self.persisters.find(&descriptor.kind);

        Ok(FlowInstance::new(
            definition,
            descriptor,
            persister,
            self.role_extractor.clone(),
        ))
    }

    /// Run one timeout sweep
    ///
    /// Asks every distinct registered persister for its overdue
    /// descriptors and fires the qualifying timeout transitions of each.
    /// A failure while processing one descriptor is logged and skipped;
    /// the sweep continues with the remaining descriptors.
    pub async fn process_timeouts(&self) -> Result<(), EngineError> {
        for persister in self.persisters.distinct() {
            let overdue = persister.overdue_descriptors().await?;
            if overdue.is_empty() {
                continue;
            }

            debug!(count = overdue.len(), "processing overdue descriptors");

            for descriptor in overdue {
                let flow = descriptor.flow_id.clone();
                let state = descriptor.state_id.clone();

                if let Err(error) = self.process_instance_timeouts(descriptor).await {
                    warn!(
                        flow = %flow.0,
                        state = %state.0,
                        %error,
                        "skipping descriptor after timeout processing failure"
                    );
                }
            }
        }

        Ok(())
    }

    async fn process_instance_timeouts(
        &self,
        descriptor: FlowInstanceDescriptor,
    ) -> Result<(), EngineError> {
        let mut instance = self.find(descriptor).await?;

        // Snapshot of the transitions the instance had when the sweep
        // reached it; each fired transition is performed against the
        // live instance, so a transition invalidated by an earlier one
        // fails and is reported by the caller.
        let transitions: Vec<(TransitionId, Option<String>)> = instance
            .transition_definitions()?
            .iter()
            .map(|t| (t.id.clone(), t.timeout.clone()))
            .collect();

        for (transition_id, timeout) in transitions {
            let expression = match timeout {
                Some(expression) => expression,
                None => continue,
            };

            if self
                .timeout_trigger
                .fire(instance.entered_at(), &expression)?
            {
                debug!(
                    flow = %instance.descriptor().flow_id.0,
                    transition = %transition_id.0,
                    "timeout transition fired"
                );
                instance.perform_transition(&transition_id).await?;
            }
        }

        Ok(())
    }

    async fn lookup_definition(&self, flow_id: &FlowId) -> Result<Arc<FlowDefinition>, EngineError> {
        let definitions = self.definitions.all_definitions().await?;

        definitions
            .into_iter()
            .find(|definition| &definition.id == flow_id)
            .ok_or_else(|| EngineError::NoSuchFlowDefinition(flow_id.0.clone()))
    }
}
