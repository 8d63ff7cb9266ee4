//! Task dispatcher.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

use taskbridge_config::Config;
use taskbridge_discovery::{CapabilityClient, CapabilityClientConfig};
use taskbridge_metadata::{DefinitionSource, EngineClient, MetadataExtractor, MetadataExtractorConfig};
use taskbridge_monitor::{MetricsSnapshot, OrchestratorMetrics, SequenceTracker};
use taskbridge_protocols::error::UNKNOWN_ACTIVITY;
use taskbridge_protocols::{DispatchError, RegistryEntry, RegistryError, TaskHandle};
use taskbridge_registry::ServiceRegistry;
use taskbridge_transport::{HttpTransport, HttpTransportConfig};

use crate::analysis::{AnalysisSink, DispatchRecord, HttpAnalysisSink, NoopAnalysisSink};
use crate::backend::Backend;
use crate::context::DispatchContext;
use crate::error::BuildError;
use crate::metered::MeteredSource;

const DISPATCH_OPERATION: &str = "dispatch";
const METADATA_OPERATION: &str = "extract_metadata";
const BACKEND_OPERATION: &str = "backend_call";

/// Routes workflow-engine tasks to backend services.
///
/// Cheap to clone; clones share one [`DispatchContext`].
#[derive(Clone)]
pub struct Dispatcher {
    context: Arc<DispatchContext>,
}

impl Dispatcher {
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    /// Build a dispatcher with every collaborator derived from configuration.
    pub async fn from_config(config: &Config) -> Result<Self, BuildError> {
        DispatcherBuilder::new().config(config.clone()).build().await
    }

    pub fn context(&self) -> &Arc<DispatchContext> {
        &self.context
    }

    pub fn registry(&self) -> &ServiceRegistry {
        &self.context.registry
    }

    pub fn sequence(&self) -> &SequenceTracker {
        &self.context.sequence
    }

    pub fn metrics(&self) -> &Arc<OrchestratorMetrics> {
        &self.context.metrics
    }

    /// Dispatch a task with its own variables.
    pub async fn dispatch(&self, task: &dyn TaskHandle) -> Result<Value, DispatchError> {
        self.dispatch_with(task, task.variables().clone()).await
    }

    /// Dispatch a task, sending `variables` in place of the task's own.
    ///
    /// The only failure not coming from the backend is an unregistered
    /// routing target, reported before any network call is made.
    pub async fn dispatch_with(
        &self,
        task: &dyn TaskHandle,
        variables: Map<String, Value>,
    ) -> Result<Value, DispatchError> {
        let ctx = &self.context;
        if ctx.is_closed() {
            return Err(DispatchError::Closed);
        }

        let started = Instant::now();
        let activity_id = task.activity_id().unwrap_or(UNKNOWN_ACTIVITY);

        let properties = {
            let _timer = ctx.metrics.start_operation(METADATA_OPERATION);
            ctx.metadata.routing_properties(task).await
        };

        let identity = properties.identity();
        let Some(entry) = ctx.registry.resolve_identity(&identity) else {
            error!(service = %identity, activity_id, "No registered service for routing target");
            return Err(DispatchError::ServiceNotFound {
                identity,
                activity_id: activity_id.to_string(),
            });
        };

        let backend = Backend::for_entry(entry);
        debug!(
            activity_id,
            service = %identity,
            backend = backend.kind(),
            endpoint = %backend.entry().endpoint,
            "Dispatching task"
        );

        let outcome = {
            let _timer = ctx.metrics.start_operation(BACKEND_OPERATION);
            backend.dispatch(ctx, task, variables, &properties).await
        };

        let elapsed = started.elapsed();
        ctx.metrics.record_operation(DISPATCH_OPERATION, elapsed);

        match outcome {
            Ok(result) => {
                info!(
                    activity_id,
                    service = %identity,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Task dispatched"
                );
                self.record_success(task, backend.entry(), elapsed, &result)
                    .await;
                Ok(result)
            }
            Err(e) => {
                error!(activity_id, service = %identity, error = %e, "Dispatch failed");
                Err(e)
            }
        }
    }

    /// Re-run registry discovery. Returns the number of entries added or
    /// replaced.
    pub async fn refresh_registry(&self) -> Result<usize, RegistryError> {
        self.context.registry.refresh().await
    }

    /// Point-in-time counters for every cache and operation.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        let mut caches = self.context.metadata.cache_stats();
        caches.push(self.context.capabilities.cache_stats());
        self.context.metrics.snapshot(&caches)
    }

    /// Sweep expired entries from the metadata and capability caches.
    pub fn cleanup_expired(&self) -> usize {
        self.context.metadata.cleanup_expired() + self.context.capabilities.cleanup_expired()
    }

    /// Clear caches and refuse further dispatches.
    pub fn close(&self) {
        if self.context.close() {
            info!("Dispatcher closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.context.is_closed()
    }

    async fn record_success(
        &self,
        task: &dyn TaskHandle,
        entry: &RegistryEntry,
        elapsed: Duration,
        result: &Value,
    ) {
        let ctx = &self.context;
        let process_instance_id = task.process_instance_id();

        if let Some(activity_id) = task.activity_id() {
            ctx.sequence.record(activity_id);
        }
        ctx.metrics.record_task_processed();
        if let Some(pi) = process_instance_id {
            ctx.metrics.record_workflow(pi);
        }

        let record = DispatchRecord::new(
            task.activity_id().unwrap_or(UNKNOWN_ACTIVITY),
            process_instance_id,
            &entry.identity(),
            elapsed,
            result.clone(),
        );
        if let Err(e) = ctx.analysis.record(&record).await {
            warn!(
                sink = ctx.analysis.name(),
                record_id = %record.record_id,
                error = %e,
                "Failed to store dispatch for analysis"
            );
        }
    }
}

/// Builder for [`Dispatcher`].
///
/// Every collaborator not supplied explicitly is derived from the
/// configuration.
pub struct DispatcherBuilder {
    config: Config,
    transport: Option<Arc<HttpTransport>>,
    definition_source: Option<Arc<dyn DefinitionSource>>,
    registry: Option<ServiceRegistry>,
    analysis_sink: Option<Arc<dyn AnalysisSink>>,
    metrics: Option<Arc<OrchestratorMetrics>>,
}

impl DispatcherBuilder {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
            transport: None,
            definition_source: None,
            registry: None,
            analysis_sink: None,
            metrics: None,
        }
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Share an existing transport instead of building one.
    pub fn transport(mut self, transport: Arc<HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Where process definitions are read from. Defaults to the engine REST
    /// API at `engine.base_url`.
    pub fn definition_source(mut self, source: Arc<dyn DefinitionSource>) -> Self {
        self.definition_source = Some(source);
        self
    }

    /// Use a prebuilt registry instead of resolving one from configuration.
    pub fn registry(mut self, registry: ServiceRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn analysis_sink(mut self, sink: Arc<dyn AnalysisSink>) -> Self {
        self.analysis_sink = Some(sink);
        self
    }

    pub fn metrics(mut self, metrics: Arc<OrchestratorMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Build the dispatcher. Resolving the registry may perform catalog
    /// discovery.
    pub async fn build(self) -> Result<Dispatcher, BuildError> {
        let config = self.config;
        if config.dispatcher.dispatch_timeout_seconds == 0 {
            return Err(BuildError::InvalidConfig(
                "dispatcher.dispatch_timeout_seconds must be greater than zero".to_string(),
            ));
        }

        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new(HttpTransportConfig::from(
                &config.transport,
            ))?),
        };
        let metrics = self.metrics.unwrap_or_default();

        let source: Arc<dyn DefinitionSource> = match self.definition_source {
            Some(source) => source,
            None => Arc::new(EngineClient::from_config(&config.engine, transport.clone())),
        };
        let metadata = MetadataExtractor::new(
            Arc::new(MeteredSource::new(source, metrics.clone())),
            MetadataExtractorConfig::from_config(&config),
        );

        let registry = match self.registry {
            Some(registry) => registry,
            None => ServiceRegistry::from_config(&config, transport.clone()).await,
        };

        let capabilities =
            CapabilityClient::new(transport.clone(), CapabilityClientConfig::from_config(&config))
                .with_metrics(metrics.clone());

        let analysis: Arc<dyn AnalysisSink> = match (self.analysis_sink, &config.analysis.endpoint) {
            (Some(sink), _) => sink,
            (None, Some(endpoint)) => Arc::new(
                HttpAnalysisSink::new(
                    endpoint,
                    Duration::from_secs(config.analysis.timeout_seconds),
                    transport.clone(),
                )
                .with_metrics(metrics.clone()),
            ),
            (None, None) => Arc::new(NoopAnalysisSink),
        };

        info!(
            registry_entries = registry.len(),
            explicit_registry = registry.is_explicit(),
            analysis = analysis.name(),
            "Dispatcher ready"
        );

        let context = DispatchContext::new(
            transport,
            metadata,
            registry,
            capabilities,
            analysis,
            metrics,
            SequenceTracker::new(config.dispatcher.history_size),
            config.dispatcher.dispatch_timeout(),
        );
        Ok(Dispatcher {
            context: Arc::new(context),
        })
    }
}

impl Default for DispatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}
