//! Shared dispatcher state.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use taskbridge_discovery::CapabilityClient;
use taskbridge_metadata::MetadataExtractor;
use taskbridge_monitor::{OrchestratorMetrics, SequenceTracker};
use taskbridge_registry::ServiceRegistry;
use taskbridge_transport::HttpTransport;

use crate::analysis::AnalysisSink;

/// Everything one dispatcher owns: caches, registry, counters and the
/// shared transport. Sub-components receive `Arc` handles to the parts they
/// need; nothing here is process-global.
pub struct DispatchContext {
    pub(crate) transport: Arc<HttpTransport>,
    pub(crate) metadata: MetadataExtractor,
    pub(crate) registry: ServiceRegistry,
    pub(crate) capabilities: CapabilityClient,
    pub(crate) analysis: Arc<dyn AnalysisSink>,
    pub(crate) metrics: Arc<OrchestratorMetrics>,
    pub(crate) sequence: SequenceTracker,
    pub(crate) dispatch_timeout: Duration,
    closed: AtomicBool,
}

impl DispatchContext {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        transport: Arc<HttpTransport>,
        metadata: MetadataExtractor,
        registry: ServiceRegistry,
        capabilities: CapabilityClient,
        analysis: Arc<dyn AnalysisSink>,
        metrics: Arc<OrchestratorMetrics>,
        sequence: SequenceTracker,
        dispatch_timeout: Duration,
    ) -> Self {
        Self {
            transport,
            metadata,
            registry,
            capabilities,
            analysis,
            metrics,
            sequence,
            dispatch_timeout,
            closed: AtomicBool::new(false),
        }
    }

    pub fn transport(&self) -> &Arc<HttpTransport> {
        &self.transport
    }

    pub fn metadata(&self) -> &MetadataExtractor {
        &self.metadata
    }

    pub fn registry(&self) -> &ServiceRegistry {
        &self.registry
    }

    pub fn capabilities(&self) -> &CapabilityClient {
        &self.capabilities
    }

    pub fn analysis(&self) -> &Arc<dyn AnalysisSink> {
        &self.analysis
    }

    pub fn metrics(&self) -> &Arc<OrchestratorMetrics> {
        &self.metrics
    }

    pub fn sequence(&self) -> &SequenceTracker {
        &self.sequence
    }

    pub fn dispatch_timeout(&self) -> Duration {
        self.dispatch_timeout
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Drop cached state and refuse further work. Returns `false` when the
    /// context was already closed.
    pub(crate) fn close(&self) -> bool {
        if self.closed.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.metadata.invalidate_all();
        self.capabilities.clear();
        self.transport.close();
        true
    }
}
