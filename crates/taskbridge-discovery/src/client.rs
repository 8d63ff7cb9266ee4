//! Capability-discovery client.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use taskbridge_cache::{CacheStats, TtlCache};
use taskbridge_config::Config;
use taskbridge_monitor::OrchestratorMetrics;
use taskbridge_protocols::error::UNKNOWN_ACTIVITY;
use taskbridge_protocols::{
    BackendCapabilitySet, CapabilitySource, DiscoveryError, DispatchError, RegistryEntry,
    RoutingProperties, TaskEnvelope, TaskHandle, ToolDescriptor,
};
use taskbridge_transport::HttpTransport;

use crate::envelope::CapabilityEnvelope;
use crate::state::DiscoveryState;

/// Cache name reported in metrics snapshots.
pub const CAPABILITIES_CACHE: &str = "backend_capabilities";

const TOOLS_ENDPOINT: &str = "backend.tools";
const PROCESS_TASK_ENDPOINT: &str = "backend.process_task";

/// Client settings.
#[derive(Debug, Clone)]
pub struct CapabilityClientConfig {
    /// How long a fetched catalog stays fresh.
    pub ttl: Duration,
    pub discovery_timeout: Duration,
    /// Backends may work on a task for minutes.
    pub dispatch_timeout: Duration,
}

impl Default for CapabilityClientConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(300),
            discovery_timeout: Duration::from_secs(30),
            dispatch_timeout: Duration::from_secs(1800),
        }
    }
}

impl CapabilityClientConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            ttl: config.cache.discovery_ttl(),
            discovery_timeout: Duration::from_secs(config.transport.request_timeout_seconds),
            dispatch_timeout: config.dispatcher.dispatch_timeout(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ToolCatalog {
    Wrapped { tools: Vec<ToolDescriptor> },
    Bare(Vec<ToolDescriptor>),
}

impl ToolCatalog {
    fn into_tools(self) -> Vec<ToolDescriptor> {
        match self {
            ToolCatalog::Wrapped { tools } | ToolCatalog::Bare(tools) => tools,
        }
    }
}

/// Discovers backend tool catalogs and dispatches tasks with them attached.
pub struct CapabilityClient {
    transport: Arc<HttpTransport>,
    config: CapabilityClientConfig,
    capabilities: TtlCache<String, BackendCapabilitySet>,
    // Outcome of the most recent discovery per backend. Staleness is derived
    // from the cache.
    outcomes: DashMap<String, CapabilitySource>,
    locks: DashMap<String, Arc<Mutex<()>>>,
    metrics: Option<Arc<OrchestratorMetrics>>,
}

impl CapabilityClient {
    /// Create a new capability client.
    pub fn new(transport: Arc<HttpTransport>, config: CapabilityClientConfig) -> Self {
        Self {
            capabilities: TtlCache::new(CAPABILITIES_CACHE, Some(config.ttl)),
            transport,
            config,
            outcomes: DashMap::new(),
            locks: DashMap::new(),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<OrchestratorMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn state(&self, backend_name: &str) -> DiscoveryState {
        match self.outcomes.get(backend_name).map(|o| *o) {
            None => DiscoveryState::Undiscovered,
            Some(CapabilitySource::Fallback) => DiscoveryState::Fallback,
            Some(CapabilitySource::Discovered) if self.capabilities.contains(backend_name) => {
                DiscoveryState::Discovered
            }
            Some(CapabilitySource::Discovered) => DiscoveryState::Stale,
        }
    }

    /// The backend's tool catalog. Never fails: when the backend cannot be
    /// queried, the entry's static tool list is returned instead.
    ///
    /// Concurrent callers for one backend share a single discovery request.
    pub async fn discover(&self, entry: &RegistryEntry) -> BackendCapabilitySet {
        if let Some(cached) = self.capabilities.get(entry.name.as_str()) {
            return cached;
        }

        let lock = self
            .locks
            .entry(entry.name.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        // Another caller may have finished discovery while we waited.
        let state = self.state(&entry.name);
        if !state.needs_discovery() {
            if let Some(cached) = self.capabilities.get(entry.name.as_str()) {
                return cached;
            }
        }
        debug!(backend = %entry.name, ?state, "Discovering backend capabilities");

        let set = match self.try_discover(entry).await {
            Ok(tools) => {
                info!(
                    backend = %entry.name,
                    tools = tools.len(),
                    "Discovered backend capabilities"
                );
                self.capability_set(entry, tools, CapabilitySource::Discovered)
            }
            Err(e) => {
                warn!(
                    backend = %entry.name,
                    error = %e,
                    fallback_tools = entry.fallback_tools.len(),
                    "Capability discovery failed, using fallback tools"
                );
                let tools = entry
                    .fallback_tools
                    .iter()
                    .map(|name| ToolDescriptor::new(name, ""))
                    .collect();
                self.capability_set(entry, tools, CapabilitySource::Fallback)
            }
        };

        self.outcomes.insert(entry.name.clone(), set.source);
        self.capabilities
            .set(entry.name.clone(), set.clone(), None);
        set
    }

    /// Query the backend's catalog without caching or fallback.
    pub async fn try_discover(
        &self,
        entry: &RegistryEntry,
    ) -> Result<Vec<ToolDescriptor>, DiscoveryError> {
        let url = entry.url("tools");
        if let Some(metrics) = &self.metrics {
            metrics.record_api_call(TOOLS_ENDPOINT);
        }

        let response = self
            .transport
            .get_json(&url, Some(self.config.discovery_timeout))
            .await?;
        if !response.is_success() {
            return Err(DiscoveryError::Status {
                url,
                status: response.status,
            });
        }

        let catalog: ToolCatalog =
            serde_json::from_value(response.body).map_err(|e| DiscoveryError::InvalidCatalog {
                url: url.clone(),
                message: e.to_string(),
            })?;
        Ok(catalog.into_tools())
    }

    /// Dispatch a task to a capability-discovery backend.
    ///
    /// The catalog is re-discovered first when stale. A requested tool that
    /// the catalog does not list is logged, and the task is sent anyway.
    pub async fn route(
        &self,
        task: &dyn TaskHandle,
        variables: Map<String, Value>,
        entry: &RegistryEntry,
        properties: &RoutingProperties,
    ) -> Result<Value, DispatchError> {
        let activity_id = task.activity_id().unwrap_or(UNKNOWN_ACTIVITY);
        let capabilities = self.discover(entry).await;

        let requested_tool = properties.requested_tool().map(str::to_string);
        if let Some(tool) = &requested_tool {
            if !capabilities.has_tool(tool) {
                warn!(
                    backend = %entry.name,
                    tool = %tool,
                    activity_id,
                    "Requested tool not in backend catalog, dispatching anyway"
                );
            }
        }

        let envelope = CapabilityEnvelope {
            task: TaskEnvelope::new(
                activity_id,
                task.process_instance_id(),
                variables,
                properties,
                None,
            ),
            mcp_properties: properties.extra.clone(),
            available_tools: capabilities.tools.clone(),
            requested_tool: requested_tool.clone(),
        };

        let url = entry.url("process_task");
        debug!(backend = %entry.name, %url, activity_id, "Dispatching to capability backend");
        if let Some(metrics) = &self.metrics {
            metrics.record_api_call(PROCESS_TASK_ENDPOINT);
        }

        let response = self
            .transport
            .post_json(&url, &envelope, Some(self.config.dispatch_timeout))
            .await
            .map_err(|source| DispatchError::Transport {
                identity: entry.identity(),
                activity_id: activity_id.to_string(),
                source,
            })?;

        if !response.is_success() {
            return Err(DispatchError::Backend {
                identity: entry.identity(),
                activity_id: activity_id.to_string(),
                status: response.status,
                message: response.message(),
            });
        }

        Ok(annotate(response.into_result(), requested_tool, &capabilities))
    }

    /// Forget one backend's catalog. Its state returns to `Undiscovered`.
    pub fn invalidate(&self, backend_name: &str) {
        self.capabilities.delete(backend_name);
        self.outcomes.remove(backend_name);
    }

    pub fn clear(&self) {
        self.capabilities.clear();
        self.outcomes.clear();
        self.locks.clear();
    }

    /// Drop catalogs past their TTL. Their backends report `Stale` until
    /// the next discovery.
    pub fn cleanup_expired(&self) -> usize {
        self.capabilities.cleanup_expired()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.capabilities.stats()
    }

    fn capability_set(
        &self,
        entry: &RegistryEntry,
        tools: Vec<ToolDescriptor>,
        source: CapabilitySource,
    ) -> BackendCapabilitySet {
        BackendCapabilitySet {
            backend_name: entry.name.clone(),
            endpoint: entry.endpoint.clone(),
            tools,
            discovered_at: Utc::now(),
            source,
        }
    }
}

/// Attach tool bookkeeping to a backend result. Non-object results are
/// wrapped under `result`.
fn annotate(
    result: Value,
    requested_tool: Option<String>,
    capabilities: &BackendCapabilitySet,
) -> Value {
    let mut object = match result {
        Value::Object(object) => object,
        other => {
            let mut object = Map::new();
            object.insert("result".to_string(), other);
            object
        }
    };

    if !object.contains_key("tool_used") {
        object.insert("tool_used".to_string(), json!(requested_tool));
    }
    object.insert(
        "tools_available".to_string(),
        json!(capabilities.tool_names()),
    );
    object.insert(
        "discovery_timestamp".to_string(),
        json!(capabilities.discovered_at.to_rfc3339()),
    );
    Value::Object(object)
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
