//! Configuration schema definitions.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use taskbridge_protocols::routing::{
    DEFAULT_SERVICE_NAME, DEFAULT_SERVICE_TYPE, DEFAULT_SERVICE_VERSION,
};
use taskbridge_protocols::{RoutingDefaults, ServiceProtocol};

fn default_true() -> bool {
    true
}

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub dispatcher: DispatcherConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub transport: TransportConfig,

    #[serde(default)]
    pub registry: RegistryConfig,

    /// Live per-service configuration, keyed by service name.
    #[serde(default)]
    pub services: BTreeMap<String, ServiceConfig>,

    #[serde(default)]
    pub analysis: AnalysisConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Workflow engine REST API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_engine_url")]
    pub base_url: String,

    #[serde(default = "default_engine_timeout")]
    pub timeout_seconds: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_url: default_engine_url(),
            timeout_seconds: default_engine_timeout(),
        }
    }
}

fn default_engine_url() -> String {
    "http://localhost:8080/engine-rest".to_string()
}

fn default_engine_timeout() -> u64 {
    30
}

/// Dispatcher behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatcherConfig {
    #[serde(default = "default_service_type")]
    pub default_service_type: String,

    #[serde(default = "default_service_name")]
    pub default_service_name: String,

    #[serde(default = "default_service_version")]
    pub default_service_version: String,

    /// Backend processing may take minutes.
    #[serde(default = "default_dispatch_timeout")]
    pub dispatch_timeout_seconds: u64,

    /// Length of the recent-activity history.
    #[serde(default = "default_history_size")]
    pub history_size: usize,
}

impl DispatcherConfig {
    pub fn routing_defaults(&self) -> RoutingDefaults {
        RoutingDefaults {
            service_type: self.default_service_type.clone(),
            service_name: self.default_service_name.clone(),
            service_version: self.default_service_version.clone(),
        }
    }

    pub fn dispatch_timeout(&self) -> Duration {
        Duration::from_secs(self.dispatch_timeout_seconds)
    }
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            default_service_type: default_service_type(),
            default_service_name: default_service_name(),
            default_service_version: default_service_version(),
            dispatch_timeout_seconds: default_dispatch_timeout(),
            history_size: default_history_size(),
        }
    }
}

fn default_service_type() -> String {
    DEFAULT_SERVICE_TYPE.to_string()
}

fn default_service_name() -> String {
    DEFAULT_SERVICE_NAME.to_string()
}

fn default_service_version() -> String {
    DEFAULT_SERVICE_VERSION.to_string()
}

fn default_dispatch_timeout() -> u64 {
    1800
}

fn default_history_size() -> usize {
    100
}

/// Cache lifetimes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Routing properties and documentation.
    #[serde(default = "default_metadata_ttl")]
    pub metadata_ttl_seconds: u64,

    /// Raw and parsed definition documents.
    #[serde(default = "default_definition_ttl")]
    pub definition_ttl_seconds: u64,

    /// Backend tool catalogs.
    #[serde(default = "default_discovery_ttl")]
    pub discovery_ttl_seconds: u64,

    /// Process instance to definition id mappings.
    #[serde(default = "default_instance_ttl")]
    pub instance_ttl_seconds: u64,
}

impl CacheConfig {
    pub fn metadata_ttl(&self) -> Duration {
        Duration::from_secs(self.metadata_ttl_seconds)
    }

    pub fn definition_ttl(&self) -> Duration {
        Duration::from_secs(self.definition_ttl_seconds)
    }

    pub fn discovery_ttl(&self) -> Duration {
        Duration::from_secs(self.discovery_ttl_seconds)
    }

    pub fn instance_ttl(&self) -> Duration {
        Duration::from_secs(self.instance_ttl_seconds)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            metadata_ttl_seconds: default_metadata_ttl(),
            definition_ttl_seconds: default_definition_ttl(),
            discovery_ttl_seconds: default_discovery_ttl(),
            instance_ttl_seconds: default_instance_ttl(),
        }
    }
}

fn default_metadata_ttl() -> u64 {
    3600
}

fn default_definition_ttl() -> u64 {
    3600
}

fn default_discovery_ttl() -> u64 {
    300
}

fn default_instance_ttl() -> u64 {
    86_400
}

/// Outbound HTTP transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Maximum in-flight requests; further requests queue.
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,

    #[serde(default = "default_max_idle_per_host")]
    pub max_idle_per_host: usize,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
            max_idle_per_host: default_max_idle_per_host(),
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            connect_timeout_seconds: default_connect_timeout(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

fn default_max_connections() -> usize {
    32
}

fn default_max_idle_per_host() -> usize {
    10
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    30_000
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_request_timeout() -> u64 {
    30
}

/// Service registry sources.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Consul-style catalog base URL.
    #[serde(default)]
    pub discovery_url: Option<String>,

    #[serde(default)]
    pub fallback: FallbackConfig,

    /// When set, used verbatim and every other source is ignored.
    #[serde(default)]
    pub explicit: Option<BTreeMap<String, BTreeMap<String, EntryConfig>>>,
}

/// Static fallback targets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackConfig {
    #[serde(default = "default_fallback_assistant")]
    pub assistant_endpoint: String,

    #[serde(default = "default_fallback_mcp")]
    pub mcp_endpoint: String,

    #[serde(default)]
    pub mcp_tools: Vec<String>,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            assistant_endpoint: default_fallback_assistant(),
            mcp_endpoint: default_fallback_mcp(),
            mcp_tools: Vec::new(),
        }
    }
}

fn default_fallback_assistant() -> String {
    "http://localhost:8001".to_string()
}

fn default_fallback_mcp() -> String {
    "http://localhost:8002".to_string()
}

/// One registry entry in an explicit registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryConfig {
    pub endpoint: String,

    #[serde(default)]
    pub protocol: Option<ServiceProtocol>,

    #[serde(default)]
    pub tools: Vec<String>,

    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

/// Live configuration of one backend service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(rename = "type")]
    pub service_type: String,

    pub endpoint: String,

    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub protocol: Option<ServiceProtocol>,

    #[serde(default)]
    pub tools: Vec<String>,

    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

/// Analysis side channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default = "default_analysis_timeout")]
    pub timeout_seconds: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_seconds: default_analysis_timeout(),
        }
    }
}

fn default_analysis_timeout() -> u64 {
    10
}

/// Logging output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Daily-rolling log files are written here when set.
    #[serde(default)]
    pub directory: Option<String>,

    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: None,
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
