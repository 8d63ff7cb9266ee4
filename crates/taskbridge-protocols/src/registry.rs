//! Service registry entry types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::routing::ServiceIdentity;

/// `{type: {name: entry}}`.
pub type ServiceRegistryMap = BTreeMap<String, BTreeMap<String, RegistryEntry>>;

/// Wire protocol a backend speaks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceProtocol {
    /// Fixed `process_task` endpoint.
    #[default]
    Rest,
    /// Dynamic tool catalog behind a `tools` discovery endpoint.
    #[serde(alias = "mcp")]
    CapabilityDiscovery,
}

impl ServiceProtocol {
    /// Infer the protocol from the service type naming convention.
    pub fn infer(service_type: &str) -> Self {
        if service_type.eq_ignore_ascii_case("mcp") {
            ServiceProtocol::CapabilityDiscovery
        } else {
            ServiceProtocol::Rest
        }
    }
}

/// Where a registry entry came from. Higher variants win on conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrySource {
    Fallback,
    Discovered,
    Configured,
    Explicit,
}

/// Resolved address and metadata for one named backend of one service type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub service_type: String,
    pub name: String,
    pub endpoint: String,
    #[serde(default)]
    pub protocol: ServiceProtocol,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    /// Tool names assumed when capability discovery fails.
    #[serde(default)]
    pub fallback_tools: Vec<String>,
    #[serde(default = "default_source")]
    pub source: RegistrySource,
}

fn default_source() -> RegistrySource {
    RegistrySource::Explicit
}

impl RegistryEntry {
    /// Create an entry; the protocol is inferred from the service type.
    pub fn new(
        service_type: impl Into<String>,
        name: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        let service_type = service_type.into();
        Self {
            protocol: ServiceProtocol::infer(&service_type),
            service_type,
            name: name.into(),
            endpoint: endpoint.into(),
            metadata: BTreeMap::new(),
            fallback_tools: Vec::new(),
            source: default_source(),
        }
    }

    pub fn with_protocol(mut self, protocol: ServiceProtocol) -> Self {
        self.protocol = protocol;
        self
    }

    pub fn with_source(mut self, source: RegistrySource) -> Self {
        self.source = source;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_fallback_tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fallback_tools = tools.into_iter().map(Into::into).collect();
        self
    }

    pub fn identity(&self) -> ServiceIdentity {
        ServiceIdentity::new(&self.service_type, &self.name)
    }

    /// Join a path onto the entry endpoint.
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.endpoint.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_inferred_from_type() {
        assert_eq!(
            RegistryEntry::new("mcp", "tools", "http://x").protocol,
            ServiceProtocol::CapabilityDiscovery
        );
        assert_eq!(
            RegistryEntry::new("assistant", "a", "http://x").protocol,
            ServiceProtocol::Rest
        );
    }

    #[test]
    fn test_url_join() {
        let entry = RegistryEntry::new("assistant", "a", "http://host:8000/");
        assert_eq!(entry.url("/process_task"), "http://host:8000/process_task");
        assert_eq!(entry.url("tools"), "http://host:8000/tools");
    }

    #[test]
    fn test_source_priority_order() {
        assert!(RegistrySource::Explicit > RegistrySource::Configured);
        assert!(RegistrySource::Configured > RegistrySource::Discovered);
        assert!(RegistrySource::Discovered > RegistrySource::Fallback);
    }

    #[test]
    fn test_protocol_deserializes_mcp_alias() {
        let protocol: ServiceProtocol = serde_json::from_str("\"mcp\"").unwrap();
        assert_eq!(protocol, ServiceProtocol::CapabilityDiscovery);
    }
}
