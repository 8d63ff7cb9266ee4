//! Catalog-based service discovery.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use taskbridge_protocols::{RegistryEntry, RegistryError, RegistrySource, ServiceProtocol};
use taskbridge_transport::{HttpResponse, HttpTransport};

/// Catalog tags of the form `type-<kind>` declare the service type.
pub const TYPE_TAG_PREFIX: &str = "type-";

/// A discovery backend that can list registry entries.
#[async_trait]
pub trait RegistryDiscovery: Send + Sync {
    fn name(&self) -> &str;

    async fn discover(&self) -> Result<Vec<RegistryEntry>, RegistryError>;
}

/// Consul-style catalog client.
pub struct ConsulDiscovery {
    base_url: String,
    timeout: Duration,
    transport: Arc<HttpTransport>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CatalogNode {
    #[serde(default)]
    address: String,
    #[serde(default)]
    service_address: String,
    service_port: u16,
    #[serde(default)]
    service_meta: Option<BTreeMap<String, String>>,
}

impl ConsulDiscovery {
    pub fn new(base_url: impl Into<String>, timeout: Duration, transport: Arc<HttpTransport>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
            transport,
        }
    }

    async fn get(&self, url: &str) -> Result<HttpResponse, RegistryError> {
        let response = self.transport.get_json(url, Some(self.timeout)).await?;
        if !response.is_success() {
            return Err(RegistryError::Status {
                url: url.to_string(),
                status: response.status,
            });
        }
        Ok(response)
    }

    async fn catalog(&self) -> Result<BTreeMap<String, Vec<String>>, RegistryError> {
        let url = format!("{}/v1/catalog/services", self.base_url);
        let response = self.get(&url).await?;
        serde_json::from_value(response.body).map_err(|e| RegistryError::InvalidCatalog {
            url,
            message: e.to_string(),
        })
    }

    async fn service_entry(
        &self,
        name: &str,
        service_type: &str,
    ) -> Result<Option<RegistryEntry>, RegistryError> {
        let url = format!("{}/v1/catalog/service/{}", self.base_url, name);
        let response = self.get(&url).await?;
        let nodes: Vec<CatalogNode> =
            serde_json::from_value(response.body).map_err(|e| RegistryError::InvalidCatalog {
                url: url.clone(),
                message: e.to_string(),
            })?;

        let Some(node) = nodes.into_iter().next() else {
            debug!(service = name, "Catalog lists no instances");
            return Ok(None);
        };

        Ok(Some(entry_from_node(name, service_type, node)))
    }
}

fn entry_from_node(name: &str, service_type: &str, node: CatalogNode) -> RegistryEntry {
    let meta = node.service_meta.unwrap_or_default();
    let host = if node.service_address.is_empty() {
        node.address
    } else {
        node.service_address
    };
    let scheme = meta
        .get("scheme")
        .map(String::as_str)
        .unwrap_or("http");
    let endpoint = format!("{}://{}:{}", scheme, host, node.service_port);

    let mut entry = RegistryEntry::new(service_type, name, endpoint)
        .with_source(RegistrySource::Discovered);
    if let Some(protocol) = meta.get("protocol").and_then(|p| parse_protocol(p)) {
        entry = entry.with_protocol(protocol);
    }
    if let Some(tools) = meta.get("tools") {
        entry = entry.with_fallback_tools(
            tools
                .split(',')
                .map(str::trim)
                .filter(|tool| !tool.is_empty()),
        );
    }
    entry.metadata = meta;
    entry
}

fn parse_protocol(value: &str) -> Option<ServiceProtocol> {
    serde_json::from_value(serde_json::Value::String(value.to_string())).ok()
}

fn service_type_from_tags(tags: &[String]) -> Option<&str> {
    tags.iter()
        .find_map(|tag| tag.strip_prefix(TYPE_TAG_PREFIX))
        .filter(|kind| !kind.is_empty())
}

#[async_trait]
impl RegistryDiscovery for ConsulDiscovery {
    fn name(&self) -> &str {
        "consul"
    }

    async fn discover(&self) -> Result<Vec<RegistryEntry>, RegistryError> {
        let catalog = self.catalog().await?;
        let mut entries = Vec::new();

        for (name, tags) in &catalog {
            let Some(service_type) = service_type_from_tags(tags) else {
                debug!(service = %name, "No type tag, skipping");
                continue;
            };

            match self.service_entry(name, service_type).await {
                Ok(Some(entry)) => entries.push(entry),
                Ok(None) => {}
                Err(e) => warn!(service = %name, error = %e, "Failed to read catalog service"),
            }
        }

        debug!(count = entries.len(), "Discovered registry entries");
        Ok(entries)
    }
}

#[cfg(test)]
#[path = "consul_tests.rs"]
mod tests;
