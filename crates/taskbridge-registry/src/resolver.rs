//! Registry resolution.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use taskbridge_config::Config;
use taskbridge_protocols::{RegistryEntry, RegistryError, ServiceIdentity, ServiceRegistryMap};
use taskbridge_transport::HttpTransport;

use crate::consul::{ConsulDiscovery, RegistryDiscovery};
use crate::sources::{configured_entries, explicit_entries, fallback_entries};

/// Resolved `{type: {name: entry}}` map.
///
/// Reads take a shared lock; only `refresh` writes.
pub struct ServiceRegistry {
    map: RwLock<ServiceRegistryMap>,
    explicit: bool,
    discovery: Option<Arc<dyn RegistryDiscovery>>,
}

impl ServiceRegistry {
    /// A registry used verbatim. Refresh is a no-op.
    pub fn explicit(map: ServiceRegistryMap) -> Self {
        info!(entries = count(&map), "Using explicit service registry");
        Self {
            map: RwLock::new(map),
            explicit: true,
            discovery: None,
        }
    }

    /// Merge the given sources by priority: configured over discovered over
    /// fallback. A failing discovery backend is logged and skipped.
    pub async fn build(
        configured: Vec<RegistryEntry>,
        fallback: Vec<RegistryEntry>,
        discovery: Option<Arc<dyn RegistryDiscovery>>,
    ) -> Self {
        let mut map = ServiceRegistryMap::new();
        for entry in fallback {
            merge(&mut map, entry);
        }

        if let Some(discovery) = &discovery {
            match discovery.discover().await {
                Ok(entries) => {
                    for entry in entries {
                        merge(&mut map, entry);
                    }
                }
                Err(e) => {
                    warn!(backend = discovery.name(), error = %e, "Registry discovery failed");
                }
            }
        }

        for entry in configured {
            merge(&mut map, entry);
        }

        info!(entries = count(&map), "Built service registry");
        Self {
            map: RwLock::new(map),
            explicit: false,
            discovery,
        }
    }

    /// Build from configuration. An `[registry.explicit]` table wins over
    /// every other source.
    pub async fn from_config(config: &Config, transport: Arc<HttpTransport>) -> Self {
        if let Some(explicit) = &config.registry.explicit {
            return Self::explicit(explicit_entries(explicit));
        }

        let discovery = config.registry.discovery_url.as_ref().map(|url| {
            let timeout = Duration::from_secs(config.transport.request_timeout_seconds);
            Arc::new(ConsulDiscovery::new(url, timeout, transport)) as Arc<dyn RegistryDiscovery>
        });

        Self::build(
            configured_entries(&config.services),
            fallback_entries(&config.registry.fallback, &config.dispatcher.routing_defaults()),
            discovery,
        )
        .await
    }

    pub fn is_explicit(&self) -> bool {
        self.explicit
    }

    pub fn resolve(&self, service_type: &str, name: &str) -> Option<RegistryEntry> {
        self.map
            .read()
            .get(service_type)
            .and_then(|services| services.get(name))
            .cloned()
    }

    pub fn resolve_identity(&self, identity: &ServiceIdentity) -> Option<RegistryEntry> {
        self.resolve(&identity.service_type, &identity.name)
    }

    /// All entries, ordered by type then name.
    pub fn entries(&self) -> Vec<RegistryEntry> {
        self.map
            .read()
            .values()
            .flat_map(|services| services.values().cloned())
            .collect()
    }

    pub fn snapshot(&self) -> ServiceRegistryMap {
        self.map.read().clone()
    }

    pub fn len(&self) -> usize {
        count(&self.map.read())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Re-run discovery and merge the result.
    ///
    /// Additive: entries missing from the latest discovery are kept.
    /// Returns the number of entries added or updated.
    pub async fn refresh(&self) -> Result<usize, RegistryError> {
        if self.explicit {
            debug!("Explicit registry, refresh skipped");
            return Ok(0);
        }
        let Some(discovery) = &self.discovery else {
            debug!("No discovery backend, refresh skipped");
            return Ok(0);
        };

        let discovered = discovery.discover().await?;
        let mut map = self.map.write();
        let mut changed = 0;
        for entry in discovered {
            if merge(&mut map, entry) {
                changed += 1;
            }
        }

        info!(changed, entries = count(&map), "Refreshed service registry");
        Ok(changed)
    }
}

/// Insert unless a higher-priority source already owns the key.
/// Returns whether the map changed.
fn merge(map: &mut ServiceRegistryMap, entry: RegistryEntry) -> bool {
    let services = map.entry(entry.service_type.clone()).or_default();
    match services.get(&entry.name) {
        Some(existing) if existing.source > entry.source => false,
        Some(existing) if *existing == entry => false,
        _ => {
            services.insert(entry.name.clone(), entry);
            true
        }
    }
}

fn count(map: &ServiceRegistryMap) -> usize {
    map.values().map(|services| services.len()).sum()
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;
