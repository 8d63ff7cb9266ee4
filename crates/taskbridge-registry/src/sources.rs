//! Registry sources derived from configuration.

use std::collections::BTreeMap;

use tracing::debug;

use taskbridge_config::{EntryConfig, FallbackConfig, ServiceConfig};
use taskbridge_protocols::{
    RegistryEntry, RegistrySource, RoutingDefaults, ServiceProtocol, ServiceRegistryMap,
};

/// Name of the fallback capability-discovery backend.
pub const DEFAULT_MCP_NAME: &str = "default-mcp";

/// Entries from an explicitly supplied registry, verbatim.
pub fn explicit_entries(
    explicit: &BTreeMap<String, BTreeMap<String, EntryConfig>>,
) -> ServiceRegistryMap {
    explicit
        .iter()
        .map(|(service_type, services)| {
            let entries = services
                .iter()
                .map(|(name, config)| {
                    let entry = entry_from_parts(
                        service_type,
                        name,
                        &config.endpoint,
                        config.protocol,
                        &config.tools,
                        &config.metadata,
                    )
                    .with_source(RegistrySource::Explicit);
                    (name.clone(), entry)
                })
                .collect();
            (service_type.clone(), entries)
        })
        .collect()
}

/// Entries for every enabled `[services.<name>]` table.
pub fn configured_entries(services: &BTreeMap<String, ServiceConfig>) -> Vec<RegistryEntry> {
    services
        .iter()
        .filter(|(name, service)| {
            if !service.enabled {
                debug!(service = %name, "Skipping disabled service");
            }
            service.enabled
        })
        .map(|(name, service)| {
            entry_from_parts(
                &service.service_type,
                name,
                &service.endpoint,
                service.protocol,
                &service.tools,
                &service.metadata,
            )
            .with_source(RegistrySource::Configured)
        })
        .collect()
}

/// One default entry per essential service type.
pub fn fallback_entries(fallback: &FallbackConfig, defaults: &RoutingDefaults) -> Vec<RegistryEntry> {
    vec![
        RegistryEntry::new(
            &defaults.service_type,
            &defaults.service_name,
            &fallback.assistant_endpoint,
        )
        .with_source(RegistrySource::Fallback),
        RegistryEntry::new("mcp", DEFAULT_MCP_NAME, &fallback.mcp_endpoint)
            .with_protocol(ServiceProtocol::CapabilityDiscovery)
            .with_fallback_tools(fallback.mcp_tools.iter().cloned())
            .with_source(RegistrySource::Fallback),
    ]
}

fn entry_from_parts(
    service_type: &str,
    name: &str,
    endpoint: &str,
    protocol: Option<ServiceProtocol>,
    tools: &[String],
    metadata: &BTreeMap<String, String>,
) -> RegistryEntry {
    let mut entry = RegistryEntry::new(service_type, name, endpoint)
        .with_fallback_tools(tools.iter().cloned());
    if let Some(protocol) = protocol {
        entry = entry.with_protocol(protocol);
    }
    entry.metadata = metadata.clone();
    entry
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(service_type: &str, endpoint: &str, enabled: bool) -> ServiceConfig {
        ServiceConfig {
            service_type: service_type.to_string(),
            endpoint: endpoint.to_string(),
            enabled,
            protocol: None,
            tools: Vec::new(),
            metadata: BTreeMap::new(),
        }
    }

    #[test]
    fn test_configured_skips_disabled() {
        let mut services = BTreeMap::new();
        services.insert("writer".to_string(), service("assistant", "http://w", true));
        services.insert("retired".to_string(), service("assistant", "http://r", false));

        let entries = configured_entries(&services);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "writer");
        assert_eq!(entries[0].source, RegistrySource::Configured);
    }

    #[test]
    fn test_configured_protocol_override() {
        let mut services = BTreeMap::new();
        let mut tools = service("toolbox", "http://t", true);
        tools.protocol = Some(ServiceProtocol::CapabilityDiscovery);
        tools.tools = vec!["search".to_string()];
        services.insert("toolbox".to_string(), tools);

        let entries = configured_entries(&services);
        assert_eq!(entries[0].protocol, ServiceProtocol::CapabilityDiscovery);
        assert_eq!(entries[0].fallback_tools, vec!["search".to_string()]);
    }

    #[test]
    fn test_fallback_covers_essential_types() {
        let fallback = FallbackConfig {
            mcp_tools: vec!["search".to_string()],
            ..Default::default()
        };
        let entries = fallback_entries(&fallback, &RoutingDefaults::default());

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].service_type, "assistant");
        assert_eq!(entries[0].name, "default-assistant");
        assert_eq!(entries[1].service_type, "mcp");
        assert_eq!(entries[1].fallback_tools, vec!["search".to_string()]);
        assert!(entries.iter().all(|e| e.source == RegistrySource::Fallback));
    }

    #[test]
    fn test_explicit_entries_verbatim() {
        let mut inner = BTreeMap::new();
        inner.insert(
            "pinned".to_string(),
            EntryConfig {
                endpoint: "http://pinned".to_string(),
                protocol: None,
                tools: Vec::new(),
                metadata: BTreeMap::new(),
            },
        );
        let mut explicit = BTreeMap::new();
        explicit.insert("assistant".to_string(), inner);

        let map = explicit_entries(&explicit);
        let entry = &map["assistant"]["pinned"];
        assert_eq!(entry.endpoint, "http://pinned");
        assert_eq!(entry.source, RegistrySource::Explicit);
    }
}
