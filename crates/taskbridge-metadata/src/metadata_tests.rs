use super::*;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use taskbridge_protocols::EngineTask;

const DEFINITION: &str = r#"<bpmn:definitions xmlns:bpmn="http://www.omg.org/spec/BPMN/20100524/MODEL"
    xmlns:camunda="http://camunda.org/schema/1.0/bpmn">
  <bpmn:process id="Support">
    <bpmn:serviceTask id="Triage">
      <bpmn:documentation>Classify the ticket.</bpmn:documentation>
      <bpmn:extensionElements>
        <camunda:properties>
          <camunda:property name="service.type" value="mcp" />
          <camunda:property name="service.name" value="triage-tools" />
          <camunda:property name="service.tool" value="classify" />
          <camunda:property name="service.name" value="triage-tools-v2" />
        </camunda:properties>
      </bpmn:extensionElements>
    </bpmn:serviceTask>
    <bpmn:serviceTask id="Plain" />
  </bpmn:process>
</bpmn:definitions>"#;

#[derive(Default)]
struct FakeSource {
    definitions: HashMap<String, String>,
    instances: HashMap<String, String>,
    instance_fetches: AtomicUsize,
    xml_fetches: AtomicUsize,
}

impl FakeSource {
    fn with_definition(mut self, id: &str, xml: &str) -> Self {
        self.definitions.insert(id.to_string(), xml.to_string());
        self
    }

    fn with_instance(mut self, instance: &str, definition: &str) -> Self {
        self.instances
            .insert(instance.to_string(), definition.to_string());
        self
    }
}

#[async_trait]
impl DefinitionSource for FakeSource {
    async fn definition_id(&self, process_instance_id: &str) -> Result<String, MetadataError> {
        self.instance_fetches.fetch_add(1, Ordering::SeqCst);
        self.instances
            .get(process_instance_id)
            .cloned()
            .ok_or_else(|| MetadataError::InstanceNotFound(process_instance_id.to_string()))
    }

    async fn definition_xml(&self, definition_id: &str) -> Result<String, MetadataError> {
        self.xml_fetches.fetch_add(1, Ordering::SeqCst);
        self.definitions
            .get(definition_id)
            .cloned()
            .ok_or_else(|| MetadataError::DefinitionNotFound(definition_id.to_string()))
    }
}

fn support_source() -> Arc<FakeSource> {
    Arc::new(
        FakeSource::default()
            .with_definition("support:1", DEFINITION)
            .with_instance("pi-1", "support:1")
            .with_instance("pi-2", "support:1"),
    )
}

fn extractor(source: Arc<FakeSource>) -> MetadataExtractor {
    MetadataExtractor::new(source, MetadataExtractorConfig::default())
}

fn stats_for(extractor: &MetadataExtractor, name: &str) -> CacheStats {
    extractor
        .cache_stats()
        .into_iter()
        .find(|stats| stats.name == name)
        .unwrap()
}

#[tokio::test]
async fn test_extracts_annotated_properties() {
    let extractor = extractor(support_source());
    let task = EngineTask::new("Triage", "pi-1");

    let properties = extractor.routing_properties(&task).await;

    assert_eq!(properties.service_type, "mcp");
    // Duplicate key: the later value wins.
    assert_eq!(properties.service_name, "triage-tools-v2");
    assert_eq!(properties.service_version, "1.0");
    assert_eq!(properties.requested_tool(), Some("classify"));
}

#[tokio::test]
async fn test_unannotated_activity_uses_default() {
    let extractor = extractor(support_source());
    let properties = extractor
        .routing_properties(&EngineTask::new("Plain", "pi-1"))
        .await;
    assert_eq!(properties, RoutingProperties::default_for(&RoutingDefaults::default()));
}

#[tokio::test]
async fn test_missing_activity_id_skips_lookup() {
    let source = support_source();
    let extractor = extractor(source.clone());
    let task = EngineTask {
        activity_id: None,
        process_instance_id: Some("pi-1".to_string()),
        ..Default::default()
    };

    let properties = extractor.routing_properties(&task).await;

    assert_eq!(properties.service_type, "assistant");
    assert_eq!(source.instance_fetches.load(Ordering::SeqCst), 0);
    assert_eq!(source.xml_fetches.load(Ordering::SeqCst), 0);
    assert!(extractor.documentation(&task).await.unwrap().is_none());
}

#[tokio::test]
async fn test_lookup_failures_never_raise() {
    let extractor = MetadataExtractor::new(
        Arc::new(FakeSource::default()),
        MetadataExtractorConfig {
            defaults: RoutingDefaults {
                service_type: "assistant".to_string(),
                service_name: "fallback-bot".to_string(),
                service_version: "2.0".to_string(),
            },
            ..Default::default()
        },
    );

    let unknown_instance = extractor
        .routing_properties(&EngineTask::new("Triage", "missing"))
        .await;
    assert_eq!(unknown_instance.service_name, "fallback-bot");
    assert_eq!(unknown_instance.service_version, "2.0");

    let no_instance = EngineTask {
        activity_id: Some("Triage".to_string()),
        ..Default::default()
    };
    assert!(matches!(
        extractor.try_routing_properties(&no_instance).await,
        Err(MetadataError::MissingProcessInstance)
    ));
    assert_eq!(extractor.routing_properties(&no_instance).await.service_name, "fallback-bot");
}

#[tokio::test]
async fn test_failures_are_not_cached() {
    let extractor = extractor(Arc::new(FakeSource::default()));
    let task = EngineTask::new("Triage", "missing");

    extractor.routing_properties(&task).await;
    assert_eq!(stats_for(&extractor, ROUTING_PROPERTIES_CACHE).size, 0);
    assert_eq!(stats_for(&extractor, DEFINITION_IDS_CACHE).size, 0);
}

#[tokio::test]
async fn test_definition_fetched_and_parsed_once() {
    let source = support_source();
    let extractor = extractor(source.clone());

    for instance in ["pi-1", "pi-2"] {
        let task = EngineTask::new("Triage", instance);
        extractor.routing_properties(&task).await;
        let docs = extractor.documentation(&task).await.unwrap();
        assert_eq!(docs.as_deref(), Some("Classify the ticket."));
    }

    assert_eq!(source.xml_fetches.load(Ordering::SeqCst), 1);
    // Second task was answered from the per-activity caches.
    assert_eq!(source.instance_fetches.load(Ordering::SeqCst), 1);

    let parsed = stats_for(&extractor, "parsed_definitions");
    assert_eq!(parsed.misses, 1);
    assert_eq!(parsed.hits, 1);
}

#[tokio::test]
async fn test_malformed_definition_uses_pattern_fallback() {
    let broken = DEFINITION.replace("</bpmn:process>", "");
    let source = Arc::new(
        FakeSource::default()
            .with_definition("broken:1", &broken)
            .with_instance("pi-9", "broken:1"),
    );
    let extractor = extractor(source);

    let task = EngineTask::new("Triage", "pi-9");
    let properties = extractor.routing_properties(&task).await;

    assert_eq!(properties.service_type, "mcp");
    assert_eq!(properties.service_name, "triage-tools-v2");
    assert_eq!(
        extractor.documentation(&task).await.unwrap().as_deref(),
        Some("Classify the ticket.")
    );
}

#[tokio::test]
async fn test_invalidate_activity_forces_refetch_from_cached_document() {
    let source = support_source();
    let extractor = extractor(source.clone());
    let task = EngineTask::new("Triage", "pi-1");

    extractor.routing_properties(&task).await;
    extractor.invalidate_activity("Triage");
    extractor.routing_properties(&task).await;

    // The document itself stays cached.
    assert_eq!(source.xml_fetches.load(Ordering::SeqCst), 1);
    assert_eq!(stats_for(&extractor, ROUTING_PROPERTIES_CACHE).misses, 2);

    extractor.invalidate_all();
    extractor.routing_properties(&task).await;
    assert_eq!(source.xml_fetches.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_from_config_defaults() {
    let mut config = Config::default();
    config.dispatcher.default_service_name = "custom".to_string();

    let settings = MetadataExtractorConfig::from_config(&config);
    assert_eq!(settings.defaults.service_name, "custom");
    assert_eq!(settings.metadata_ttl, Some(Duration::from_secs(3600)));
    assert_eq!(settings.instance_ttl, Some(Duration::from_secs(86_400)));
}

#[tokio::test]
async fn test_cleanup_expired_sweeps_every_cache() {
    let ttl = Some(Duration::from_millis(20));
    let extractor = MetadataExtractor::new(
        support_source(),
        MetadataExtractorConfig {
            metadata_ttl: ttl,
            definition_ttl: ttl,
            instance_ttl: ttl,
            ..Default::default()
        },
    );
    let task = EngineTask::new("Triage", "pi-1");
    extractor.routing_properties(&task).await;
    extractor.documentation(&task).await.unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;
    let removed = extractor.cleanup_expired();

    // Instance mapping, raw document, parsed document, properties, documentation.
    assert_eq!(removed, 5);
    for stats in extractor.cache_stats() {
        assert_eq!(stats.size, 0, "{} not swept", stats.name);
    }
}
