//! Routing metadata extraction.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use taskbridge_cache::{CacheStats, TtlCache};
use taskbridge_config::Config;
use taskbridge_protocols::{MetadataError, RoutingDefaults, RoutingProperties, TaskHandle};

use crate::document_cache::DocumentCache;
use crate::extractor::{PatternExtractor, PropertyExtractor, StructuralExtractor};
use crate::source::DefinitionSource;

pub const DEFINITION_IDS_CACHE: &str = "definition_ids";
pub const DEFINITION_DOCUMENTS_CACHE: &str = "definition_documents";
pub const ROUTING_PROPERTIES_CACHE: &str = "routing_properties";
pub const TASK_DOCUMENTATION_CACHE: &str = "task_documentation";

/// Extractor settings.
#[derive(Debug, Clone, Default)]
pub struct MetadataExtractorConfig {
    pub defaults: RoutingDefaults,
    /// TTL of per-activity properties and documentation.
    pub metadata_ttl: Option<Duration>,
    /// TTL of fetched definition documents and their parsed form.
    pub definition_ttl: Option<Duration>,
    /// TTL of process instance to definition id mappings.
    pub instance_ttl: Option<Duration>,
}

impl MetadataExtractorConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            defaults: config.dispatcher.routing_defaults(),
            metadata_ttl: Some(config.cache.metadata_ttl()),
            definition_ttl: Some(config.cache.definition_ttl()),
            instance_ttl: Some(config.cache.instance_ttl()),
        }
    }
}

/// Resolves routing properties and documentation for workflow tasks.
pub struct MetadataExtractor {
    source: Arc<dyn DefinitionSource>,
    defaults: RoutingDefaults,
    // Process instance id → definition id. An instance never changes
    // definition; expiry only reclaims finished instances.
    definition_ids: TtlCache<String, String>,
    documents: TtlCache<String, Arc<str>>,
    parsed: Arc<DocumentCache>,
    properties: TtlCache<String, RoutingProperties>,
    documentation: TtlCache<String, Option<String>>,
    extractors: Vec<Box<dyn PropertyExtractor>>,
}

impl MetadataExtractor {
    /// Create an extractor that tries the structural parser, then the
    /// textual scan.
    pub fn new(source: Arc<dyn DefinitionSource>, config: MetadataExtractorConfig) -> Self {
        let parsed = Arc::new(DocumentCache::new(config.definition_ttl));
        let extractors: Vec<Box<dyn PropertyExtractor>> = vec![
            Box::new(StructuralExtractor::new(parsed.clone())),
            Box::new(PatternExtractor::new()),
        ];

        Self {
            source,
            defaults: config.defaults,
            definition_ids: TtlCache::new(DEFINITION_IDS_CACHE, config.instance_ttl),
            documents: TtlCache::new(DEFINITION_DOCUMENTS_CACHE, config.definition_ttl),
            parsed,
            properties: TtlCache::new(ROUTING_PROPERTIES_CACHE, config.metadata_ttl),
            documentation: TtlCache::new(TASK_DOCUMENTATION_CACHE, config.metadata_ttl),
            extractors,
        }
    }

    pub fn defaults(&self) -> &RoutingDefaults {
        &self.defaults
    }

    /// Routing properties for a task. Never fails: any lookup problem yields
    /// the default routing target.
    pub async fn routing_properties(&self, task: &dyn TaskHandle) -> RoutingProperties {
        match self.try_routing_properties(task).await {
            Ok(properties) => properties,
            Err(e) => {
                warn!(
                    activity_id = task.activity_id().unwrap_or_default(),
                    error = %e,
                    "Routing metadata unavailable, using default target"
                );
                RoutingProperties::default_for(&self.defaults)
            }
        }
    }

    /// Routing properties for a task, surfacing lookup errors.
    ///
    /// A task without an activity id gets the default target without any
    /// lookup. An activity without annotations also gets the default.
    pub async fn try_routing_properties(
        &self,
        task: &dyn TaskHandle,
    ) -> Result<RoutingProperties, MetadataError> {
        let Some(activity_id) = task.activity_id() else {
            debug!("Task has no activity id, using default target");
            return Ok(RoutingProperties::default_for(&self.defaults));
        };

        if let Some(cached) = self.properties.get(activity_id) {
            return Ok(cached);
        }

        let (definition_id, xml) = self.definition(task).await?;
        let properties = match self.extract_properties(&definition_id, &xml, activity_id) {
            Some(pairs) => RoutingProperties::from_pairs(pairs, &self.defaults),
            None => {
                debug!(activity_id, %definition_id, "Activity has no routing annotations");
                RoutingProperties::default_for(&self.defaults)
            }
        };

        debug!(
            activity_id,
            service = %properties.identity(),
            "Extracted routing properties"
        );
        self.properties
            .set(activity_id.to_string(), properties.clone(), None);
        Ok(properties)
    }

    /// Free-text documentation attached to the task's activity.
    pub async fn documentation(
        &self,
        task: &dyn TaskHandle,
    ) -> Result<Option<String>, MetadataError> {
        let Some(activity_id) = task.activity_id() else {
            return Ok(None);
        };

        if let Some(cached) = self.documentation.get(activity_id) {
            return Ok(cached);
        }

        let (definition_id, xml) = self.definition(task).await?;
        let mut documentation = None;
        for extractor in &self.extractors {
            match extractor.documentation(&definition_id, &xml, activity_id) {
                Ok(Some(text)) => {
                    documentation = Some(text);
                    break;
                }
                Ok(None) => {}
                Err(e) => {
                    debug!(extractor = extractor.name(), error = %e, "Documentation extractor failed");
                }
            }
        }

        self.documentation
            .set(activity_id.to_string(), documentation.clone(), None);
        Ok(documentation)
    }

    /// Drop cached properties and documentation of one activity.
    pub fn invalidate_activity(&self, activity_id: &str) {
        self.properties.delete(activity_id);
        self.documentation.delete(activity_id);
    }

    /// Drop every cached lookup.
    pub fn invalidate_all(&self) {
        self.definition_ids.clear();
        self.documents.clear();
        self.parsed.clear();
        self.properties.clear();
        self.documentation.clear();
    }

    /// Sweep expired entries from every cache.
    pub fn cleanup_expired(&self) -> usize {
        self.definition_ids.cleanup_expired()
            + self.documents.cleanup_expired()
            + self.parsed.cleanup_expired()
            + self.properties.cleanup_expired()
            + self.documentation.cleanup_expired()
    }

    pub fn cache_stats(&self) -> Vec<CacheStats> {
        vec![
            self.definition_ids.stats(),
            self.documents.stats(),
            self.parsed.stats(),
            self.properties.stats(),
            self.documentation.stats(),
        ]
    }

    fn extract_properties(
        &self,
        definition_id: &str,
        xml: &str,
        activity_id: &str,
    ) -> Option<Vec<(String, String)>> {
        for extractor in &self.extractors {
            match extractor.properties(definition_id, xml, activity_id) {
                Ok(Some(pairs)) => return Some(pairs),
                Ok(None) => {}
                Err(e) => {
                    warn!(
                        extractor = extractor.name(),
                        definition_id,
                        error = %e,
                        "Property extractor failed, trying next"
                    );
                }
            }
        }
        None
    }

    async fn definition(&self, task: &dyn TaskHandle) -> Result<(String, Arc<str>), MetadataError> {
        let process_instance_id = task
            .process_instance_id()
            .ok_or(MetadataError::MissingProcessInstance)?;

        let definition_id = match self.definition_ids.get(process_instance_id) {
            Some(id) => id,
            None => {
                let id = self.source.definition_id(process_instance_id).await?;
                self.definition_ids
                    .set(process_instance_id.to_string(), id.clone(), None);
                id
            }
        };

        let xml = match self.documents.get(definition_id.as_str()) {
            Some(xml) => xml,
            None => {
                let xml: Arc<str> = self.source.definition_xml(&definition_id).await?.into();
                self.documents.set(definition_id.clone(), xml.clone(), None);
                xml
            }
        };

        Ok((definition_id, xml))
    }
}

#[cfg(test)]
#[path = "metadata_tests.rs"]
mod tests;
