//! API-call accounting for definition lookups.

use std::sync::Arc;

use async_trait::async_trait;

use taskbridge_metadata::DefinitionSource;
use taskbridge_monitor::OrchestratorMetrics;
use taskbridge_protocols::MetadataError;

const PROCESS_INSTANCE_ENDPOINT: &str = "engine.process_instance";
const DEFINITION_XML_ENDPOINT: &str = "engine.definition_xml";

/// Counts every engine request made through the wrapped source.
pub struct MeteredSource {
    inner: Arc<dyn DefinitionSource>,
    metrics: Arc<OrchestratorMetrics>,
}

impl MeteredSource {
    pub fn new(inner: Arc<dyn DefinitionSource>, metrics: Arc<OrchestratorMetrics>) -> Self {
        Self { inner, metrics }
    }
}

#[async_trait]
impl DefinitionSource for MeteredSource {
    async fn definition_id(&self, process_instance_id: &str) -> Result<String, MetadataError> {
        self.metrics.record_api_call(PROCESS_INSTANCE_ENDPOINT);
        self.inner.definition_id(process_instance_id).await
    }

    async fn definition_xml(&self, definition_id: &str) -> Result<String, MetadataError> {
        self.metrics.record_api_call(DEFINITION_XML_ENDPOINT);
        self.inner.definition_xml(definition_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EmptySource;

    #[async_trait]
    impl DefinitionSource for EmptySource {
        async fn definition_id(&self, id: &str) -> Result<String, MetadataError> {
            Err(MetadataError::InstanceNotFound(id.to_string()))
        }

        async fn definition_xml(&self, _definition_id: &str) -> Result<String, MetadataError> {
            Ok("<definitions/>".to_string())
        }
    }

    #[tokio::test]
    async fn test_counts_calls_including_failures() {
        let metrics = Arc::new(OrchestratorMetrics::new());
        let source = MeteredSource::new(Arc::new(EmptySource), metrics.clone());

        assert!(source.definition_id("pi-1").await.is_err());
        assert!(source.definition_xml("d").await.is_ok());
        assert!(source.definition_xml("d").await.is_ok());

        assert_eq!(metrics.api_calls(PROCESS_INSTANCE_ENDPOINT), 1);
        assert_eq!(metrics.api_calls(DEFINITION_XML_ENDPOINT), 2);
    }
}
