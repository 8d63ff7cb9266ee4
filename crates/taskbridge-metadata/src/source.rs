//! Process-definition sources.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use taskbridge_config::EngineConfig;
use taskbridge_protocols::MetadataError;
use taskbridge_transport::HttpTransport;

/// Where process definitions come from.
#[async_trait]
pub trait DefinitionSource: Send + Sync {
    /// Id of the definition a running process instance was started from.
    async fn definition_id(&self, process_instance_id: &str) -> Result<String, MetadataError>;

    /// Raw BPMN XML of a definition.
    async fn definition_xml(&self, definition_id: &str) -> Result<String, MetadataError>;
}

/// REST client for the workflow engine.
pub struct EngineClient {
    base_url: String,
    timeout: Duration,
    transport: Arc<HttpTransport>,
}

impl EngineClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration, transport: Arc<HttpTransport>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
            transport,
        }
    }

    pub fn from_config(config: &EngineConfig, transport: Arc<HttpTransport>) -> Self {
        Self::new(
            &config.base_url,
            Duration::from_secs(config.timeout_seconds),
            transport,
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn fetch(
        &self,
        url: &str,
        not_found: impl FnOnce() -> MetadataError,
    ) -> Result<Value, MetadataError> {
        let response = self.transport.get_json(url, Some(self.timeout)).await?;
        match response.status {
            200..=299 => Ok(response.body),
            404 => Err(not_found()),
            status => Err(MetadataError::EngineStatus {
                status,
                url: url.to_string(),
            }),
        }
    }
}

#[async_trait]
impl DefinitionSource for EngineClient {
    async fn definition_id(&self, process_instance_id: &str) -> Result<String, MetadataError> {
        let url = format!("{}/process-instance/{}", self.base_url, process_instance_id);
        let body = self
            .fetch(&url, || {
                MetadataError::InstanceNotFound(process_instance_id.to_string())
            })
            .await?;

        let definition_id = body
            .get("definitionId")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| MetadataError::InstanceNotFound(process_instance_id.to_string()))?;

        debug!(process_instance_id, definition_id, "Resolved process definition");
        Ok(definition_id.to_string())
    }

    async fn definition_xml(&self, definition_id: &str) -> Result<String, MetadataError> {
        let url = format!("{}/process-definition/{}/xml", self.base_url, definition_id);
        let body = self
            .fetch(&url, || MetadataError::DefinitionNotFound(definition_id.to_string()))
            .await?;

        body.get("bpmn20Xml")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| MetadataError::Parse {
                definition_id: definition_id.to_string(),
                message: "response has no bpmn20Xml field".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use taskbridge_transport::{HttpTransportConfig, RetryConfig};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> EngineClient {
        let config = HttpTransportConfig {
            retry: RetryConfig::none(),
            ..Default::default()
        };
        let transport = Arc::new(HttpTransport::new(config).unwrap());
        EngineClient::new(format!("{}/engine-rest/", server.uri()), Duration::from_secs(5), transport)
    }

    #[tokio::test]
    async fn test_definition_id_lookup() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/engine-rest/process-instance/pi-1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"id": "pi-1", "definitionId": "invoice:3:abc"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server);
        assert_eq!(client.definition_id("pi-1").await.unwrap(), "invoice:3:abc");
    }

    #[tokio::test]
    async fn test_definition_xml_fetch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/engine-rest/process-definition/invoice:3:abc/xml"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"id": "invoice:3:abc", "bpmn20Xml": "<definitions/>"})),
            )
            .mount(&server)
            .await;

        let client = client(&server);
        assert_eq!(client.definition_xml("invoice:3:abc").await.unwrap(), "<definitions/>");
    }

    #[tokio::test]
    async fn test_missing_instance() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/engine-rest/process-instance/gone"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "not found"})))
            .mount(&server)
            .await;

        let err = client(&server).definition_id("gone").await.unwrap_err();
        assert!(matches!(err, MetadataError::InstanceNotFound(id) if id == "gone"));
    }

    #[tokio::test]
    async fn test_engine_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = client(&server).definition_xml("d").await.unwrap_err();
        assert!(matches!(err, MetadataError::EngineStatus { status: 500, .. }));
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let transport = Arc::new(HttpTransport::new(HttpTransportConfig::default()).unwrap());
        let client = EngineClient::new("http://engine/rest///", Duration::from_secs(1), transport);
        assert_eq!(client.base_url(), "http://engine/rest");
    }
}
