//! Analysis side channel.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use taskbridge_monitor::OrchestratorMetrics;
use taskbridge_protocols::{AnalysisError, ServiceIdentity};
use taskbridge_transport::HttpTransport;

const RECORDS_ENDPOINT: &str = "analysis.records";

/// One successful dispatch, as stored for later analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchRecord {
    pub record_id: String,
    pub activity_id: String,
    pub process_instance_id: Option<String>,
    pub service_type: String,
    pub service_name: String,
    pub duration_ms: u64,
    pub result: Value,
    pub recorded_at: DateTime<Utc>,
}

impl DispatchRecord {
    pub fn new(
        activity_id: impl Into<String>,
        process_instance_id: Option<&str>,
        identity: &ServiceIdentity,
        duration: Duration,
        result: Value,
    ) -> Self {
        Self {
            record_id: Uuid::new_v4().to_string(),
            activity_id: activity_id.into(),
            process_instance_id: process_instance_id.map(str::to_string),
            service_type: identity.service_type.clone(),
            service_name: identity.name.clone(),
            duration_ms: duration.as_millis().min(u64::MAX as u128) as u64,
            result,
            recorded_at: Utc::now(),
        }
    }
}

/// Receives every successful dispatch. Failures are logged by the caller and
/// never fail the dispatch.
#[async_trait]
pub trait AnalysisSink: Send + Sync {
    fn name(&self) -> &str;

    async fn record(&self, record: &DispatchRecord) -> Result<(), AnalysisError>;
}

/// Discards records. Used when no analysis endpoint is configured.
#[derive(Debug, Default)]
pub struct NoopAnalysisSink;

#[async_trait]
impl AnalysisSink for NoopAnalysisSink {
    fn name(&self) -> &str {
        "noop"
    }

    async fn record(&self, _record: &DispatchRecord) -> Result<(), AnalysisError> {
        Ok(())
    }
}

/// POSTs records to `{endpoint}/records`.
pub struct HttpAnalysisSink {
    url: String,
    timeout: Duration,
    transport: Arc<HttpTransport>,
    metrics: Option<Arc<OrchestratorMetrics>>,
}

impl HttpAnalysisSink {
    pub fn new(endpoint: &str, timeout: Duration, transport: Arc<HttpTransport>) -> Self {
        Self {
            url: format!("{}/records", endpoint.trim_end_matches('/')),
            timeout,
            transport,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<OrchestratorMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl AnalysisSink for HttpAnalysisSink {
    fn name(&self) -> &str {
        "http"
    }

    async fn record(&self, record: &DispatchRecord) -> Result<(), AnalysisError> {
        if let Some(metrics) = &self.metrics {
            metrics.record_api_call(RECORDS_ENDPOINT);
        }
        let response = self
            .transport
            .post_json(&self.url, record, Some(self.timeout))
            .await?;
        if !response.is_success() {
            return Err(AnalysisError::Rejected {
                status: response.status,
                message: response.message(),
            });
        }
        debug!(record_id = %record.record_id, "Recorded dispatch for analysis");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use taskbridge_transport::{HttpTransportConfig, RetryConfig};
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn record() -> DispatchRecord {
        DispatchRecord::new(
            "ReviewTask",
            Some("pi-1"),
            &ServiceIdentity::new("assistant", "svcA"),
            Duration::from_millis(1234),
            json!({"ok": true}),
        )
    }

    fn sink(server: &MockServer) -> HttpAnalysisSink {
        let config = HttpTransportConfig {
            retry: RetryConfig::none(),
            ..Default::default()
        };
        let transport = Arc::new(HttpTransport::new(config).unwrap());
        HttpAnalysisSink::new(&format!("{}/", server.uri()), Duration::from_secs(5), transport)
    }

    #[test]
    fn test_record_fields() {
        let record = record();
        assert_eq!(record.duration_ms, 1234);
        assert_eq!(record.service_name, "svcA");
        assert!(Uuid::parse_str(&record.record_id).is_ok());
    }

    #[tokio::test]
    async fn test_noop_sink_accepts_everything() {
        assert!(NoopAnalysisSink.record(&record()).await.is_ok());
    }

    #[tokio::test]
    async fn test_http_sink_posts_record() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/records"))
            .and(body_partial_json(json!({
                "activity_id": "ReviewTask",
                "service_type": "assistant",
                "result": {"ok": true}
            })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let metrics = Arc::new(OrchestratorMetrics::new());
        let sink = sink(&server).with_metrics(metrics.clone());
        assert_eq!(sink.url(), format!("{}/records", server.uri()));
        sink.record(&record()).await.unwrap();
        assert_eq!(metrics.api_calls(RECORDS_ENDPOINT), 1);
    }

    #[tokio::test]
    async fn test_http_sink_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({"message": "bad record"})))
            .mount(&server)
            .await;

        let err = sink(&server).record(&record()).await.unwrap_err();
        assert!(matches!(err, AnalysisError::Rejected { status: 400, ref message } if message == "bad record"));
    }
}
