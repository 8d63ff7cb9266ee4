//! Pooled HTTP transport.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use reqwest::{Client, Method, header};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use taskbridge_config::TransportConfig;
use taskbridge_protocols::TransportError;

use crate::response::HttpResponse;
use crate::retry::RetryConfig;

/// HTTP transport configuration.
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    /// Upper bound on concurrent in-flight requests.
    pub max_connections: usize,
    pub max_idle_per_host: usize,
    pub connect_timeout: Duration,
    /// Applied when a call does not pass its own timeout.
    pub request_timeout: Duration,
    pub retry: RetryConfig,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self::from(&TransportConfig::default())
    }
}

impl From<&TransportConfig> for HttpTransportConfig {
    fn from(config: &TransportConfig) -> Self {
        Self {
            max_connections: config.max_connections.max(1),
            max_idle_per_host: config.max_idle_per_host,
            connect_timeout: Duration::from_secs(config.connect_timeout_seconds),
            request_timeout: Duration::from_secs(config.request_timeout_seconds),
            retry: RetryConfig::from(config),
        }
    }
}

/// Shared HTTP client used for engine, registry, backend and analysis calls.
pub struct HttpTransport {
    client: Client,
    config: HttpTransportConfig,
    permits: Arc<Semaphore>,
    closed: AtomicBool,
}

impl HttpTransport {
    /// Create a new HTTP transport.
    pub fn new(config: HttpTransportConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .pool_max_idle_per_host(config.max_idle_per_host)
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| TransportError::Request {
                url: String::new(),
                source: Box::new(e),
            })?;

        Ok(Self {
            client,
            permits: Arc::new(Semaphore::new(config.max_connections)),
            config,
            closed: AtomicBool::new(false),
        })
    }

    pub fn config(&self) -> &HttpTransportConfig {
        &self.config
    }

    /// Permits currently free. Zero means new requests will queue.
    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }

    pub async fn get_json(
        &self,
        url: &str,
        timeout: Option<Duration>,
    ) -> Result<HttpResponse, TransportError> {
        self.execute(Method::GET, url, None, timeout).await
    }

    pub async fn post_json<T>(
        &self,
        url: &str,
        body: &T,
        timeout: Option<Duration>,
    ) -> Result<HttpResponse, TransportError>
    where
        T: Serialize + ?Sized,
    {
        let body = serde_json::to_value(body).map_err(|e| TransportError::Request {
            url: url.to_string(),
            source: Box::new(e),
        })?;
        self.execute(Method::POST, url, Some(body), timeout).await
    }

    /// Reject further requests. Requests waiting for a permit fail too.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.permits.close();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    async fn execute(
        &self,
        method: Method,
        url: &str,
        body: Option<Value>,
        timeout: Option<Duration>,
    ) -> Result<HttpResponse, TransportError> {
        let mut attempt = 0;

        loop {
            if self.is_closed() {
                return Err(TransportError::Closed);
            }

            let outcome = self.send_once(&method, url, body.as_ref(), timeout).await;
            let Some(delay) = self.config.retry.backoff(attempt, &outcome) else {
                if let Ok(response) = &outcome {
                    debug!(%method, %url, status = response.status, attempts = attempt + 1, "Request completed");
                }
                return outcome;
            };

            match &outcome {
                Ok(response) => warn!(
                    %url,
                    status = response.status,
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    "Retryable status, backing off"
                ),
                Err(e) => warn!(
                    %url,
                    error = %e,
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    "Connection failed, backing off"
                ),
            }
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    async fn send_once(
        &self,
        method: &Method,
        url: &str,
        body: Option<&Value>,
        timeout: Option<Duration>,
    ) -> Result<HttpResponse, TransportError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| TransportError::Closed)?;

        let mut request = self
            .client
            .request(method.clone(), url)
            .header(header::ACCEPT, "application/json");

        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| classify(url, e))?;
        let status = response.status().as_u16();
        let bytes = response.bytes().await.map_err(|e| classify(url, e))?;

        Ok(HttpResponse::from_bytes(status, &bytes))
    }
}

fn classify(url: &str, error: reqwest::Error) -> TransportError {
    let url = url.to_string();
    if error.is_connect() {
        TransportError::Connect {
            url,
            source: Box::new(error),
        }
    } else if error.is_timeout() {
        TransportError::Timeout {
            url,
            source: Box::new(error),
        }
    } else {
        TransportError::Request {
            url,
            source: Box::new(error),
        }
    }
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
