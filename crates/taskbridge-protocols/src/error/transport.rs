//! HTTP transport errors.

use thiserror::Error;

/// Boxed underlying cause.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Raised once the transport has exhausted its retries.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Connection to {url} failed: {source}")]
    Connect {
        url: String,
        #[source]
        source: BoxError,
    },

    #[error("Request to {url} timed out")]
    Timeout {
        url: String,
        #[source]
        source: BoxError,
    },

    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: BoxError,
    },

    #[error("Invalid response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("Transport closed")]
    Closed,
}

impl TransportError {
    /// Connection-level failures are worth retrying.
    pub fn is_connect(&self) -> bool {
        matches!(self, TransportError::Connect { .. })
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            TransportError::Connect { url, .. }
            | TransportError::Timeout { url, .. }
            | TransportError::Request { url, .. }
            | TransportError::Decode { url, .. } => Some(url),
            TransportError::Closed => None,
        }
    }
}
