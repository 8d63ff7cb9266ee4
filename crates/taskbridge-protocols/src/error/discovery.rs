//! Capability-discovery errors.

use thiserror::Error;

use super::TransportError;

/// Discovery failed. Recovered via the entry's static tool list.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Discovery endpoint {url} returned {status}")]
    Status { url: String, status: u16 },

    #[error("Invalid tool catalog from {url}: {message}")]
    InvalidCatalog { url: String, message: String },
}
