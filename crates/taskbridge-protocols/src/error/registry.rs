//! Registry resolution errors.

use thiserror::Error;

use super::TransportError;

/// A registry source could not be read. The source is skipped.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Discovery backend returned {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Invalid catalog from {url}: {message}")]
    InvalidCatalog { url: String, message: String },
}
