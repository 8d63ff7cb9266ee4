//! Dispatcher construction errors.

use thiserror::Error;

use taskbridge_protocols::TransportError;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Failed to create HTTP transport: {0}")]
    Transport(#[from] TransportError),

    #[error("Invalid dispatcher configuration: {0}")]
    InvalidConfig(String),
}
