//! Analysis side-channel errors.

use thiserror::Error;

use super::TransportError;

/// Best-effort recording failed. Logged, never propagated.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Analysis store rejected record: {status} {message}")]
    Rejected { status: u16, message: String },
}
