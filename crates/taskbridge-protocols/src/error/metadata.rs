//! Metadata extraction errors.

use thiserror::Error;

use super::TransportError;

/// Definition lookup or parse failed. Always recovered via default routing.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("Task has no process instance id")]
    MissingProcessInstance,

    #[error("Process instance {0} not found")]
    InstanceNotFound(String),

    #[error("Process definition {0} not found")]
    DefinitionNotFound(String),

    #[error("Engine returned {status} for {url}")]
    EngineStatus { status: u16, url: String },

    #[error("Failed to parse definition {definition_id}: {message}")]
    Parse {
        definition_id: String,
        message: String,
    },

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = MetadataError::Parse {
            definition_id: "proc:1".to_string(),
            message: "unexpected EOF".to_string(),
        };
        assert!(err.to_string().contains("proc:1"));
        assert!(err.to_string().contains("unexpected EOF"));
    }

    #[test]
    fn test_from_transport() {
        let err: MetadataError = TransportError::Closed.into();
        assert!(matches!(err, MetadataError::Transport(_)));
    }
}
