//! Dispatch errors surfaced to the caller.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::TransportError;
use crate::routing::ServiceIdentity;

/// Activity id reported for tasks that carry none.
pub const UNKNOWN_ACTIVITY: &str = "unknown";

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Service not found: {identity} (activity {activity_id})")]
    ServiceNotFound {
        identity: ServiceIdentity,
        activity_id: String,
    },

    #[error("Transport failure calling {identity} for activity {activity_id}: {source}")]
    Transport {
        identity: ServiceIdentity,
        activity_id: String,
        #[source]
        source: TransportError,
    },

    #[error("Backend {identity} returned {status} for activity {activity_id}: {message}")]
    Backend {
        identity: ServiceIdentity,
        activity_id: String,
        status: u16,
        message: String,
    },

    #[error("Dispatcher is closed")]
    Closed,
}

impl DispatchError {
    pub fn identity(&self) -> Option<&ServiceIdentity> {
        match self {
            DispatchError::ServiceNotFound { identity, .. }
            | DispatchError::Transport { identity, .. }
            | DispatchError::Backend { identity, .. } => Some(identity),
            DispatchError::Closed => None,
        }
    }

    pub fn activity_id(&self) -> Option<&str> {
        match self {
            DispatchError::ServiceNotFound { activity_id, .. }
            | DispatchError::Transport { activity_id, .. }
            | DispatchError::Backend { activity_id, .. } => Some(activity_id),
            DispatchError::Closed => None,
        }
    }

    /// Structured error object handed back to the engine-facing caller.
    pub fn report(&self) -> DispatchFailure {
        let identity = self.identity();
        DispatchFailure {
            message: self.to_string(),
            service_type: identity.map(|i| i.service_type.clone()),
            service_name: identity.map(|i| i.name.clone()),
            activity_id: self.activity_id().map(str::to_string),
        }
    }
}

/// Serializable form of a failed dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchFailure {
    pub message: String,
    pub service_type: Option<String>,
    pub service_name: Option<String>,
    pub activity_id: Option<String>,
}
