//! Per-backend discovery state.

use serde::Serialize;

/// Lifecycle of one backend's tool catalog.
///
/// `Undiscovered → Discovered → Stale → Discovered`; a failed discovery from
/// any state moves to `Fallback`, and a later success returns to
/// `Discovered`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryState {
    Undiscovered,
    /// Catalog fetched and within its TTL.
    Discovered,
    /// Catalog fetched but past its TTL; the next use re-discovers.
    Stale,
    /// Last discovery failed; the static tool list is in use.
    Fallback,
}

impl DiscoveryState {
    pub fn needs_discovery(self) -> bool {
        matches!(self, DiscoveryState::Undiscovered | DiscoveryState::Stale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_needs_discovery() {
        assert!(DiscoveryState::Undiscovered.needs_discovery());
        assert!(DiscoveryState::Stale.needs_discovery());
        assert!(!DiscoveryState::Discovered.needs_discovery());
        assert!(!DiscoveryState::Fallback.needs_discovery());
    }

    #[test]
    fn test_serializes_snake_case() {
        assert_eq!(
            serde_json::to_value(DiscoveryState::Undiscovered).unwrap(),
            serde_json::json!("undiscovered")
        );
    }
}
