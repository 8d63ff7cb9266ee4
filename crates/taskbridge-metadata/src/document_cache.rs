//! Parsed-document cache.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use taskbridge_cache::{CacheStats, TtlCache};
use taskbridge_protocols::MetadataError;

use crate::parser::{ParsedDefinition, parse_definition};

/// Cache name reported in metrics snapshots.
pub const PARSED_DEFINITIONS_CACHE: &str = "parsed_definitions";

/// Parses each distinct definition once and shares the result.
///
/// Parse failures are not cached; the next call parses again.
pub struct DocumentCache {
    parsed: TtlCache<String, Arc<ParsedDefinition>>,
}

impl DocumentCache {
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            parsed: TtlCache::new(PARSED_DEFINITIONS_CACHE, ttl),
        }
    }

    pub fn get_or_parse(
        &self,
        definition_id: &str,
        xml: &str,
    ) -> Result<Arc<ParsedDefinition>, MetadataError> {
        if let Some(parsed) = self.parsed.get(definition_id) {
            return Ok(parsed);
        }

        let parsed = Arc::new(parse_definition(definition_id, xml)?);
        debug!(
            definition_id,
            activities = parsed.activities.len(),
            "Parsed process definition"
        );
        self.parsed
            .set(definition_id.to_string(), parsed.clone(), None);
        Ok(parsed)
    }

    /// Drop parsed definitions past their TTL. Returns the number removed.
    pub fn cleanup_expired(&self) -> usize {
        self.parsed.cleanup_expired()
    }

    pub fn clear(&self) {
        self.parsed.clear();
    }

    pub fn stats(&self) -> CacheStats {
        self.parsed.stats()
    }
}
