//! # TaskBridge Cache
//!
//! Generic TTL cache shared by the metadata extractor, registry and
//! capability-discovery client.
//!
//! Entries expire lazily: an expired entry is evicted when it is next read
//! or by an explicit [`TtlCache::cleanup_expired`] sweep. Staleness is bounded
//! by how often callers read, not by a background timer.

mod entry;
mod ttl;

pub use entry::CacheEntry;
pub use ttl::{CacheStats, TtlCache};
