//! Cache entry bookkeeping.

use std::time::{Duration, Instant};

/// A cached value with optional absolute expiry.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub expires_at: Option<Instant>,
    pub last_access: Instant,
    pub access_count: u64,
}

impl<V> CacheEntry<V> {
    /// Create an entry that expires after `ttl`, or never.
    pub fn new(value: V, ttl: Option<Duration>) -> Self {
        let now = Instant::now();
        Self {
            value,
            expires_at: ttl.map(|ttl| now + ttl),
            last_access: now,
            access_count: 0,
        }
    }

    pub fn is_expired_at(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    pub(crate) fn touch(&mut self, now: Instant) {
        self.last_access = now;
        self.access_count += 1;
    }
}
