//! Retry policy for backend and engine requests.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use taskbridge_config::TransportConfig;
use taskbridge_protocols::TransportError;

use crate::response::HttpResponse;

/// Share of the computed delay added or removed as jitter.
const JITTER_RATIO: f64 = 0.1;

/// Bounded exponential backoff.
///
/// Attempt `n` (zero-based) waits `base_delay * backoff_multiplier^n`,
/// capped at `max_delay`, then spread by up to ±10% when `jitter` is set.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the first attempt. Zero disables retrying.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

impl From<&TransportConfig> for RetryConfig {
    fn from(config: &TransportConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
            ..Default::default()
        }
    }
}

impl RetryConfig {
    /// A policy that sends every request exactly once.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// Wait before retry number `attempt + 1`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let raw_ms = self.base_delay.as_millis() as f64 * self.backoff_multiplier.powi(exponent);
        let capped_ms = raw_ms.min(self.max_delay.as_millis() as f64);

        let spread_ms = if self.jitter {
            capped_ms * JITTER_RATIO * jitter_unit()
        } else {
            0.0
        };
        Duration::from_millis((capped_ms + spread_ms).max(0.0) as u64)
    }

    /// How long to wait before resending after `outcome`, or `None` when the
    /// outcome is final.
    ///
    /// Transient statuses and refused connections are retried; timeouts are
    /// not, since the backend may still be working on the request.
    pub fn backoff(
        &self,
        attempt: u32,
        outcome: &Result<HttpResponse, TransportError>,
    ) -> Option<Duration> {
        if attempt >= self.max_retries {
            return None;
        }
        let transient = match outcome {
            Ok(response) => is_retryable_status(response.status),
            Err(e) => e.is_connect(),
        };
        transient.then(|| self.delay_for_attempt(attempt))
    }
}

/// Pseudo-random value in `[-1.0, 1.0)` from the clock's sub-second nanos.
fn jitter_unit() -> f64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    (f64::from(nanos) / 1_000_000_000.0) * 2.0 - 1.0
}

/// Statuses that signal a transient backend condition.
pub fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 502 | 503 | 504)
}
