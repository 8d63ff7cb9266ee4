//! # TaskBridge Transport
//!
//! One pooled HTTP client shared by every outbound caller. Requests beyond
//! `max_connections` queue on a semaphore instead of failing, and 429/502/
//! 503/504 responses and connection failures are retried with exponential
//! backoff before the caller ever sees them.

mod http;
mod response;
mod retry;

pub use http::{HttpTransport, HttpTransportConfig};
pub use response::HttpResponse;
pub use retry::{is_retryable_status, RetryConfig};
