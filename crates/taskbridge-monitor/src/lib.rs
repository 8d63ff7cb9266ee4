//! # TaskBridge Monitor
//!
//! Process-lifetime counters for the dispatcher and the activity transition
//! table. Both are safe to share between dispatch workers and expose read
//! accessors only; nothing here drives dispatch decisions.

mod metrics;
mod sequence;

pub use metrics::{
    CacheCounters, MetricsSnapshot, OperationSummary, OperationTimer, OrchestratorMetrics,
    OrchestratorSnapshot,
};
pub use sequence::{SequenceTracker, Transition};
