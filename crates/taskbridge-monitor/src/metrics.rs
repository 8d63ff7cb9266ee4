//! Dispatcher metrics collection.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use dashmap::{DashMap, DashSet};
use serde::Serialize;

use taskbridge_cache::CacheStats;

#[derive(Debug, Default)]
struct OperationStats {
    count: AtomicU64,
    total_us: AtomicU64,
    max_us: AtomicU64,
}

impl OperationStats {
    fn record(&self, elapsed_us: u64) {
        self.count.fetch_add(1, Ordering::Relaxed);
        self.total_us.fetch_add(elapsed_us, Ordering::Relaxed);
        self.max_us.fetch_max(elapsed_us, Ordering::Relaxed);
    }

    fn summary(&self) -> OperationSummary {
        OperationSummary {
            count: self.count.load(Ordering::Relaxed),
            total_us: self.total_us.load(Ordering::Relaxed),
            max_us: self.max_us.load(Ordering::Relaxed),
        }
    }
}

/// Monotonic counters for the lifetime of a dispatcher.
#[derive(Debug, Default)]
pub struct OrchestratorMetrics {
    operations: DashMap<String, OperationStats>,
    api_calls: DashMap<String, AtomicU64>,
    workflows: DashSet<String>,
    tasks_processed: AtomicU64,
}

impl OrchestratorMetrics {
    /// Create new metrics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one timed run of a named operation.
    pub fn record_operation(&self, operation: &str, elapsed: Duration) {
        let elapsed_us = elapsed.as_micros().min(u64::MAX as u128) as u64;
        if let Some(stats) = self.operations.get(operation) {
            stats.record(elapsed_us);
            return;
        }
        self.operations
            .entry(operation.to_string())
            .or_default()
            .record(elapsed_us);
    }

    /// Time `operation` from now until [`OperationTimer::finish`] or drop.
    pub fn start_operation<'a>(&'a self, operation: &'a str) -> OperationTimer<'a> {
        OperationTimer {
            metrics: self,
            operation,
            started: Instant::now(),
            finished: false,
        }
    }

    /// Record a call to an external endpoint.
    pub fn record_api_call(&self, endpoint: &str) {
        if let Some(counter) = self.api_calls.get(endpoint) {
            counter.fetch_add(1, Ordering::Relaxed);
            return;
        }
        self.api_calls
            .entry(endpoint.to_string())
            .or_default()
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_task_processed(&self) {
        self.tasks_processed.fetch_add(1, Ordering::Relaxed);
    }

    /// Remember a process instance. Repeats are counted once.
    pub fn record_workflow(&self, process_instance_id: &str) {
        if !self.workflows.contains(process_instance_id) {
            self.workflows.insert(process_instance_id.to_string());
        }
    }

    pub fn tasks_processed(&self) -> u64 {
        self.tasks_processed.load(Ordering::Relaxed)
    }

    pub fn workflows_processed(&self) -> usize {
        self.workflows.len()
    }

    pub fn api_calls(&self, endpoint: &str) -> u64 {
        self.api_calls
            .get(endpoint)
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    pub fn operation(&self, operation: &str) -> Option<OperationSummary> {
        self.operations.get(operation).map(|stats| stats.summary())
    }

    /// Get a snapshot of the metrics, folding in the given cache counters.
    pub fn snapshot(&self, caches: &[CacheStats]) -> MetricsSnapshot {
        let cache_metrics = caches
            .iter()
            .map(|stats| {
                (
                    stats.name.clone(),
                    CacheCounters {
                        hits: stats.hits,
                        misses: stats.misses,
                    },
                )
            })
            .collect();
        let cache_hit_rates = caches
            .iter()
            .map(|stats| (stats.name.clone(), stats.hit_rate()))
            .collect();

        let operations: BTreeMap<String, OperationSummary> = self
            .operations
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().summary()))
            .collect();
        let avg_operation_times = operations
            .iter()
            .map(|(name, summary)| (name.clone(), summary.avg_ms()))
            .collect();
        let max_operation_times = operations
            .iter()
            .map(|(name, summary)| (name.clone(), summary.max_ms()))
            .collect();

        let api_calls = self
            .api_calls
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().load(Ordering::Relaxed)))
            .collect();

        MetricsSnapshot {
            cache_metrics,
            orchestrator_metrics: OrchestratorSnapshot {
                cache_hit_rates,
                avg_operation_times,
                max_operation_times,
                api_calls,
                total_tasks_processed: self.tasks_processed(),
                total_workflows_processed: self.workflows_processed() as u64,
            },
            timestamp: Utc::now(),
        }
    }
}

/// Records elapsed time for one operation when finished or dropped.
pub struct OperationTimer<'a> {
    metrics: &'a OrchestratorMetrics,
    operation: &'a str,
    started: Instant,
    finished: bool,
}

impl OperationTimer<'_> {
    pub fn finish(mut self) -> Duration {
        self.finished = true;
        let elapsed = self.started.elapsed();
        self.metrics.record_operation(self.operation, elapsed);
        elapsed
    }
}

impl Drop for OperationTimer<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.metrics
                .record_operation(self.operation, self.started.elapsed());
        }
    }
}

/// Count, total and maximum duration of one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OperationSummary {
    pub count: u64,
    pub total_us: u64,
    pub max_us: u64,
}

impl OperationSummary {
    /// Average duration in milliseconds.
    pub fn avg_ms(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        (self.total_us as f64 / self.count as f64) / 1000.0
    }

    pub fn max_ms(&self) -> f64 {
        self.max_us as f64 / 1000.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheCounters {
    pub hits: u64,
    pub misses: u64,
}

/// Snapshot of metrics at a point in time.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub cache_metrics: BTreeMap<String, CacheCounters>,
    pub orchestrator_metrics: OrchestratorSnapshot,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrchestratorSnapshot {
    pub cache_hit_rates: BTreeMap<String, f64>,
    /// Milliseconds.
    pub avg_operation_times: BTreeMap<String, f64>,
    /// Milliseconds.
    pub max_operation_times: BTreeMap<String, f64>,
    pub api_calls: BTreeMap<String, u64>,
    pub total_tasks_processed: u64,
    pub total_workflows_processed: u64,
}

impl MetricsSnapshot {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod tests;
