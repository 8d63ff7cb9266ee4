//! Activity transition bookkeeping.

use std::collections::{BTreeMap, VecDeque};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::trace;

/// One observed step from one activity to the next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub from: Option<String>,
    pub to: String,
    pub observed_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct SequenceState {
    last: Option<String>,
    history: VecDeque<Transition>,
    transitions: BTreeMap<String, BTreeMap<String, u64>>,
}

/// Append-only table of `previous activity → next activity → count` plus a
/// bounded queue of recent transitions. Both live under one lock.
#[derive(Debug)]
pub struct SequenceTracker {
    capacity: usize,
    state: Mutex<SequenceState>,
}

impl SequenceTracker {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            state: Mutex::new(SequenceState::default()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Record that `activity_id` was dispatched after the previously recorded
    /// activity.
    pub fn record(&self, activity_id: &str) {
        let mut state = self.state.lock();
        let from = state.last.replace(activity_id.to_string());

        if let Some(previous) = &from {
            *state
                .transitions
                .entry(previous.clone())
                .or_default()
                .entry(activity_id.to_string())
                .or_insert(0) += 1;
        }

        if state.history.len() == self.capacity {
            state.history.pop_front();
        }
        state.history.push_back(Transition {
            from,
            to: activity_id.to_string(),
            observed_at: Utc::now(),
        });
        trace!(activity_id, "Recorded activity transition");
    }

    pub fn last_activity(&self) -> Option<String> {
        self.state.lock().last.clone()
    }

    /// Recent transitions, oldest first.
    pub fn history(&self) -> Vec<Transition> {
        self.state.lock().history.iter().cloned().collect()
    }

    /// How often `to` followed `from`.
    pub fn transition_count(&self, from: &str, to: &str) -> u64 {
        self.state
            .lock()
            .transitions
            .get(from)
            .and_then(|next| next.get(to))
            .copied()
            .unwrap_or(0)
    }

    /// Observed successors of `from`, most frequent first.
    pub fn successors(&self, from: &str) -> Vec<(String, u64)> {
        let mut successors: Vec<(String, u64)> = self
            .state
            .lock()
            .transitions
            .get(from)
            .map(|next| next.iter().map(|(k, v)| (k.clone(), *v)).collect())
            .unwrap_or_default();
        successors.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        successors
    }

    pub fn transition_table(&self) -> BTreeMap<String, BTreeMap<String, u64>> {
        self.state.lock().transitions.clone()
    }
}

impl Default for SequenceTracker {
    fn default() -> Self {
        Self::new(100)
    }
}
