//! Lock-free engine counters.
//!
//! Triggers and deferred tasks update these with relaxed `fetch_add`s; readers
//! take a [`MetricsSnapshot`] whenever they like.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering::Relaxed};
use std::time::Instant;

pub struct Metrics {
    triggers: AtomicU64,
    rules_matched: AtomicU64,
    effects_enqueued: AtomicU64,
    effects_skipped: AtomicU64,
    suppressed: AtomicU64,

    tasks_run: AtomicU64,
    tasks_aborted: AtomicU64,
    executor_failures: AtomicU64,

    reloads: AtomicU64,

    started_at: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            triggers: AtomicU64::new(0),
            rules_matched: AtomicU64::new(0),
            effects_enqueued: AtomicU64::new(0),
            effects_skipped: AtomicU64::new(0),
            suppressed: AtomicU64::new(0),
            tasks_run: AtomicU64::new(0),
            tasks_aborted: AtomicU64::new(0),
            executor_failures: AtomicU64::new(0),
            reloads: AtomicU64::new(0),
            started_at: Instant::now(),
        }
    }

    /// Called once per `trigger` with its totals.
    pub fn record_trigger(&self, matched: u64, enqueued: u64, skipped: u64) {
        self.triggers.fetch_add(1, Relaxed);
        self.rules_matched.fetch_add(matched, Relaxed);
        self.effects_enqueued.fetch_add(enqueued, Relaxed);
        self.effects_skipped.fetch_add(skipped, Relaxed);
    }

    /// A matching rule held back by debounce, interaction threshold or the
    /// filter's own chance.
    pub fn rule_suppressed(&self) {
        self.suppressed.fetch_add(1, Relaxed);
    }

    pub fn task_run(&self) {
        self.tasks_run.fetch_add(1, Relaxed);
    }

    pub fn task_aborted(&self) {
        self.tasks_aborted.fetch_add(1, Relaxed);
    }

    pub fn executor_failed(&self) {
        self.executor_failures.fetch_add(1, Relaxed);
    }

    pub fn reloaded(&self) {
        self.reloads.fetch_add(1, Relaxed);
    }

    pub fn snapshot(&self, rules_loaded: u64, tasks_pending: u64) -> MetricsSnapshot {
        MetricsSnapshot {
            uptime_secs: self.started_at.elapsed().as_secs_f64(),
            rules_loaded,
            tasks_pending,
            triggers: self.triggers.load(Relaxed),
            rules_matched: self.rules_matched.load(Relaxed),
            effects_enqueued: self.effects_enqueued.load(Relaxed),
            effects_skipped: self.effects_skipped.load(Relaxed),
            suppressed: self.suppressed.load(Relaxed),
            tasks_run: self.tasks_run.load(Relaxed),
            tasks_aborted: self.tasks_aborted.load(Relaxed),
            executor_failures: self.executor_failures.load(Relaxed),
            reloads: self.reloads.load(Relaxed),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable view of all counters at a point in time.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub uptime_secs: f64,
    pub rules_loaded: u64,
    pub tasks_pending: u64,
    pub triggers: u64,
    pub rules_matched: u64,
    pub effects_enqueued: u64,
    /// Effects whose chance roll failed.
    pub effects_skipped: u64,
    pub suppressed: u64,
    pub tasks_run: u64,
    /// Deferred tasks whose target could not be re-resolved.
    pub tasks_aborted: u64,
    pub executor_failures: u64,
    pub reloads: u64,
}
