//! The rule engine: matching fused with dispatch, plus the safe-point side
//! that runs deferred effects.
//!
//! `trigger` runs on the host's notification path. It never mutates the
//! simulation; it only scans rules under the store's read lock and enqueues
//! [`DeferredEffect`]s carrying stable ids. The host later calls
//! [`Engine::safe_point`] (or `run_deferred` / `tick_timers` separately) from
//! a point where mutation is safe.

use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::EngineConfig;
use crate::dispatch::{DeferredEffect, DeferredQueue, EffectCall, ExecutorRegistry, RunReport, TimedTasks};
use crate::host::{Host, ObjectRef};
use crate::loader::{self, LoadStats};
use crate::metrics::{Metrics, MetricsSnapshot};
use crate::rules::matcher;
use crate::rules::{EventKind, Rule, RuleContext, RuleStore};
use crate::tracking::{HitDebounce, InteractionCounter, RuleKey};

pub struct Engine<H: Host> {
    host: Arc<H>,
    config: EngineConfig,
    store: RuleStore,
    queue: DeferredQueue,
    executors: ExecutorRegistry<H::Ref>,
    timers: TimedTasks<H::Ref>,
    debounce: HitDebounce,
    interactions: InteractionCounter,
    metrics: Metrics,
    rng: Mutex<StdRng>,
    triggers_since_sweep: AtomicU32,
}

impl<H: Host> Engine<H> {
    pub fn new(host: Arc<H>, config: EngineConfig, executors: ExecutorRegistry<H::Ref>) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let missing = executors.missing();
        if !missing.is_empty() {
            tracing::warn!("No executor registered for {:?}; those effects will be dropped", missing);
        }

        Self {
            host,
            debounce: HitDebounce::new(config.hit_debounce()),
            interactions: InteractionCounter::new(config.interaction_ttl()),
            config,
            store: RuleStore::new(),
            queue: DeferredQueue::new(),
            executors,
            timers: TimedTasks::new(),
            metrics: Metrics::new(),
            rng: Mutex::new(rng),
            triggers_since_sweep: AtomicU32::new(0),
        }
    }

    pub fn host(&self) -> &Arc<H> {
        &self.host
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ── Rule set lifecycle ──────────────────────────────────────────────

    /// Parse every document under `root` and atomically replace the rule set.
    /// Parsing happens before the write lock is taken.
    pub fn reload(&self, root: &Path) -> LoadStats {
        let report = loader::load_dir(root, self.host.as_ref());
        let generation = self.install(report.rules);
        tracing::info!("Rule set generation {} installed ({} rules)", generation, report.stats.rules);
        report.stats
    }

    /// Replace the rule set with `rules`. Returns the new generation.
    pub fn install(&self, rules: Vec<Rule>) -> u64 {
        let generation = self.store.replace(rules);
        self.debounce.clear();
        self.interactions.clear();
        self.metrics.reloaded();
        generation
    }

    pub fn rule_count(&self) -> usize {
        self.store.len()
    }

    pub fn generation(&self) -> u64 {
        self.store.generation()
    }

    // ── Notification path ───────────────────────────────────────────────

    /// Match `ctx` against every rule in load order and enqueue the effects
    /// that pass their chance roll. Returns how many were enqueued.
    pub fn trigger(&self, ctx: &RuleContext<H::Ref>) -> usize {
        let now = Instant::now();
        let target = ctx.target.ref_id();
        let actor = ctx.actor.as_ref().map(ObjectRef::ref_id);

        let mut batch = Vec::new();
        let mut matched = 0u64;
        let mut skipped = 0u64;

        let set = self.store.read();
        for (index, rule) in set.rules.iter().enumerate() {
            if !matcher::rule_applies(rule, ctx) {
                continue;
            }

            let key = RuleKey {
                generation: set.generation,
                index,
            };
            if !self.admit(rule, key, ctx, now) {
                self.metrics.rule_suppressed();
                continue;
            }

            matched += 1;
            tracing::debug!(
                "{} on {} ({}) matched rule #{} from {}",
                ctx.event,
                target,
                ctx.base.form_type,
                index,
                rule.source
            );

            for effect in &rule.effects {
                if !self.roll(effect.chance) {
                    skipped += 1;
                    continue;
                }
                batch.push(DeferredEffect {
                    rule: key,
                    effect: Arc::clone(effect),
                    event: ctx.event,
                    target,
                    actor,
                    hit: ctx.hit,
                });
            }
        }

        let enqueued = batch.len();
        self.queue.push_batch(batch);
        drop(set);

        self.metrics.record_trigger(matched, enqueued as u64, skipped);
        self.maybe_sweep(now);
        enqueued
    }

    /// Stateful gates, in order: hit debounce, interaction threshold, then
    /// the filter's own per-trigger chance.
    fn admit(&self, rule: &Rule, key: RuleKey, ctx: &RuleContext<H::Ref>, now: Instant) -> bool {
        let target = ctx.target.ref_id();

        if ctx.event == EventKind::Hit && !self.debounce.admit(key, target, now) {
            tracing::debug!("Hit on {} debounced for rule #{}", target, key.index);
            return false;
        }

        let threshold = rule.filter.interactions;
        if threshold > 0 && !self.interactions.record(key, target, threshold, now) {
            return false;
        }

        self.roll(rule.filter.chance)
    }

    /// One uniform draw in `[0, 100)`; passes iff it lands below `chance`.
    fn roll(&self, chance: f32) -> bool {
        if chance >= 100.0 {
            return true;
        }
        if chance <= 0.0 {
            return false;
        }
        let draw: f32 = self
            .rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .gen_range(0.0..100.0);
        draw < chance
    }

    fn maybe_sweep(&self, now: Instant) {
        let every = self.config.sweep_every.max(1);
        if self.triggers_since_sweep.fetch_add(1, Ordering::Relaxed) + 1 >= every {
            self.triggers_since_sweep.store(0, Ordering::Relaxed);
            self.maintain(now);
        }
    }

    /// Evict aged and stale-generation tracking entries.
    pub fn maintain(&self, now: Instant) {
        let generation = self.store.generation();
        self.debounce.sweep(now, generation);
        self.interactions.sweep(now, generation);
    }

    // ── Safe-point side ─────────────────────────────────────────────────

    /// Run deferred effects, then step timed tasks.
    pub fn safe_point(&self) -> RunReport {
        let report = self.run_deferred();
        self.tick_timers(Instant::now());
        report
    }

    /// Drain the deferred queue, re-resolving each effect's target first.
    pub fn run_deferred(&self) -> RunReport {
        let mut report = RunReport::default();
        for task in self.queue.drain() {
            match self.run_task(&task) {
                TaskOutcome::Ran => report.ran += 1,
                TaskOutcome::Aborted => report.aborted += 1,
                TaskOutcome::Failed => report.failed += 1,
            }
        }
        if report.total() > 0 {
            tracing::debug!(
                "Deferred effects: {} ran, {} aborted, {} failed",
                report.ran,
                report.aborted,
                report.failed
            );
        }
        report
    }

    fn run_task(&self, task: &DeferredEffect) -> TaskOutcome {
        let kind = task.effect.kind;

        let Some(target) = self.host.lookup_ref(task.target) else {
            tracing::debug!("{:?}: target {} no longer exists, dropping", kind, task.target);
            self.metrics.task_aborted();
            return TaskOutcome::Aborted;
        };
        // A vanished actor is not fatal; the effect acts on the target.
        let actor = task.actor.and_then(|id| self.host.lookup_ref(id));

        let ctx = match task.hit {
            Some(attributes) => RuleContext::hit(actor, target, attributes),
            None => RuleContext::new(task.event, actor, target),
        };
        let Some(ctx) = ctx else {
            tracing::debug!("{:?}: target {} has no base form any more, dropping", kind, task.target);
            self.metrics.task_aborted();
            return TaskOutcome::Aborted;
        };

        let Some(executor) = self.executors.get(kind) else {
            tracing::warn!("{:?}: no executor registered, dropping", kind);
            self.metrics.executor_failed();
            return TaskOutcome::Failed;
        };

        let call = EffectCall {
            ctx: &ctx,
            effect: &task.effect,
            timers: &self.timers,
        };
        match panic::catch_unwind(AssertUnwindSafe(|| executor.execute(&call))) {
            Ok(Ok(())) => {
                self.metrics.task_run();
                TaskOutcome::Ran
            }
            Ok(Err(e)) => {
                tracing::warn!("{:?} on {} failed: {}", kind, task.target, e);
                self.metrics.executor_failed();
                TaskOutcome::Failed
            }
            Err(payload) => {
                let msg = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".into());
                tracing::error!("{:?} on {} panicked: {}", kind, task.target, msg);
                self.metrics.executor_failed();
                TaskOutcome::Failed
            }
        }
    }

    /// Step timed tasks that are due at `now`.
    pub fn tick_timers(&self, now: Instant) -> usize {
        self.timers.tick(self.host.as_ref(), now)
    }

    pub fn timers(&self) -> &TimedTasks<H::Ref> {
        &self.timers
    }

    /// Effects queued and not yet run, oldest first.
    pub fn pending(&self) -> Vec<DeferredEffect> {
        self.queue.pending()
    }

    pub fn pending_len(&self) -> usize {
        self.queue.len()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics
            .snapshot(self.rule_count() as u64, self.pending_len() as u64)
    }
}

enum TaskOutcome {
    Ran,
    Aborted,
    Failed,
}
