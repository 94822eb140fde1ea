//! Per-(rule, target) bookkeeping: hit debouncing and interaction counting.
//!
//! Both maps are keyed by [`RuleKey`], which includes the rule-set generation,
//! so entries from a replaced rule set can never alias a new rule at the same
//! index. Eviction is an age-based sweep; stale generations are always dropped.

use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::form::RefId;

/// Identity of a rule within one loaded generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RuleKey {
    pub generation: u64,
    pub index: usize,
}

/// Suppresses bursts of hits on the same target by the same rule.
pub struct HitDebounce {
    last_hit: DashMap<(RuleKey, RefId), Instant>,
    window: Duration,
}

impl HitDebounce {
    pub fn new(window: Duration) -> Self {
        Self {
            last_hit: DashMap::new(),
            window,
        }
    }

    /// `true` if the hit may proceed. Admitted hits restart the window;
    /// suppressed ones do not extend it.
    pub fn admit(&self, rule: RuleKey, target: RefId, now: Instant) -> bool {
        if self.window.is_zero() {
            return true;
        }
        match self.last_hit.entry((rule, target)) {
            Entry::Occupied(mut entry) => {
                if now.duration_since(*entry.get()) < self.window {
                    false
                } else {
                    entry.insert(now);
                    true
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(now);
                true
            }
        }
    }

    pub fn sweep(&self, now: Instant, generation: u64) {
        let window = self.window;
        self.last_hit.retain(|(rule, _), at| {
            rule.generation == generation && now.duration_since(*at) < window
        });
    }

    pub fn clear(&self) {
        self.last_hit.clear();
    }

    pub fn len(&self) -> usize {
        self.last_hit.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_hit.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
struct Tally {
    count: u32,
    last_seen: Instant,
}

/// Counts qualifying interactions per (rule, target).
pub struct InteractionCounter {
    tallies: DashMap<(RuleKey, RefId), Tally>,
    ttl: Duration,
}

impl InteractionCounter {
    pub fn new(ttl: Duration) -> Self {
        Self {
            tallies: DashMap::new(),
            ttl,
        }
    }

    /// Count one interaction and report whether `threshold` has been reached.
    /// The counter keeps growing past the threshold, so every later
    /// interaction also passes.
    pub fn record(&self, rule: RuleKey, target: RefId, threshold: u32, now: Instant) -> bool {
        let mut tally = self.tallies.entry((rule, target)).or_insert(Tally {
            count: 0,
            last_seen: now,
        });
        tally.count = tally.count.saturating_add(1);
        tally.last_seen = now;
        tally.count >= threshold
    }

    pub fn count(&self, rule: RuleKey, target: RefId) -> u32 {
        self.tallies.get(&(rule, target)).map(|t| t.count).unwrap_or(0)
    }

    pub fn sweep(&self, now: Instant, generation: u64) {
        let ttl = self.ttl;
        self.tallies.retain(|(rule, _), tally| {
            rule.generation == generation && now.duration_since(tally.last_seen) < ttl
        });
    }

    pub fn clear(&self) {
        self.tallies.clear();
    }

    pub fn len(&self) -> usize {
        self.tallies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tallies.is_empty()
    }
}
