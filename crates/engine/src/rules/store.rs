use std::sync::{PoisonError, RwLock, RwLockReadGuard};

use super::Rule;

/// One generation of loaded rules. Never mutated after it is installed.
#[derive(Debug, Default)]
pub struct RuleSet {
    pub generation: u64,
    pub rules: Vec<Rule>,
}

/// The loaded rule collection behind a readers/writer lock.
///
/// Matching holds the read guard for a whole trigger, so a trigger sees
/// exactly one generation. Reload takes the write guard only for the swap;
/// parsing happens before.
#[derive(Debug, Default)]
pub struct RuleStore {
    inner: RwLock<RuleSet>,
}

impl RuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every rule at once. Returns the new generation.
    pub fn replace(&self, rules: Vec<Rule>) -> u64 {
        let mut set = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        set.generation += 1;
        set.rules = rules;
        set.generation
    }

    pub fn read(&self) -> RwLockReadGuard<'_, RuleSet> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len(&self) -> usize {
        self.read().rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn generation(&self) -> u64 {
        self.read().generation
    }
}
