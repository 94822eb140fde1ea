pub mod context;
pub mod effect;
pub mod event;
pub mod filter;
pub mod hit;
pub mod matcher;
pub mod store;

use std::sync::Arc;

pub use context::{EventRecord, RuleContext};
pub use effect::{Effect, EffectKind, FormRequirement, ItemCount};
pub use event::EventKind;
pub use filter::Filter;
pub use hit::{AttackType, HitAttributes, WeaponType};
pub use store::{RuleSet, RuleStore};

/// A declarative reaction: when any of `events` happens to an entity the
/// `filter` accepts, every effect whose own chance roll passes is dispatched.
///
/// Rules are evaluated in load order and all matching rules fire; there is
/// no priority and no first-match short-circuit.
#[derive(Debug, Clone)]
pub struct Rule {
    pub events: Vec<EventKind>,
    pub filter: Filter,
    /// Shared with the deferred tasks that carry them.
    pub effects: Vec<Arc<Effect>>,
    /// Document the rule came from, for log lines.
    pub source: String,
}

impl Rule {
    pub fn new(events: Vec<EventKind>, filter: Filter, effects: Vec<Effect>) -> Self {
        Self {
            events,
            filter,
            effects: effects.into_iter().map(Arc::new).collect(),
            source: String::new(),
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }
}
