pub mod executor;
pub mod queue;
pub mod timed;

use std::sync::Arc;

pub use executor::{EffectCall, EffectExecutor, ExecutorRegistry};
pub use queue::DeferredQueue;
pub use timed::{StepFn, Tick, TimedTaskId, TimedTasks};

use crate::form::RefId;
use crate::rules::{Effect, EventKind, HitAttributes};
use crate::tracking::RuleKey;

/// An effect waiting to run. Carries only stable identifiers; the live
/// handles are looked up again right before the executor is called.
#[derive(Debug, Clone)]
pub struct DeferredEffect {
    pub rule: RuleKey,
    pub effect: Arc<Effect>,
    pub event: EventKind,
    pub target: RefId,
    pub actor: Option<RefId>,
    pub hit: Option<HitAttributes>,
}

/// Outcome of one safe-point drain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Executor ran and returned `Ok`.
    pub ran: usize,
    /// Target could not be re-resolved; no executor was called.
    pub aborted: usize,
    /// Executor missing, returned an error, or panicked.
    pub failed: usize,
}

impl RunReport {
    pub fn total(&self) -> usize {
        self.ran + self.aborted + self.failed
    }
}
