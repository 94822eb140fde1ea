use std::collections::HashMap;

use crate::error::ExecError;
use crate::rules::{Effect, EffectKind, RuleContext};

use super::timed::TimedTasks;

/// Everything an executor gets for one effect invocation.
pub struct EffectCall<'a, R> {
    /// Freshly re-resolved context; the handles are live for this call only.
    pub ctx: &'a RuleContext<R>,
    pub effect: &'a Effect,
    /// For effects that need to keep acting on the target over time.
    pub timers: &'a TimedTasks<R>,
}

/// Performs the simulation-specific mutation for one effect kind.
pub trait EffectExecutor<R>: Send + Sync {
    fn execute(&self, call: &EffectCall<'_, R>) -> Result<(), ExecError>;
}

impl<R, F> EffectExecutor<R> for F
where
    F: Fn(&EffectCall<'_, R>) -> Result<(), ExecError> + Send + Sync,
{
    fn execute(&self, call: &EffectCall<'_, R>) -> Result<(), ExecError> {
        self(call)
    }
}

/// Maps each [`EffectKind`] to the executor that performs it. Adding a kind
/// is one `register` call.
pub struct ExecutorRegistry<R> {
    executors: HashMap<EffectKind, Box<dyn EffectExecutor<R>>>,
}

impl<R> ExecutorRegistry<R> {
    pub fn new() -> Self {
        Self {
            executors: HashMap::new(),
        }
    }

    /// Install `executor` for `kind`, replacing any previous one.
    pub fn register(&mut self, kind: EffectKind, executor: impl EffectExecutor<R> + 'static) -> &mut Self {
        self.executors.insert(kind, Box::new(executor));
        self
    }

    pub fn get(&self, kind: EffectKind) -> Option<&dyn EffectExecutor<R>> {
        self.executors.get(&kind).map(|e| e.as_ref())
    }

    pub fn contains(&self, kind: EffectKind) -> bool {
        self.executors.contains_key(&kind)
    }

    /// Kinds with no executor. Rules using them load fine but their effects
    /// are dropped with a warning at dispatch.
    pub fn missing(&self) -> Vec<EffectKind> {
        EffectKind::ALL
            .into_iter()
            .filter(|kind| !self.contains(*kind))
            .collect()
    }
}

impl<R> Default for ExecutorRegistry<R> {
    fn default() -> Self {
        Self::new()
    }
}
