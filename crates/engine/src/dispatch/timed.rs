//! Duration-bound background work.
//!
//! Some effects keep acting on their target for a while (a timed nudge, a
//! held animation). Each one becomes a [`TimedTask`] owned by [`TimedTasks`]:
//! it carries the target's stable id, is stepped from the host's safe point,
//! re-resolves the target on every step and ends early once the target is
//! gone. Finished tasks are reaped whenever a new one is spawned.

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use slotmap::{SlotMap, new_key_type};

use crate::form::RefId;
use crate::host::{Host, ObjectRef};

new_key_type! {
    /// Handle for a running timed task.
    pub struct TimedTaskId;
}

/// What a step wants to happen next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Continue,
    Done,
}

/// One step of a timed task: the live target and the time since the task
/// started.
pub type StepFn<R> = Box<dyn FnMut(&R, Duration) -> Tick + Send>;

struct TimedTask<R> {
    target: RefId,
    started: Instant,
    until: Instant,
    every: Duration,
    next_due: Instant,
    step: StepFn<R>,
    finished: bool,
}

pub struct TimedTasks<R> {
    tasks: Mutex<SlotMap<TimedTaskId, TimedTask<R>>>,
}

impl<R: ObjectRef> TimedTasks<R> {
    pub fn new() -> Self {
        Self {
            tasks: Mutex::new(SlotMap::with_key()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SlotMap<TimedTaskId, TimedTask<R>>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start stepping `target` every `every` for `duration`, beginning at the
    /// next tick. Reaps finished tasks first.
    pub fn spawn(&self, target: RefId, duration: Duration, every: Duration, step: StepFn<R>) -> TimedTaskId {
        let now = Instant::now();
        let mut tasks = self.lock();
        let before = tasks.len();
        tasks.retain(|_, task| !task.finished);
        let reaped = before - tasks.len();
        if reaped > 0 {
            tracing::debug!("Reaped {} finished timed tasks", reaped);
        }

        tasks.insert(TimedTask {
            target,
            started: now,
            until: now + duration,
            every,
            next_due: now,
            step,
            finished: false,
        })
    }

    /// Step every due task. Called from the host's safe point.
    ///
    /// Step closures run under the task lock and must not spawn new timed
    /// tasks themselves.
    pub fn tick<H: Host<Ref = R>>(&self, host: &H, now: Instant) -> usize {
        let mut tasks = self.lock();
        let mut stepped = 0;

        for (id, task) in tasks.iter_mut() {
            if task.finished || now < task.next_due {
                continue;
            }
            if now >= task.until {
                task.finished = true;
                continue;
            }

            let Some(target) = host.lookup_ref(task.target) else {
                tracing::debug!("Timed task {:?}: target {} is gone, ending early", id, task.target);
                task.finished = true;
                continue;
            };

            let elapsed = now.duration_since(task.started);
            let step = &mut task.step;
            match panic::catch_unwind(AssertUnwindSafe(|| step(&target, elapsed))) {
                Ok(Tick::Continue) => {
                    task.next_due = now + task.every;
                }
                Ok(Tick::Done) => task.finished = true,
                Err(_) => {
                    tracing::error!("Timed task {:?} on {} panicked, stopping it", id, task.target);
                    task.finished = true;
                }
            }
            stepped += 1;
        }

        stepped
    }

    pub fn is_running(&self, id: TimedTaskId) -> bool {
        self.lock().get(id).is_some_and(|task| !task.finished)
    }

    /// Tasks still running.
    pub fn active(&self) -> usize {
        self.lock().values().filter(|task| !task.finished).count()
    }

    /// Tasks held, including finished ones not yet reaped.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl<R: ObjectRef> Default for TimedTasks<R> {
    fn default() -> Self {
        Self::new()
    }
}
