use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::DeferredEffect;

/// FIFO of effects waiting for the host's next safe point.
#[derive(Debug, Default)]
pub struct DeferredQueue {
    tasks: Mutex<VecDeque<DeferredEffect>>,
}

impl DeferredQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<DeferredEffect>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append one trigger's effects under a single lock acquisition, so they
    /// stay contiguous and in scan order.
    pub fn push_batch(&self, batch: Vec<DeferredEffect>) {
        if batch.is_empty() {
            return;
        }
        self.lock().extend(batch);
    }

    /// Take everything queued so far. Effects enqueued while the drained
    /// batch runs wait for the next safe point.
    pub fn drain(&self) -> Vec<DeferredEffect> {
        self.lock().drain(..).collect()
    }

    /// Copy of the queued effects, oldest first.
    pub fn pending(&self) -> Vec<DeferredEffect> {
        self.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
