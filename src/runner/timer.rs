use std::{
    future::Future,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Idle,
    Armed(DateTime<Utc>),
    Fired,
}

struct Inner {
    state: TimerState,
    generation: u64,
    handle: Option<JoinHandle<()>>,
}

impl Inner {
    fn disarm(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
        self.generation = self.generation.wrapping_add(1);
    }
}

/// A named one-shot timer that holds at most one outstanding task.
///
/// Arming replaces whatever was armed before. Every arm or cancel bumps the
/// generation, and a woken task only runs its body if its generation is still
/// current, so a cancelled task can never fire even if it already woke up.
#[derive(Clone)]
pub struct TimerSlot {
    name: &'static str,
    inner: Arc<Mutex<Inner>>,
}

impl TimerSlot {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            inner: Arc::new(Mutex::new(Inner {
                state: TimerState::Idle,
                generation: 0,
                handle: None,
            })),
        }
    }

    fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
        inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> TimerState {
        Self::lock(&self.inner).state
    }

    /// Runs `task` after `delay`. `at` is the wall-clock instant that delay
    /// corresponds to and is only kept for [`TimerSlot::state`].
    ///
    /// The slot is already `Fired` when `task` starts, so the task may arm
    /// this same slot again.
    pub fn arm<F>(&self, at: DateTime<Utc>, delay: Duration, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut inner = Self::lock(&self.inner);
        inner.disarm();
        let generation = inner.generation;
        let slot = self.inner.clone();
        let name = self.name;

        inner.state = TimerState::Armed(at);
        inner.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut inner = Self::lock(&slot);
                if inner.generation != generation {
                    debug!(timer = name, "superseded before firing");
                    return;
                }
                inner.state = TimerState::Fired;
                inner.handle = None;
            }
            debug!(timer = name, "fired");
            task.await;
        }));
        debug!(timer = name, %at, "armed");
    }

    /// Cancels the armed task, if any. No-op on idle or fired slots.
    pub fn cancel(&self) {
        let mut inner = Self::lock(&self.inner);
        inner.disarm();
        if let TimerState::Armed(at) = inner.state {
            debug!(timer = self.name, %at, "cancelled");
            inner.state = TimerState::Idle;
        }
    }
}
