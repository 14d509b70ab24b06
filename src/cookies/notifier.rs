//! Debounced cookie change notification.
//!
//! The notifier is a two-state machine:
//!
//! - **Idle**: no timer armed.
//! - **Armed**: a task is sleeping towards the next callback invocation.
//!
//! Every mutation (re)arms the timer for the full interval, so a burst of
//! changes produces one callback after the burst goes quiet. When the timer
//! fires the notifier goes back to Idle and the callback runs on the
//! runtime's blocking pool, so a callback doing file I/O never stalls other
//! tasks. Callback errors and panics are logged and dropped.
//!
//! Timer state lives under its own lock, separate from the jar's entry lock.
//! Aborting the previous timer and arming the next one happen in one
//! critical section, and a generation counter lets a timer that already
//! woke up notice it was superseded.

use crate::base::jarerror::{BoxError, JarError};
use crate::cookies::jar::{CookieJar, WeakCookieJar};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Callback invoked with the jar once changes settle.
pub type ChangeCallback = Arc<dyn Fn(&CookieJar) -> Result<(), BoxError> + Send + Sync>;

#[derive(Clone)]
struct Registration {
    callback: ChangeCallback,
    interval: Duration,
    runtime: Handle,
}

#[derive(Default)]
struct TimerState {
    registration: Option<Registration>,
    pending: Option<JoinHandle<()>>,
    generation: u64,
}

impl TimerState {
    /// Abort the pending timer, if any, and invalidate it.
    fn disarm(&mut self) {
        if let Some(task) = self.pending.take() {
            task.abort();
        }
        self.generation = self.generation.wrapping_add(1);
    }
}

pub struct ChangeNotifier {
    registered: AtomicBool,
    state: Mutex<TimerState>,
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self {
            registered: AtomicBool::new(false),
            state: Mutex::new(TimerState::default()),
        }
    }

    /// Replace the callback and interval. Any pending notification is
    /// discarded; the notifier starts out Idle.
    pub fn register(&self, callback: ChangeCallback, interval: Duration, runtime: Handle) {
        let mut state = self.state.lock();
        state.disarm();
        state.registration = Some(Registration {
            callback,
            interval,
            runtime,
        });
        self.registered.store(true, Ordering::Release);
    }

    pub fn unregister(&self) {
        let mut state = self.state.lock();
        self.registered.store(false, Ordering::Release);
        state.disarm();
        state.registration = None;
    }

    pub fn is_registered(&self) -> bool {
        self.registered.load(Ordering::Acquire)
    }

    /// True while a timer task is still waiting to fire. A task cancelled
    /// by its runtime shutting down no longer counts.
    pub fn is_armed(&self) -> bool {
        self.state
            .lock()
            .pending
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Called by the jar after every mutation.
    pub(crate) fn on_mutation(&self, jar: &CookieJar) {
        if !self.is_registered() {
            return;
        }

        let mut state = self.state.lock();
        let Some(registration) = state.registration.clone() else {
            return;
        };

        let rearm = match &state.pending {
            Some(task) if task.is_finished() => {
                tracing::warn!(
                    generation = state.generation,
                    "cookie change timer ended without firing, runtime may have shut down"
                );
                false
            }
            Some(_) => true,
            None => false,
        };
        state.disarm();
        let generation = state.generation;

        tracing::debug!(
            generation,
            rearm,
            interval_ms = registration.interval.as_millis() as u64,
            "arming cookie change timer"
        );

        let task = registration
            .runtime
            .spawn(fire_after(jar.downgrade(), generation, registration.interval));
        state.pending = Some(task);
    }

    /// Armed → Idle transition taken by the timer task itself. Returns the
    /// callback to run, or `None` if `generation` was superseded.
    fn take_due(&self, generation: u64) -> Option<ChangeCallback> {
        let mut state = self.state.lock();
        if state.generation != generation {
            return None;
        }
        state.pending = None;
        state.registration.as_ref().map(|r| Arc::clone(&r.callback))
    }
}

impl Drop for ChangeNotifier {
    fn drop(&mut self) {
        if let Some(task) = self.state.get_mut().pending.take() {
            task.abort();
        }
    }
}

async fn fire_after(jar: WeakCookieJar, generation: u64, interval: Duration) {
    tokio::time::sleep(interval).await;

    let Some(jar) = jar.upgrade() else {
        tracing::debug!(generation, "cookie jar dropped before change notification fired");
        return;
    };

    let Some(callback) = jar.notifier().take_due(generation) else {
        tracing::debug!(generation, "skipping superseded cookie change notification");
        return;
    };

    let result = tokio::task::spawn_blocking(move || callback(&jar)).await;

    let source = match result {
        Ok(Ok(())) => return,
        Ok(Err(source)) => source,
        Err(join) => BoxError::from(join),
    };
    let err = JarError::callback_failure(source);
    tracing::warn!(generation, error = %err, "cookie change notification failed");
}
