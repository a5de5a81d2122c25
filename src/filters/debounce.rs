//! Trailing-edge debouncer backed by a cancellable tokio timer

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

type Sink<T> = Arc<dyn Fn(T) + Send + Sync>;

/// Coalesces rapid updates into a single write of the latest value.
///
/// Every [`schedule`](Self::schedule) replaces the pending value and restarts
/// the timer. The sink runs once the delay elapses with no further calls.
/// Dropping the debouncer flushes a pending value instead of losing it.
pub struct Debouncer<T: Send + 'static> {
    delay: Duration,
    pending: Arc<Mutex<Option<T>>>,
    timer: Mutex<Option<JoinHandle<()>>>,
    sink: Sink<T>,
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn new<F>(delay: Duration, sink: F) -> Self
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        Self {
            delay,
            pending: Arc::new(Mutex::new(None)),
            timer: Mutex::new(None),
            sink: Arc::new(sink),
        }
    }

    /// Replace the pending value and restart the timer.
    ///
    /// Outside a tokio runtime there is no timer to run, so the value is
    /// written immediately.
    pub fn schedule(&self, value: T) {
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                tracing::debug!("No runtime available, writing without debounce");
                self.abort_timer();
                self.pending.lock().take();
                (self.sink)(value);
                return;
            }
        };

        *self.pending.lock() = Some(value);

        let pending = Arc::clone(&self.pending);
        let sink = Arc::clone(&self.sink);
        let delay = self.delay;

        let mut timer = self.timer.lock();
        if let Some(previous) = timer.take() {
            previous.abort();
        }
        *timer = Some(handle.spawn(async move {
            tokio::time::sleep(delay).await;
            let value = pending.lock().take();
            if let Some(value) = value {
                sink(value);
            }
        }));
    }

    /// Write the pending value now, if any. Returns whether a write happened.
    pub fn flush(&self) -> bool {
        self.abort_timer();
        let value = self.pending.lock().take();
        match value {
            Some(value) => {
                (self.sink)(value);
                true
            }
            None => false,
        }
    }

    /// Drop the pending value without writing it
    pub fn cancel(&self) -> Option<T> {
        self.abort_timer();
        self.pending.lock().take()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.lock().is_some()
    }

    fn abort_timer(&self) {
        if let Some(timer) = self.timer.lock().take() {
            timer.abort();
        }
    }
}

impl<T: Send + 'static> Drop for Debouncer<T> {
    fn drop(&mut self) {
        if self.flush() {
            tracing::debug!("Flushed pending debounced write on teardown");
        }
    }
}
