// ── Fixed-window publisher ──
//
// Coalesces bursts of state updates into one publish per window. The
// window opens at the first push after a publish and closes a fixed time
// later. Later pushes never extend it, so a steady stream still publishes
// once per window. The value published is whatever was pushed last. Without a tokio
// runtime there is no timer to wait on, so pushes publish immediately.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Fixed-window, last-write-wins publisher over a `watch` channel.
pub struct Debouncer<T> {
    shared: Arc<Shared<T>>,
}

struct Shared<T> {
    window: Duration,
    tx: watch::Sender<Arc<T>>,
    pending: Mutex<Option<Arc<T>>>,
    /// A flush task is waiting out the current window.
    armed: AtomicBool,
    cancel: CancellationToken,
}

impl<T: Send + Sync + 'static> Debouncer<T> {
    pub fn new(initial: T, window: Duration, cancel: CancellationToken) -> Self {
        let (tx, _) = watch::channel(Arc::new(initial));
        Self {
            shared: Arc::new(Shared {
                window,
                tx,
                pending: Mutex::new(None),
                armed: AtomicBool::new(false),
                cancel,
            }),
        }
    }

    /// Queue `value` for the current window. Dropped after cancellation.
    pub fn push(&self, value: T) {
        if self.shared.cancel.is_cancelled() {
            return;
        }
        let value = Arc::new(value);

        let Ok(handle) = Handle::try_current() else {
            self.shared.tx.send_replace(value);
            return;
        };
        if self.shared.window.is_zero() {
            self.shared.tx.send_replace(value);
            return;
        }

        *self.shared.lock_pending() = Some(value);
        if !self.shared.armed.swap(true, Ordering::AcqRel) {
            let shared = Arc::clone(&self.shared);
            handle.spawn(async move { shared.flush_after_window().await });
        }
    }

    /// Publish any pending value now.
    pub fn flush(&self) {
        self.shared.publish_pending();
    }

    /// Drop the pending value and stop the window timer.
    pub fn cancel(&self) {
        self.shared.cancel.cancel();
        self.shared.lock_pending().take();
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<T>> {
        self.shared.tx.subscribe()
    }

    /// Last published value.
    pub fn current(&self) -> Arc<T> {
        Arc::clone(&self.shared.tx.borrow())
    }
}

impl<T> Shared<T> {
    fn lock_pending(&self) -> std::sync::MutexGuard<'_, Option<Arc<T>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn flush_after_window(&self) {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => {
                self.armed.store(false, Ordering::Release);
                return;
            }
            () = tokio::time::sleep(self.window) => {}
        }
        // disarm before taking so a concurrent push either lands in this
        // flush or arms a new window
        self.armed.store(false, Ordering::Release);
        self.publish_pending();
    }

    fn publish_pending(&self) {
        let value = self.lock_pending().take();
        if let Some(value) = value {
            self.tx.send_replace(value);
        }
    }
}
