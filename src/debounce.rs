//! Debounce
//!
//! Rapid input (e.g. a promotion code being typed) schedules work repeatedly; only the
//! most recent request whose quiet window elapses is allowed to run. Requests that are
//! superseded while still waiting are dropped. A request whose window has already
//! elapsed runs to completion, but its output is discarded if a newer request exists.

use std::{
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::Duration,
};

use tokio::{
    sync::mpsc::{self, UnboundedReceiver, UnboundedSender},
    task::JoinHandle,
    time::sleep,
};
use tracing::trace;

/// Quiet window applied to promotion-code input.
pub const PROMOTION_CODE_WINDOW: Duration = Duration::from_millis(500);

/// Cancellable-timer debouncer delivering the latest result on a channel.
#[derive(Debug)]
pub struct Debouncer<T> {
    window: Duration,
    generation: Arc<AtomicU64>,
    pending: Option<Pending>,
    output: UnboundedSender<T>,
}

impl<T: Send + 'static> Debouncer<T> {
    /// Create a debouncer and the receiver its results are delivered on.
    pub fn new(window: Duration) -> (Self, UnboundedReceiver<T>) {
        let (output, receiver) = mpsc::unbounded_channel();

        let debouncer = Self {
            window,
            generation: Arc::new(AtomicU64::new(0)),
            pending: None,
            output,
        };

        (debouncer, receiver)
    }

    /// Schedule `work` to run once the window elapses without another call.
    ///
    /// Any request still waiting out its window is cleared.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn schedule<F>(&mut self, work: F)
    where
        F: Future<Output = T> + Send + 'static,
    {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        self.clear_pending();

        let window = self.window;
        let current = Arc::clone(&self.generation);
        let output = self.output.clone();
        let fired = Arc::new(AtomicBool::new(false));
        let task_fired = Arc::clone(&fired);

        let handle = tokio::spawn(async move {
            sleep(window).await;

            if current.load(Ordering::SeqCst) != generation {
                return;
            }

            task_fired.store(true, Ordering::SeqCst);

            let value = work.await;

            if current.load(Ordering::SeqCst) == generation {
                // The receiver may be gone when the consumer has shut down.
                _ = output.send(value);
            } else {
                trace!(generation, "discarding superseded debounced result");
            }
        });

        self.pending = Some(Pending { handle, fired });
    }

    /// Drop any pending request.
    pub fn cancel(&mut self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.clear_pending();
    }

    /// Whether a request is waiting or running.
    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|pending| !pending.handle.is_finished())
    }

    fn clear_pending(&mut self) {
        let Some(pending) = self.pending.take() else {
            return;
        };

        // Requests already past their window are left to finish; the generation bump
        // discards their output.
        if !pending.fired.load(Ordering::SeqCst) {
            pending.handle.abort();
        }
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.handle.abort();
        }
    }
}

#[derive(Debug)]
struct Pending {
    handle: JoinHandle<()>,
    fired: Arc<AtomicBool>,
}
