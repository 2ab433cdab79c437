//! Per-request cancellation signal shared by a fan-out and all its fetches
//!
//! The signal is a `watch` channel holding a single `bool`. Triggering flips
//! it to `true` exactly once; every clone observes the flip, including tasks
//! that are currently suspended in [`CancellationSignal::cancelled`].

use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;

/// Cloneable, write-once cancellation flag
#[derive(Debug, Clone)]
pub struct CancellationSignal {
    sender: Arc<watch::Sender<bool>>,
}

impl CancellationSignal {
    /// Create a fresh, untriggered signal
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Trigger the signal
    ///
    /// Returns `true` only for the call that actually flipped the flag;
    /// repeated or concurrent calls are no-ops and return `false`.
    pub fn trigger(&self) -> bool {
        self.sender.send_if_modified(|triggered| {
            if *triggered {
                false
            } else {
                *triggered = true;
                true
            }
        })
    }

    /// Check whether the signal has been triggered
    pub fn is_triggered(&self) -> bool {
        *self.sender.borrow()
    }

    /// Resolve once the signal is triggered
    ///
    /// Resolves immediately if it already was. Racing this future against a
    /// blocking call with `tokio::select!` unblocks that call the moment any
    /// task triggers the signal.
    pub fn cancelled(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut receiver = self.sender.subscribe();
        async move {
            // The sender lives in an Arc shared with `self`, so the channel
            // cannot close while a clone is alive; a closed channel means
            // every owner is gone and nothing can trigger anymore.
            let closed = receiver.wait_for(|triggered| *triggered).await.is_err();
            if closed {
                std::future::pending::<()>().await;
            }
        }
    }

    /// Run `future` unless the signal fires first
    ///
    /// Returns `None` when cancellation won the race. The signal is checked
    /// before `future` is polled, so an already-triggered signal never lets
    /// the work start.
    pub async fn run_until_cancelled<F>(&self, future: F) -> Option<F::Output>
    where
        F: Future,
    {
        if self.is_triggered() {
            return None;
        }

        tokio::select! {
            biased;
            _ = self.cancelled() => None,
            output = future => Some(output),
        }
    }
}

impl Default for CancellationSignal {
    fn default() -> Self {
        Self::new()
    }
}
