//! Cancellation of suspended queue calls
//!
//! A [`CancelToken`] is handed to the cancellable blocking operations. While
//! such a call is parked it registers its queue with the token; `cancel` sets
//! the token's flag and then interrupts every registered queue, which wakes
//! the parked call so it can observe the flag and back out.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tracing::debug;

/// Something a cancel token can wake up
pub(crate) trait Interrupt: Send + Sync {
    /// Wakes every thread parked on this object
    fn interrupt(&self);
}

type Waiter = (u64, Weak<dyn Interrupt>);

#[derive(Default)]
struct Inner {
    cancelled: AtomicBool,
    next_id: AtomicU64,
    waiters: Mutex<Vec<Waiter>>,
}

impl Inner {
    fn waiters(&self) -> MutexGuard<'_, Vec<Waiter>> {
        self.waiters.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A shareable signal that interrupts blocking queue calls
///
/// Clones share the same flag. Once cancelled, a token stays cancelled: every
/// cancellable call that has to wait while holding it returns a `Cancelled`
/// error instead, including calls that were already parked when `cancel` ran.
/// A call that can complete without waiting still completes.
///
/// ```
/// use std::sync::Arc;
/// use std::thread;
///
/// use blocking_queue_rs::{BlockingQueue, CancelToken, DequeueError};
///
/// let queue = Arc::new(BlockingQueue::<u32>::new(4));
/// let token = CancelToken::new();
///
/// let consumer = {
///     let queue = Arc::clone(&queue);
///     let token = token.clone();
///     thread::spawn(move || queue.dequeue_with(&token))
/// };
///
/// token.cancel();
/// assert_eq!(consumer.join().unwrap(), Err(DequeueError::Cancelled));
/// assert_eq!(queue.size(), 0);
/// ```
#[derive(Clone, Default)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

impl CancelToken {
    /// Creates a token that has not been cancelled
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` once [`cancel`](Self::cancel) has been called on this
    /// token or any of its clones
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Cancels the token and wakes every call currently parked with it
    ///
    /// Idempotent.
    pub fn cancel(&self) {
        if self.inner.cancelled.swap(true, Ordering::SeqCst) {
            return;
        }

        // Collect first so that no queue lock is taken under the waiters lock
        let targets: Vec<Arc<dyn Interrupt>> = self
            .inner
            .waiters()
            .iter()
            .filter_map(|(_, waiter)| waiter.upgrade())
            .collect();

        debug!(waiters = targets.len(), "cancel token fired");
        for target in targets {
            target.interrupt();
        }
    }

    /// Registers `target` to be interrupted by `cancel` until the returned
    /// guard is dropped
    ///
    /// Must be called before the caller first checks `is_cancelled`, so that
    /// a concurrent `cancel` either sees the registration or is seen by the
    /// check.
    pub(crate) fn register(&self, target: Weak<dyn Interrupt>) -> Registration<'_> {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let mut waiters = self.inner.waiters();
        waiters.retain(|(_, waiter)| waiter.strong_count() > 0);
        waiters.push((id, target));
        Registration { token: self, id }
    }

    #[cfg(test)]
    fn registered(&self) -> usize {
        self.inner.waiters().len()
    }
}

impl fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Keeps a queue registered with a token for the duration of one call
pub(crate) struct Registration<'a> {
    token: &'a CancelToken,
    id: u64,
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        self.token
            .inner
            .waiters()
            .retain(|(id, _)| *id != self.id);
    }
}
