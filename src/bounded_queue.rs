//! Implementation of the bounded FIFO queue
//!
//! This module provides [`BoundedQueue`], a fixed-capacity queue shared by any
//! number of producer and consumer threads. All state lives behind one mutex;
//! producers park on a "not full" condition and consumers on a "not empty"
//! condition. Both conditions are broadcast on the transition that can
//! unblock their waiters (empty to non-empty, full to non-full), which rules
//! out lost wakeups no matter how many threads are parked.

use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::cancel::{CancelToken, Interrupt};
use crate::common::{Blocking, FailFast, Policy, Shared};
use crate::error::{DequeueError, EnqueueError, QueueError};
use crate::node::Node;

/// A bounded, thread-safe FIFO queue
///
/// The policy parameter `P` decides what happens at the capacity limits; see
/// [`BlockingQueue`] and [`FailFastQueue`]. Values come out in exactly the
/// order in which their enqueues acquired the queue lock.
pub struct BoundedQueue<T, P: Policy = Blocking> {
    shared: Arc<Shared<T>>,
    _policy: PhantomData<P>,
}

/// A queue whose producers wait while it is full and whose consumers wait
/// while it is empty
///
/// ```
/// use std::sync::Arc;
/// use std::thread;
///
/// use blocking_queue_rs::BlockingQueue;
///
/// let queue = Arc::new(BlockingQueue::new(1));
/// queue.enqueue("a").unwrap();
///
/// let producer = {
///     let queue = Arc::clone(&queue);
///     thread::spawn(move || queue.enqueue("b").unwrap())
/// };
///
/// assert_eq!(queue.dequeue(), Ok("a"));
/// producer.join().unwrap();
/// assert_eq!(queue.dequeue(), Ok("b"));
/// ```
pub type BlockingQueue<T> = BoundedQueue<T, Blocking>;

/// A queue whose operations never wait
///
/// ```
/// use blocking_queue_rs::{EnqueueError, FailFastQueue};
///
/// let queue = FailFastQueue::new(1);
/// queue.enqueue("a").unwrap();
/// assert_eq!(queue.enqueue("b"), Err(EnqueueError::Full("b")));
/// assert_eq!(queue.dequeue(), Some("a"));
/// assert_eq!(queue.dequeue(), None);
/// ```
pub type FailFastQueue<T> = BoundedQueue<T, FailFast>;

/// How long a blocking call may stay parked
#[derive(Clone, Copy)]
enum Wait<'a> {
    /// Until the operation can complete or the queue is closed
    Indefinitely,

    /// Additionally until the token is cancelled
    Cancellable(&'a CancelToken),

    /// Additionally until the deadline passes; `None` is too far to represent
    Until(Option<Instant>),
}

impl Wait<'_> {
    fn for_timeout(timeout: Duration) -> Self {
        Wait::Until(Instant::now().checked_add(timeout))
    }

    fn is_cancelled(&self) -> bool {
        matches!(self, Wait::Cancellable(token) if token.is_cancelled())
    }

    /// Time left before the deadline, if there is one
    fn remaining(&self) -> Option<Duration> {
        match self {
            Wait::Until(Some(deadline)) => Some(deadline.saturating_duration_since(Instant::now())),
            _ => None,
        }
    }
}

impl<T, P: Policy> BoundedQueue<T, P> {
    /// Creates an empty queue that holds at most `capacity` values
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "bounded queue capacity must be greater than zero");
        Self::with_shared(capacity)
    }

    /// Creates an empty queue, rejecting a zero capacity
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::ZeroCapacity`] if `capacity` is zero.
    pub fn try_new(capacity: usize) -> Result<Self, QueueError> {
        if capacity == 0 {
            return Err(QueueError::ZeroCapacity);
        }
        Ok(Self::with_shared(capacity))
    }

    fn with_shared(capacity: usize) -> Self {
        Self {
            shared: Arc::new(Shared::new(capacity)),
            _policy: PhantomData,
        }
    }

    /// Returns the fixed capacity of the queue
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    /// Returns the number of queued values
    ///
    /// The count is read under the queue lock, but other threads may change
    /// it as soon as this returns.
    #[must_use]
    pub fn size(&self) -> usize {
        self.shared.lock().chain.len()
    }

    /// Returns `true` if the queue held no values during this call
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shared.lock().chain.is_empty()
    }

    /// Returns `true` if the queue was at capacity during this call
    #[must_use]
    pub fn is_full(&self) -> bool {
        let state = self.shared.lock();
        self.shared.is_full(&state)
    }

    /// Closes the queue and wakes every waiting producer and consumer
    ///
    /// After closing, enqueues fail with [`EnqueueError::Closed`] while
    /// dequeues keep draining the values already held. Idempotent.
    pub fn close(&self) {
        let mut state = self.shared.lock();
        if state.closed {
            return;
        }
        state.closed = true;
        let remaining = state.chain.len();
        drop(state);

        debug!(remaining, "bounded queue closed");
        self.shared.wake_producers();
        self.shared.wake_consumers();
    }

    /// Returns `true` once [`close`](Self::close) has been called
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.shared.lock().closed
    }

    /// Links `value` as the newest element, waiting for capacity per `wait`
    ///
    /// A fail-fast queue passes `None`, meaning "never wait".
    fn enqueue_inner(&self, value: T, wait: Option<Wait<'_>>) -> Result<(), EnqueueError<T>> {
        // Allocate before taking the lock
        let node = Node::boxed(value);
        let mut state = self.shared.lock();

        loop {
            if state.closed {
                return Err(EnqueueError::Closed(node.into_value()));
            }
            if !self.shared.is_full(&state) {
                break;
            }

            let Some(wait) = wait else {
                return Err(EnqueueError::Full(node.into_value()));
            };
            if wait.is_cancelled() {
                drop(state);
                debug!("enqueue cancelled while waiting for capacity");
                return Err(EnqueueError::Cancelled(node.into_value()));
            }

            trace!(capacity = self.shared.capacity, "enqueue waiting for capacity");
            state = match wait.remaining() {
                None => self.shared.wait_not_full(state),
                Some(remaining) if remaining.is_zero() => {
                    drop(state);
                    debug!("enqueue timed out waiting for capacity");
                    return Err(EnqueueError::TimedOut(node.into_value()));
                }
                Some(remaining) => self.shared.wait_not_full_timeout(state, remaining).0,
            };
        }

        let was_empty = state.chain.is_empty();
        state.chain.push_back(node);
        drop(state);

        if was_empty {
            self.shared.wake_consumers();
        }
        Ok(())
    }

    /// Unlinks the oldest element, waiting for one per `wait`
    ///
    /// Returns `Ok(None)` where a fail-fast queue (`wait == None`) finds
    /// nothing to take.
    fn dequeue_inner(&self, wait: Option<Wait<'_>>) -> Result<Option<T>, DequeueError> {
        let mut state = self.shared.lock();

        loop {
            let was_full = self.shared.is_full(&state);
            if let Some(value) = state.chain.pop_front() {
                drop(state);
                if was_full {
                    self.shared.wake_producers();
                }
                return Ok(Some(value));
            }

            let Some(wait) = wait else {
                return Ok(None);
            };
            if state.closed {
                return Err(DequeueError::Closed);
            }
            if wait.is_cancelled() {
                drop(state);
                debug!("dequeue cancelled while waiting for a value");
                return Err(DequeueError::Cancelled);
            }

            trace!(capacity = self.shared.capacity, "dequeue waiting for a value");
            state = match wait.remaining() {
                None => self.shared.wait_not_empty(state),
                Some(remaining) if remaining.is_zero() => {
                    drop(state);
                    debug!("dequeue timed out waiting for a value");
                    return Err(DequeueError::TimedOut);
                }
                Some(remaining) => self.shared.wait_not_empty_timeout(state, remaining).0,
            };
        }
    }
}

impl<T> BoundedQueue<T, Blocking> {
    /// Inserts `value` as the newest element, waiting while the queue is full
    ///
    /// # Errors
    ///
    /// Returns [`EnqueueError::Closed`] with the value if the queue is closed
    /// before space becomes available.
    pub fn enqueue(&self, value: T) -> Result<(), EnqueueError<T>> {
        self.enqueue_inner(value, Some(Wait::Indefinitely))
    }

    /// Removes and returns the oldest element, waiting while the queue is
    /// empty
    ///
    /// # Errors
    ///
    /// Returns [`DequeueError::Closed`] once the queue is closed and drained.
    pub fn dequeue(&self) -> Result<T, DequeueError> {
        self.dequeue_inner(Some(Wait::Indefinitely))
            .and_then(|value| value.ok_or(DequeueError::Closed))
    }

    /// Like [`enqueue`](Self::enqueue), giving up after `timeout`
    ///
    /// # Errors
    ///
    /// Returns [`EnqueueError::TimedOut`] with the value if no space became
    /// available in time, or [`EnqueueError::Closed`] if the queue is closed.
    pub fn enqueue_timeout(&self, value: T, timeout: Duration) -> Result<(), EnqueueError<T>> {
        self.enqueue_inner(value, Some(Wait::for_timeout(timeout)))
    }

    /// Like [`dequeue`](Self::dequeue), giving up after `timeout`
    ///
    /// # Errors
    ///
    /// Returns [`DequeueError::TimedOut`] if no value arrived in time, or
    /// [`DequeueError::Closed`] if the queue is closed and drained.
    pub fn dequeue_timeout(&self, timeout: Duration) -> Result<T, DequeueError> {
        self.dequeue_inner(Some(Wait::for_timeout(timeout)))
            .and_then(|value| value.ok_or(DequeueError::Closed))
    }
}

impl<T: Send + 'static> BoundedQueue<T, Blocking> {
    /// Like [`enqueue`](Self::enqueue), giving up when `token` is cancelled
    ///
    /// # Errors
    ///
    /// Returns [`EnqueueError::Cancelled`] with the value if the token fires
    /// while the call waits, or [`EnqueueError::Closed`] if the queue is
    /// closed. The queue is unchanged in both cases.
    pub fn enqueue_with(&self, value: T, token: &CancelToken) -> Result<(), EnqueueError<T>> {
        let _registration = token.register(self.interrupt_handle());
        self.enqueue_inner(value, Some(Wait::Cancellable(token)))
    }

    /// Like [`dequeue`](Self::dequeue), giving up when `token` is cancelled
    ///
    /// # Errors
    ///
    /// Returns [`DequeueError::Cancelled`] if the token fires while the call
    /// waits, or [`DequeueError::Closed`] if the queue is closed and drained.
    pub fn dequeue_with(&self, token: &CancelToken) -> Result<T, DequeueError> {
        let _registration = token.register(self.interrupt_handle());
        self.dequeue_inner(Some(Wait::Cancellable(token)))
            .and_then(|value| value.ok_or(DequeueError::Closed))
    }

    fn interrupt_handle(&self) -> Weak<dyn Interrupt> {
        let handle: Weak<Shared<T>> = Arc::downgrade(&self.shared);
        handle
    }
}

impl<T> BoundedQueue<T, FailFast> {
    /// Inserts `value` as the newest element if there is room
    ///
    /// # Errors
    ///
    /// Returns [`EnqueueError::Full`] with the value if the queue is at
    /// capacity, or [`EnqueueError::Closed`] if it is closed.
    pub fn enqueue(&self, value: T) -> Result<(), EnqueueError<T>> {
        self.enqueue_inner(value, None)
    }

    /// Removes and returns the oldest element, or `None` if the queue is
    /// empty
    #[must_use]
    pub fn dequeue(&self) -> Option<T> {
        // Without a wait the inner call cannot fail
        self.dequeue_inner(None).unwrap_or(None)
    }
}

impl<T, P: Policy> fmt::Debug for BoundedQueue<T, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.lock();
        f.debug_struct("BoundedQueue")
            .field("policy", &P::NAME)
            .field("capacity", &self.shared.capacity)
            .field("size", &state.chain.len())
            .field("closed", &state.closed)
            .finish()
    }
}
