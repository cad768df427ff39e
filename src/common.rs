//! Common functionality for bounded queues
//!
//! This module provides the synchronized state shared by every queue policy:
//! the element chain behind a single mutex, and the two wait conditions that
//! producers and consumers park on. It also defines the policy markers that
//! select how a queue behaves at its capacity limits.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crossbeam_utils::CachePadded;
use tracing::warn;

use crate::cancel::Interrupt;
use crate::node::Chain;

/// Everything guarded by the queue lock
pub(crate) struct State<T> {
    /// Queued values, oldest first
    pub chain: Chain<T>,

    /// Set once by `close`; never cleared
    pub closed: bool,
}

/// Guard and timed-out flag returned by a timed wait
pub(crate) type TimedWait<'a, T> = (MutexGuard<'a, State<T>>, bool);

/// Shared state of a bounded queue
pub(crate) struct Shared<T> {
    /// The one lock protecting the chain, its count and the closed flag
    state: Mutex<State<T>>,

    /// Producers wait here while the queue is full
    ///
    /// Padded so that producer and consumer wait queues never share a line
    not_full: CachePadded<Condvar>,

    /// Consumers wait here while the queue is empty
    not_empty: CachePadded<Condvar>,

    /// Fixed bound on the number of queued values
    pub capacity: usize,
}

impl<T> Shared<T> {
    /// Creates empty shared state; `capacity` must already be validated
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0);
        Self {
            state: Mutex::new(State {
                chain: Chain::new(),
                closed: false,
            }),
            not_full: CachePadded::new(Condvar::new()),
            not_empty: CachePadded::new(Condvar::new()),
            capacity,
        }
    }

    /// Acquires the queue lock
    ///
    /// Poisoning is recovered: no code path can panic while the chain is
    /// half-linked, so the state behind a poisoned lock is still consistent.
    #[inline]
    pub fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(|poisoned| {
            warn!("recovering bounded queue lock poisoned by a panicked thread");
            poisoned.into_inner()
        })
    }

    #[inline]
    pub fn is_full(&self, state: &State<T>) -> bool {
        state.chain.len() >= self.capacity
    }

    /// Parks until a consumer frees capacity
    #[inline]
    pub fn wait_not_full<'a>(&self, guard: MutexGuard<'a, State<T>>) -> MutexGuard<'a, State<T>> {
        self.not_full.wait(guard).unwrap_or_else(PoisonError::into_inner)
    }

    /// Parks until a producer supplies a value
    #[inline]
    pub fn wait_not_empty<'a>(&self, guard: MutexGuard<'a, State<T>>) -> MutexGuard<'a, State<T>> {
        self.not_empty.wait(guard).unwrap_or_else(PoisonError::into_inner)
    }

    /// Parks until a consumer frees capacity or `timeout` elapses
    #[inline]
    pub fn wait_not_full_timeout<'a>(
        &self,
        guard: MutexGuard<'a, State<T>>,
        timeout: Duration,
    ) -> TimedWait<'a, T> {
        let (guard, result) = self
            .not_full
            .wait_timeout(guard, timeout)
            .unwrap_or_else(PoisonError::into_inner);
        (guard, result.timed_out())
    }

    /// Parks until a producer supplies a value or `timeout` elapses
    #[inline]
    pub fn wait_not_empty_timeout<'a>(
        &self,
        guard: MutexGuard<'a, State<T>>,
        timeout: Duration,
    ) -> TimedWait<'a, T> {
        let (guard, result) = self
            .not_empty
            .wait_timeout(guard, timeout)
            .unwrap_or_else(PoisonError::into_inner);
        (guard, result.timed_out())
    }

    /// Wakes every producer waiting for capacity
    #[inline]
    pub fn wake_producers(&self) {
        self.not_full.notify_all();
    }

    /// Wakes every consumer waiting for a value
    #[inline]
    pub fn wake_consumers(&self) {
        self.not_empty.notify_all();
    }
}

impl<T: Send> Interrupt for Shared<T> {
    fn interrupt(&self) {
        // Taking the lock orders this wakeup after any waiter that already
        // checked its token: such a waiter holds the lock until it is parked.
        drop(self.lock());
        self.wake_producers();
        self.wake_consumers();
    }
}

mod sealed {
    pub trait Sealed {}
}

/// Behaviour of a queue when an operation cannot complete immediately
///
/// The policy is fixed per queue instance through a type parameter, so a
/// single queue never mixes waiting and failing semantics.
pub trait Policy: sealed::Sealed + Send + Sync + 'static {
    /// Name reported by `Debug` output
    const NAME: &'static str;
}

/// Producers wait while the queue is full, consumers wait while it is empty
///
/// Waiting can be cut short by a [`CancelToken`](crate::CancelToken), a
/// timeout, or [`close`](crate::BoundedQueue::close).
#[derive(Debug)]
pub enum Blocking {}

/// Enqueue on a full queue fails at once, dequeue on an empty queue
/// returns `None`
#[derive(Debug)]
pub enum FailFast {}

impl sealed::Sealed for Blocking {}
impl sealed::Sealed for FailFast {}

impl Policy for Blocking {
    const NAME: &'static str = "Blocking";
}

impl Policy for FailFast {
    const NAME: &'static str = "FailFast";
}
