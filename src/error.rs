//! Error types for queue construction and queue operations

use std::fmt;

use thiserror::Error;

/// Errors raised when a queue cannot be constructed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QueueError {
    /// The requested capacity was zero.
    #[error("queue capacity must be greater than zero")]
    ZeroCapacity,
}

/// Reasons an enqueue did not insert its value
///
/// Every variant hands the rejected value back to the caller, and in every
/// case the queue is left exactly as it was before the call.
#[derive(Clone, Copy, PartialEq, Eq, Error)]
pub enum EnqueueError<T> {
    /// The queue was at capacity and the policy does not wait.
    #[error("queue is full")]
    Full(T),

    /// The cancel token fired while the call was waiting for capacity.
    #[error("enqueue was cancelled while waiting for capacity")]
    Cancelled(T),

    /// The timeout elapsed before capacity became available.
    #[error("timed out waiting for queue capacity")]
    TimedOut(T),

    /// The queue has been closed.
    #[error("queue is closed")]
    Closed(T),
}

impl<T> EnqueueError<T> {
    /// Returns the value that failed to be enqueued
    #[must_use]
    pub fn into_inner(self) -> T {
        match self {
            Self::Full(value)
            | Self::Cancelled(value)
            | Self::TimedOut(value)
            | Self::Closed(value) => value,
        }
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        matches!(self, Self::Full(_))
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }

    #[must_use]
    pub fn is_timed_out(&self) -> bool {
        matches!(self, Self::TimedOut(_))
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed(_))
    }
}

// Written by hand so that the error stays usable when `T` is not `Debug`.
impl<T> fmt::Debug for EnqueueError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full(_) => f.pad("Full(..)"),
            Self::Cancelled(_) => f.pad("Cancelled(..)"),
            Self::TimedOut(_) => f.pad("TimedOut(..)"),
            Self::Closed(_) => f.pad("Closed(..)"),
        }
    }
}

/// Reasons a blocking dequeue returned without a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DequeueError {
    /// The cancel token fired while the call was waiting for a value.
    #[error("dequeue was cancelled while waiting for a value")]
    Cancelled,

    /// The timeout elapsed before a value arrived.
    #[error("timed out waiting for a queued value")]
    TimedOut,

    /// The queue has been closed and every remaining value was drained.
    #[error("queue is closed and empty")]
    Closed,
}
