//! # blocking_queue_rs
//!
//! A bounded multiple-producer-multiple-consumer FIFO queue built from a
//! single mutex and two condition variables.
//!
//! Producers wait while the queue is full and consumers wait while it is
//! empty, without spinning and without holding the lock while parked. The
//! behaviour at the capacity limits is chosen per queue through a policy type:
//!
//! - [`BlockingQueue`] waits, with cancellable ([`CancelToken`]) and timed
//!   variants of both operations.
//! - [`FailFastQueue`] never waits: a full queue rejects the value with
//!   [`EnqueueError::Full`] and an empty queue yields `None`.
//!
//! ```
//! use std::sync::Arc;
//! use std::thread;
//!
//! use blocking_queue_rs::BlockingQueue;
//!
//! let queue = Arc::new(BlockingQueue::new(8));
//!
//! let producer = {
//!     let queue = Arc::clone(&queue);
//!     thread::spawn(move || {
//!         for n in 0..100u32 {
//!             queue.enqueue(n).unwrap();
//!         }
//!     })
//! };
//!
//! let sum: u32 = (0..100).map(|_| queue.dequeue().unwrap()).sum();
//! producer.join().unwrap();
//! assert_eq!(sum, 4950);
//! ```

mod common;
mod node;

pub mod bounded_queue;
pub mod cancel;
pub mod error;

// Re-exports for convenience
pub use bounded_queue::{BlockingQueue, BoundedQueue, FailFastQueue};
pub use cancel::CancelToken;
pub use common::{Blocking, FailFast, Policy};
pub use error::{DequeueError, EnqueueError, QueueError};
