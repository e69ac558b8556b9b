//! # Core Error Types

use thiserror::Error;

/// Errors raised by the core containers.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    /// `dequeue` or `peek` was called on an empty queue.
    #[error("priority queue is empty")]
    Empty,
}

/// Result type for queue operations.
pub type QueueResult<T> = Result<T, QueueError>;
