//! Error types for the xferq engine.

use crate::transfer::Dir;
use thiserror::Error;

/// Result type for queue operations.
pub type QueueResult<T> = Result<T, QueueError>;

/// Errors reported by queue operations.
///
/// These cover caller misuse only; misuse is always recoverable and the
/// rejected operation is a no-op. Invariant violations (progress past the
/// requested length, corrupted links) are programming errors and panic
/// instead; they indicate state that cannot safely be continued past.
/// Transport-level failures are not errors at all: they surface through a
/// completion whose transferred count is short of the requested length.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    /// The queue has been closed; the operation did not touch any state.
    #[error("transfer queue is closed")]
    Closed,

    /// The submitted payload or requested length is zero.
    #[error("transfer length must be non-zero")]
    EmptyTransfer,

    /// The requested length does not fit the 16-bit progress counter.
    #[error("transfer length {len} exceeds the maximum of {max} bytes")]
    TransferTooLarge {
        /// Requested length in bytes.
        len: usize,
        /// Maximum supported length.
        max: usize,
    },

    /// A commit arrived with no transfer loaded for that direction.
    #[error("no active {dir:?} transfer to commit")]
    NoActiveTransfer {
        /// The direction the commit addressed.
        dir: Dir,
    },
}
