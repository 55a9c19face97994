//! # xferq Core
//!
//! Transport-agnostic asynchronous transfer-queue engine.
//!
//! xferq schedules byte-buffer transfers (writes and reads) over any
//! physical interface (serial, radio, socket) the way a DMA engine
//! does: the owner hands a buffer over, the transfer is queued, a backend
//! adapter moves the bytes (possibly in fragments), and buffer ownership
//! returns exactly once through a completion.
//!
//! This crate provides:
//! - [`TransferQueue`], the engine: per-direction FIFO queues, a single
//!   active slot per direction, partial-progress commits, expiry purge,
//!   flush, and cancellation
//! - [`Clock`] and [`Timeout`]/[`Deadline`], wrapping 31-bit millisecond
//!   time with wraparound-safe expiry
//! - [`SectionKind`], the critical-section strategy injected at
//!   construction
//! - [`CompletedTransfer`] and [`PendingCompletion`], the exactly-once
//!   ownership handoff back to the caller
//!
//! The engine performs no I/O, never retries, never reorders, and never
//! bounds queue depth; backends and flow control live with the caller.
//!
//! ## Example
//!
//! ```rust
//! use bytes::Bytes;
//! use xferq_core::{
//!     Chunk, CommitOptions, Config, Dir, Progress, Timeout, TransferQueue,
//! };
//!
//! let queue = TransferQueue::new(Config::default());
//! queue
//!     .submit_write(Bytes::from_static(b"hello"), Timeout::Never)
//!     .unwrap();
//!
//! // Backend side: load the next chunk, move its bytes, commit progress.
//! if let Some(Chunk::Write { data, .. }) = queue.load_next(Dir::Tx) {
//!     let sent = data.len(); // pretend the transport took everything
//!     queue
//!         .commit(Progress::Sent(sent), CommitOptions::new())
//!         .unwrap();
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod queue;
mod section;
pub mod time;
mod transfer;

pub use config::Config;
pub use error::{QueueError, QueueResult};
pub use queue::{
    Chunk, CommitOptions, CommitOutcome, Delivery, PendingCompletion, Progress, PurgeMode,
    TransferHandle, TransferQueue,
};
pub use section::SectionKind;
pub use time::{Clock, Deadline, SystemClock, Timeout, TIME_MASK};
pub use transfer::{CompletedTransfer, Dir, Payload, MAX_TRANSFER_LEN};
