//! # xferq Testkit
//!
//! Test utilities for xferq.
//!
//! This crate provides:
//! - A hand-driven [`MockClock`] for expiry tests
//! - A [`CompletionRecorder`] for exactly-once accounting
//! - The [`TestQueue`] fixture bundling a queue, mock clock, and recorder
//! - Property-based generator strategies using proptest
//! - Scripted backend drivers that drain the queue in chosen chunk sizes
//!
//! ## Usage
//!
//! ```rust
//! use bytes::Bytes;
//! use xferq_core::Timeout;
//! use xferq_testkit::prelude::*;
//!
//! let fixture = TestQueue::new();
//! fixture
//!     .submit_write_with(
//!         Bytes::from_static(b"hello"),
//!         Timeout::Never,
//!         fixture.recorder.on_complete("hello"),
//!     )
//!     .unwrap();
//! drive_writes(&fixture, &[2]);
//! assert_eq!(fixture.recorder.tags(), vec!["hello"]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod clock;
pub mod driver;
pub mod fixtures;
pub mod generators;
pub mod recorder;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::clock::*;
    pub use crate::driver::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::recorder::*;
}

pub use clock::MockClock;
pub use driver::{drive_reads, drive_writes};
pub use fixtures::{init_logging, TestQueue};
pub use recorder::{CompletionRecord, CompletionRecorder};
