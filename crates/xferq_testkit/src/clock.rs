//! Hand-driven clock for expiry tests.

use std::sync::atomic::{AtomicU32, Ordering};
use xferq_core::Clock;

/// A [`Clock`] whose time only moves when a test says so.
///
/// Wraps like the real counter, so tests can park it just below the
/// 31-bit rollover and check expiry behavior across the wrap.
#[derive(Debug, Default)]
pub struct MockClock {
    now: AtomicU32,
}

impl MockClock {
    /// Creates a clock starting at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a clock starting at `now` milliseconds.
    #[must_use]
    pub fn starting_at(now: u32) -> Self {
        Self {
            now: AtomicU32::new(now),
        }
    }

    /// Advances the clock by `ms` milliseconds, wrapping on overflow.
    pub fn advance(&self, ms: u32) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }

    /// Jumps the clock to an absolute millisecond value.
    pub fn set(&self, ms: u32) {
        self.now.store(ms, Ordering::SeqCst);
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u32 {
        self.now.load(Ordering::SeqCst)
    }
}
