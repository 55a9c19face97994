//! Millisecond clock collaborator and wraparound-safe deadlines.
//!
//! Timestamps use 31 significant bits of a wrapping millisecond counter.
//! Bit 31 of a stored deadline is reserved to mean "never expires". The
//! comparison below stays correct across counter wraparound as long as the
//! true time difference never exceeds 2^30 ms (about 12.4 days); that is an
//! operating assumption of the engine, not something the code enforces.

use std::time::{Duration, Instant};

/// Mask selecting the 31 significant timestamp bits.
pub const TIME_MASK: u32 = 0x7FFF_FFFF;

/// Bit 31 set on a deadline means "never expires".
const NEVER_BIT: u32 = 0x8000_0000;

/// A monotonic millisecond counter.
///
/// The engine only ever reads the clock and masks the value to 31 bits;
/// implementations are free to wrap silently. Injected at queue
/// construction so tests can drive time by hand.
pub trait Clock: Send + Sync {
    /// Milliseconds since an arbitrary epoch, wrapping on overflow.
    fn now_ms(&self) -> u32;
}

/// Default clock backed by [`Instant`].
#[derive(Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Creates a clock whose epoch is "now".
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u32 {
        self.origin.elapsed().as_millis() as u32
    }
}

/// How long a queued transfer may wait before a purge removes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeout {
    /// The transfer never expires.
    Never,
    /// The transfer expires this long after submission.
    ///
    /// A zero duration means no timeout at all, matching `Never`.
    /// Durations beyond the 31-bit millisecond range are not supported.
    After(Duration),
}

impl Timeout {
    /// Resolves the timeout against the current 31-bit time.
    #[must_use]
    pub fn deadline(&self, now: u32) -> Deadline {
        match self {
            Timeout::Never => Deadline::NEVER,
            Timeout::After(d) if d.is_zero() => Deadline::NEVER,
            Timeout::After(d) => Deadline::at(now.wrapping_add(d.as_millis() as u32)),
        }
    }
}

/// A wraparound-safe expiry deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline(u32);

impl Deadline {
    /// A deadline that never passes.
    pub const NEVER: Self = Self(NEVER_BIT);

    /// Creates a deadline at an absolute 31-bit millisecond timestamp.
    #[must_use]
    pub fn at(expiry: u32) -> Self {
        Self(expiry & TIME_MASK)
    }

    /// Returns `true` if this deadline can never pass.
    #[must_use]
    pub fn is_never(&self) -> bool {
        self.0 & NEVER_BIT != 0
    }

    /// Returns `true` if the deadline has passed at 31-bit time `now`.
    ///
    /// Shifting the wrapped difference left by one moves the 31st
    /// significant bit into the sign position; a negative signed result
    /// means the deadline lies in the past half of the timestamp circle.
    #[must_use]
    pub fn has_passed(&self, now: u32) -> bool {
        if self.is_never() {
            return false;
        }
        let diff = self.0.wrapping_sub(now & TIME_MASK);
        ((diff << 1) as i32) < 0
    }
}
