//! Test fixtures.

use crate::clock::MockClock;
use crate::recorder::CompletionRecorder;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use xferq_core::{Config, TransferQueue};

/// Initializes test logging from `RUST_LOG`, defaulting to `info`.
///
/// Safe to call from every test; only the first call installs a
/// subscriber.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// A transfer queue wired to a [`MockClock`] and a
/// [`CompletionRecorder`].
///
/// Derefs to [`TransferQueue`], so engine calls go straight through the
/// fixture.
pub struct TestQueue {
    /// The queue under test.
    pub queue: TransferQueue,
    /// The clock driving the queue's expiry checks.
    pub clock: Arc<MockClock>,
    /// Shared completion log.
    pub recorder: CompletionRecorder,
}

impl TestQueue {
    /// Creates a fixture with the default configuration and time at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates a fixture with a custom configuration.
    #[must_use]
    pub fn with_config(config: Config) -> Self {
        let clock = Arc::new(MockClock::new());
        Self {
            queue: TransferQueue::with_clock(config, clock.clone()),
            clock,
            recorder: CompletionRecorder::new(),
        }
    }

    /// Creates a fixture with the clock parked at `now` milliseconds.
    #[must_use]
    pub fn starting_at(now: u32) -> Self {
        let clock = Arc::new(MockClock::starting_at(now));
        Self {
            queue: TransferQueue::with_clock(Config::default(), clock.clone()),
            clock,
            recorder: CompletionRecorder::new(),
        }
    }
}

impl Default for TestQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Deref for TestQueue {
    type Target = TransferQueue;

    fn deref(&self) -> &Self::Target {
        &self.queue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use xferq_core::{Dir, PurgeMode, Timeout};
    use std::time::Duration;

    #[test]
    fn fixture_clock_drives_expiry() {
        let fixture = TestQueue::new();
        fixture
            .submit_write_with(
                Bytes::from_static(b"x"),
                Timeout::After(Duration::from_millis(10)),
                fixture.recorder.on_complete("t"),
            )
            .unwrap();

        fixture.clock.advance(11);
        assert_eq!(fixture.purge(Dir::Tx, PurgeMode::Expired), 1);
        assert_eq!(fixture.recorder.count_of("t"), 1);
    }
}
