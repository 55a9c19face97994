//! Completion accounting for lifecycle assertions.

use parking_lot::Mutex;
use std::sync::Arc;
use xferq_core::{CompletedTransfer, Dir};

/// One observed completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRecord {
    /// Tag given when the completion was registered.
    pub tag: String,
    /// Transfer direction.
    pub dir: Dir,
    /// Bytes transferred when the completion fired.
    pub transferred: usize,
    /// Bytes requested at submission.
    pub requested: usize,
}

impl CompletionRecord {
    /// Returns `true` if the transfer moved every requested byte.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.transferred == self.requested
    }
}

/// Collects completions so tests can assert order and exactly-once
/// delivery.
///
/// Cloning is cheap; clones share the same log, so a recorder can hand
/// out completions across threads and still account centrally.
#[derive(Debug, Clone, Default)]
pub struct CompletionRecorder {
    records: Arc<Mutex<Vec<CompletionRecord>>>,
}

impl CompletionRecorder {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a completion callback that logs under `tag`.
    pub fn on_complete(
        &self,
        tag: impl Into<String>,
    ) -> impl FnOnce(CompletedTransfer) + Send + 'static {
        let tag = tag.into();
        let records = self.records.clone();
        move |done| {
            records.lock().push(CompletionRecord {
                tag,
                dir: done.direction(),
                transferred: done.transferred(),
                requested: done.requested(),
            });
        }
    }

    /// All completions observed so far, in delivery order.
    #[must_use]
    pub fn records(&self) -> Vec<CompletionRecord> {
        self.records.lock().clone()
    }

    /// Tags of all completions, in delivery order.
    #[must_use]
    pub fn tags(&self) -> Vec<String> {
        self.records.lock().iter().map(|r| r.tag.clone()).collect()
    }

    /// Total completions observed.
    #[must_use]
    pub fn count(&self) -> usize {
        self.records.lock().len()
    }

    /// Completions observed under `tag`. Exactly-once tests expect 1.
    #[must_use]
    pub fn count_of(&self, tag: &str) -> usize {
        self.records.lock().iter().filter(|r| r.tag == tag).count()
    }
}
