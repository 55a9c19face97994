//! The transfer-queue engine.
//!
//! A [`TransferQueue`] schedules byte-buffer transfers over any physical
//! interface, modeling a DMA engine: the owner hands a buffer over, it is
//! queued, eventually moved (possibly in fragments) by a backend adapter,
//! and ownership returns exactly once through a completion.
//!
//! The engine performs no I/O itself. A backend drives it in three steps:
//! [`load_next`](TransferQueue::load_next) to obtain the next chunk,
//! the physical transfer, then [`commit`](TransferQueue::commit) with the
//! byte count actually moved. [`flush_active`](TransferQueue::flush_active)
//! and [`purge`](TransferQueue::purge) guarantee no transfer is silently
//! abandoned on error, timeout, or shutdown.
//!
//! ## Lifecycle guarantees
//!
//! - A transfer resides in exactly one place at any instant: a direction's
//!   queue, that direction's single active slot, or back with its owner.
//! - Its completion fires exactly once, whether it completed by commit,
//!   flush, purge, cancel, or close.
//! - Within one direction, completions follow submission order; the two
//!   directions are independent.
//! - No operation blocks waiting for queue space or transfer completion,
//!   and completions always run outside the critical section, so
//!   completion code may re-enter the engine freely.

use crate::config::Config;
use crate::error::{QueueError, QueueResult};
use crate::section::SectionLock;
use crate::time::{Clock, SystemClock, Timeout, TIME_MASK};
use crate::transfer::{
    CompletedTransfer, CompletionFn, Dir, Payload, Transfer, MAX_TRANSFER_LEN,
};
use bytes::{Bytes, BytesMut};
use std::sync::Arc;
use tracing::{debug, trace};
use xferq_list::{Arena, Key, LinkList};

/// Stable handle to a submitted transfer.
///
/// Handles outlive the transfer harmlessly: once the transfer completes
/// and its slot is recycled, the handle stops matching and operations
/// taking it report "not found".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransferHandle(Key);

/// The next piece of work for a backend, returned by
/// [`TransferQueue::load_next`].
#[derive(Debug)]
pub enum Chunk {
    /// Outgoing bytes still to transmit.
    Write {
        /// Handle of the active transfer.
        handle: TransferHandle,
        /// Remaining bytes, starting at the current progress offset.
        /// A cheap reference-counted view; nothing is copied.
        data: Bytes,
    },
    /// Capacity still to fill on an incoming transfer.
    Read {
        /// Handle of the active transfer.
        handle: TransferHandle,
        /// Bytes still expected.
        remaining: usize,
    },
}

/// Progress reported by a backend when committing.
#[derive(Debug, Clone, Copy)]
pub enum Progress<'a> {
    /// This many outgoing bytes were transmitted.
    Sent(usize),
    /// These bytes were received; the engine appends them to the incoming
    /// buffer.
    Received(&'a [u8]),
}

impl Progress<'_> {
    fn dir(&self) -> Dir {
        match self {
            Progress::Sent(_) => Dir::Tx,
            Progress::Received(_) => Dir::Rx,
        }
    }

    fn len(&self) -> usize {
        match self {
            Progress::Sent(n) => *n,
            Progress::Received(data) => data.len(),
        }
    }
}

/// Who runs the completion when a commit finishes a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Delivery {
    /// The engine invokes the completion (outside the section) before
    /// returning. The common case.
    #[default]
    Engine,
    /// The commit returns a [`PendingCompletion`] token and the caller
    /// invokes it, for backends that must tear down transport
    /// state between clearing the active slot and notifying the owner.
    Caller,
}

/// Options for [`TransferQueue::commit`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CommitOptions {
    /// Who delivers the completion if this commit finishes the transfer.
    pub delivery: Delivery,
    /// Complete the transfer now even if progress is short of the
    /// requested length.
    pub finalize: bool,
}

impl CommitOptions {
    /// Default options: engine-delivered completion, no early finish.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets who delivers the completion.
    #[must_use]
    pub const fn delivery(mut self, delivery: Delivery) -> Self {
        self.delivery = delivery;
        self
    }

    /// Forces completion at this commit regardless of progress.
    #[must_use]
    pub const fn finalize(mut self, finalize: bool) -> Self {
        self.finalize = finalize;
        self
    }
}

/// Result of a [`commit`](TransferQueue::commit).
pub enum CommitOutcome {
    /// The transfer stays active with this much progress.
    InProgress {
        /// Total bytes transferred so far.
        transferred: usize,
    },
    /// The transfer completed and the engine delivered its completion.
    Completed,
    /// The transfer completed; the caller owns delivery.
    Deferred(PendingCompletion),
}

/// A completed transfer whose completion has not yet been delivered.
///
/// Move-only: [`invoke`](Self::invoke) consumes the token, so delivery
/// cannot happen twice. Dropping the token without invoking it still
/// releases the payload, but skips the owner's callback. Invoke it.
#[must_use = "the owner is not notified until this token is invoked"]
pub struct PendingCompletion {
    transfer: CompletedTransfer,
    completion: Option<CompletionFn>,
}

impl PendingCompletion {
    /// The finished transfer's direction.
    #[must_use]
    pub fn direction(&self) -> Dir {
        self.transfer.direction()
    }

    /// Bytes transferred by the time the transfer completed.
    #[must_use]
    pub fn transferred(&self) -> usize {
        self.transfer.transferred()
    }

    /// Delivers the completion to the owner.
    pub fn invoke(self) {
        if let Some(complete) = self.completion {
            complete(self.transfer);
        }
    }
}

impl std::fmt::Debug for PendingCompletion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingCompletion")
            .field("transfer", &self.transfer)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for CommitOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InProgress { transferred } => f
                .debug_struct("InProgress")
                .field("transferred", transferred)
                .finish(),
            Self::Completed => f.write_str("Completed"),
            Self::Deferred(pending) => f.debug_tuple("Deferred").field(pending).finish(),
        }
    }
}

/// Which queued transfers a [`purge`](TransferQueue::purge) removes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurgeMode {
    /// Only transfers whose deadline has passed.
    Expired,
    /// Every transfer, expired or not.
    All,
}

struct State {
    closed: bool,
    slots: Arena<Transfer>,
    queues: [LinkList; 2],
    active: [Option<Key>; 2],
}

/// Transport-agnostic transaction queue with one active transfer per
/// direction.
///
/// See the [module docs](self) for the lifecycle and ordering guarantees.
/// All methods take `&self` and are safe to call from multiple threads;
/// internal state is guarded by the critical-section strategy chosen in
/// [`Config`].
pub struct TransferQueue {
    state: SectionLock<State>,
    clock: Arc<dyn Clock>,
}

impl TransferQueue {
    /// Builds a queue with the default [`SystemClock`].
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self::with_clock(config, Arc::new(SystemClock::new()))
    }

    /// Builds a queue with an injected clock.
    #[must_use]
    pub fn with_clock(config: Config, clock: Arc<dyn Clock>) -> Self {
        let state = State {
            closed: false,
            slots: Arena::with_capacity(config.initial_capacity),
            queues: [LinkList::new(), LinkList::new()],
            active: [None, None],
        };
        Self {
            state: SectionLock::new(config.section, state),
            clock,
        }
    }

    /// Queues an outgoing transfer; the payload is dropped on completion.
    ///
    /// Never blocks: the transfer is linked to the back of the TX queue
    /// and the call returns.
    ///
    /// # Errors
    ///
    /// [`QueueError::EmptyTransfer`] for empty payloads,
    /// [`QueueError::TransferTooLarge`] past [`MAX_TRANSFER_LEN`], and
    /// [`QueueError::Closed`] after [`close`](Self::close).
    pub fn submit_write(&self, data: Bytes, timeout: Timeout) -> QueueResult<TransferHandle> {
        let requested = data.len();
        self.submit(Dir::Tx, Payload::Outgoing(data), requested, timeout, None)
    }

    /// Queues an outgoing transfer with a completion callback.
    ///
    /// The completion receives the payload back with the final progress
    /// count, exactly once, whatever path ends the transfer.
    ///
    /// # Errors
    ///
    /// Same as [`submit_write`](Self::submit_write).
    pub fn submit_write_with(
        &self,
        data: Bytes,
        timeout: Timeout,
        on_complete: impl FnOnce(CompletedTransfer) + Send + 'static,
    ) -> QueueResult<TransferHandle> {
        let requested = data.len();
        self.submit(
            Dir::Tx,
            Payload::Outgoing(data),
            requested,
            timeout,
            Some(Box::new(on_complete)),
        )
    }

    /// Queues an incoming transfer expecting `length` bytes into `buffer`.
    ///
    /// Received bytes are appended to the buffer as the backend commits
    /// them; the buffer (with whatever arrived) is dropped on completion.
    ///
    /// # Errors
    ///
    /// Same as [`submit_write`](Self::submit_write), with `length`
    /// validated instead of the payload size.
    pub fn submit_read(
        &self,
        buffer: BytesMut,
        length: usize,
        timeout: Timeout,
    ) -> QueueResult<TransferHandle> {
        self.submit(Dir::Rx, Payload::Incoming(buffer), length, timeout, None)
    }

    /// Queues an incoming transfer with a completion callback.
    ///
    /// # Errors
    ///
    /// Same as [`submit_read`](Self::submit_read).
    pub fn submit_read_with(
        &self,
        buffer: BytesMut,
        length: usize,
        timeout: Timeout,
        on_complete: impl FnOnce(CompletedTransfer) + Send + 'static,
    ) -> QueueResult<TransferHandle> {
        self.submit(
            Dir::Rx,
            Payload::Incoming(buffer),
            length,
            timeout,
            Some(Box::new(on_complete)),
        )
    }

    fn submit(
        &self,
        dir: Dir,
        payload: Payload,
        requested: usize,
        timeout: Timeout,
        completion: Option<CompletionFn>,
    ) -> QueueResult<TransferHandle> {
        if requested == 0 {
            return Err(QueueError::EmptyTransfer);
        }
        if requested > MAX_TRANSFER_LEN {
            return Err(QueueError::TransferTooLarge {
                len: requested,
                max: MAX_TRANSFER_LEN,
            });
        }

        let deadline = timeout.deadline(self.now());
        let handle = self.state.with(|s| {
            if s.closed {
                return Err(QueueError::Closed);
            }
            let key = s.slots.insert(Transfer::new(
                dir,
                payload,
                requested as u16,
                deadline,
                completion,
            ));
            s.queues[dir.index()].push_back(&mut s.slots, key);
            Ok(TransferHandle(key))
        })?;

        trace!(?dir, requested, "transfer queued");
        Ok(handle)
    }

    /// Returns the chunk the backend should transfer next, promoting the
    /// queue head into the active slot when none is active.
    ///
    /// Progress resets to zero on promotion. While a transfer is active
    /// this keeps returning its remaining chunk; only one transfer is ever
    /// active per direction. Returns `None` when nothing is queued or the
    /// queue is closed.
    pub fn load_next(&self, dir: Dir) -> Option<Chunk> {
        let chunk = self.state.with(|s| {
            if s.closed {
                return None;
            }
            let i = dir.index();
            if s.active[i].is_none() {
                let key = s.queues[i].pop_front(&mut s.slots)?;
                if let Some(t) = s.slots.get_mut(key) {
                    t.transferred = 0;
                }
                s.active[i] = Some(key);
            }
            let key = s.active[i]?;
            let t = s.slots.get(key)?;
            Some(match &t.payload {
                Payload::Outgoing(data) => Chunk::Write {
                    handle: TransferHandle(key),
                    data: data.slice(usize::from(t.transferred)..usize::from(t.requested)),
                },
                Payload::Incoming(_) => Chunk::Read {
                    handle: TransferHandle(key),
                    remaining: t.remaining(),
                },
            })
        });

        if chunk.is_some() {
            trace!(?dir, "transfer loaded");
        }
        chunk
    }

    /// Advances the active transfer for the progress's direction.
    ///
    /// Completion triggers when progress reaches the requested length or
    /// `opts.finalize` is set. On completion the active slot is cleared
    /// inside the section and the completion is delivered outside it,
    /// either by the engine or, with [`Delivery::Caller`], through the
    /// returned [`PendingCompletion`]. No transfer is active for the
    /// direction afterwards until [`load_next`](Self::load_next) runs
    /// again.
    ///
    /// # Errors
    ///
    /// [`QueueError::NoActiveTransfer`] when nothing is loaded for the
    /// direction, [`QueueError::Closed`] after close.
    ///
    /// # Panics
    ///
    /// Panics if the commit would push progress past the requested length;
    /// that can only mean the backend and engine disagree about the
    /// transfer and the state is no longer trustworthy.
    pub fn commit(&self, progress: Progress<'_>, opts: CommitOptions) -> QueueResult<CommitOutcome> {
        let dir = progress.dir();
        let len = progress.len();

        enum Committed {
            InProgress(usize),
            Done(CompletedTransfer, Option<CompletionFn>),
        }

        let committed = self.state.with(|s| {
            if s.closed {
                return Err(QueueError::Closed);
            }
            let i = dir.index();
            let key = s.active[i].ok_or(QueueError::NoActiveTransfer { dir })?;
            let Some(t) = s.slots.get_mut(key) else {
                panic!("active transfer is missing from the arena; queue state is corrupt");
            };

            let advanced = usize::from(t.transferred) + len;
            assert!(
                advanced <= usize::from(t.requested),
                "commit of {len} bytes pushes progress to {advanced}, past the requested {}",
                t.requested
            );
            if let Progress::Received(data) = progress {
                match &mut t.payload {
                    Payload::Incoming(buffer) => buffer.extend_from_slice(data),
                    Payload::Outgoing(_) => {
                        panic!("received bytes committed to an outgoing transfer; queue state is corrupt")
                    }
                }
            }
            t.transferred = advanced as u16;

            if !opts.finalize && t.transferred < t.requested {
                return Ok(Committed::InProgress(advanced));
            }

            s.active[i] = None;
            let Some(t) = s.slots.remove(key) else {
                panic!("active transfer is missing from the arena; queue state is corrupt");
            };
            let (transfer, completion) = t.into_completed();
            Ok(Committed::Done(transfer, completion))
        })?;

        match committed {
            Committed::InProgress(transferred) => {
                trace!(?dir, len, transferred, "transfer progressed");
                Ok(CommitOutcome::InProgress { transferred })
            }
            Committed::Done(transfer, completion) => {
                trace!(?dir, transferred = transfer.transferred(), "transfer completed");
                match opts.delivery {
                    Delivery::Engine => {
                        if let Some(complete) = completion {
                            complete(transfer);
                        }
                        Ok(CommitOutcome::Completed)
                    }
                    Delivery::Caller => Ok(CommitOutcome::Deferred(PendingCompletion {
                        transfer,
                        completion,
                    })),
                }
            }
        }
    }

    /// Unconditionally completes the active transfer, if any.
    ///
    /// The completion observes whatever progress the transfer had; its
    /// shortfall against the requested length tells the owner the
    /// transfer was aborted. Returns `true` if something was flushed.
    /// Queued transfers are untouched.
    pub fn flush_active(&self, dir: Dir) -> bool {
        let taken = self.state.with(|s| {
            if s.closed {
                return None;
            }
            let key = s.active[dir.index()].take()?;
            s.slots.remove(key).map(Transfer::into_completed)
        });

        match taken {
            Some((transfer, completion)) => {
                debug!(?dir, transferred = transfer.transferred(), "active transfer flushed");
                if let Some(complete) = completion {
                    complete(transfer);
                }
                true
            }
            None => false,
        }
    }

    /// Removes expired (or, with [`PurgeMode::All`], every) queued
    /// transfer for a direction, delivering each completion.
    ///
    /// The queue is filtered in a single pass inside the section:
    /// survivors are re-appended in their original order, so per-direction
    /// FIFO is preserved even against concurrent submissions. An expired
    /// active transfer is flushed as well. All completions run after the
    /// section is released, never while the lock is held, so a completion
    /// that re-enters the engine cannot deadlock. Returns the number of
    /// transfers completed.
    pub fn purge(&self, dir: Dir, mode: PurgeMode) -> usize {
        let now = self.now();
        let mut finished: Vec<(CompletedTransfer, Option<CompletionFn>)> = Vec::new();

        self.state.with(|s| {
            if s.closed {
                return;
            }
            let i = dir.index();

            // The active transfer sits ahead of the queue in FIFO order,
            // so it is collected first.
            if let Some(key) = s.active[i] {
                let expired = mode == PurgeMode::All
                    || s.slots.get(key).is_some_and(|t| t.deadline.has_passed(now));
                if expired {
                    s.active[i] = None;
                    if let Some(t) = s.slots.remove(key) {
                        finished.push(t.into_completed());
                    }
                }
            }

            let mut survivors = LinkList::new();
            while let Some(key) = s.queues[i].pop_front(&mut s.slots) {
                let expired = mode == PurgeMode::All
                    || s.slots.get(key).is_some_and(|t| t.deadline.has_passed(now));
                if expired {
                    if let Some(t) = s.slots.remove(key) {
                        finished.push(t.into_completed());
                    }
                } else {
                    survivors.push_back(&mut s.slots, key);
                }
            }
            s.queues[i] = survivors;
        });

        let count = finished.len();
        if count > 0 {
            debug!(?dir, ?mode, count, "transfers purged");
        }
        for (transfer, completion) in finished {
            if let Some(complete) = completion {
                complete(transfer);
            }
        }
        count
    }

    /// Cancels one queued transfer, delivering its completion with zero
    /// progress.
    ///
    /// Returns `false` for stale handles and for transfers that already
    /// went active; an in-flight transfer can only be stopped with
    /// [`flush_active`](Self::flush_active).
    pub fn cancel(&self, handle: TransferHandle) -> bool {
        let taken = self.state.with(|s| {
            if s.closed {
                return None;
            }
            let key = handle.0;
            let dir = s.slots.get(key)?.dir;
            if s.active[dir.index()] == Some(key) {
                return None;
            }
            if !s.queues[dir.index()].unlist(&mut s.slots, key) {
                return None;
            }
            s.slots.remove(key).map(|t| (dir, t.into_completed()))
        });

        match taken {
            Some((dir, (transfer, completion))) => {
                debug!(?dir, "queued transfer cancelled");
                if let Some(complete) = completion {
                    complete(transfer);
                }
                true
            }
            None => false,
        }
    }

    /// Adds `additional` free transfer slots to the pool.
    ///
    /// That many submissions are then guaranteed allocation-free.
    pub fn reserve(&self, additional: usize) {
        self.state.with(|s| {
            if !s.closed {
                s.slots.reserve(additional);
            }
        });
    }

    /// Closes the queue, completing every outstanding transfer.
    ///
    /// Marks the queue invalid first, inside the section, so concurrent
    /// operations racing the teardown become no-ops; then delivers every
    /// completion (actives first, then queued in order) outside it.
    /// Idempotent. Returns the number of transfers completed. Dropping the
    /// queue closes it, so completions are never silently lost.
    pub fn close(&self) -> usize {
        let mut finished: Vec<(CompletedTransfer, Option<CompletionFn>)> = Vec::new();

        self.state.with(|s| {
            if s.closed {
                return;
            }
            s.closed = true;
            for i in 0..s.active.len() {
                if let Some(key) = s.active[i].take() {
                    if let Some(t) = s.slots.remove(key) {
                        finished.push(t.into_completed());
                    }
                }
                while let Some(key) = s.queues[i].pop_front(&mut s.slots) {
                    if let Some(t) = s.slots.remove(key) {
                        finished.push(t.into_completed());
                    }
                }
            }
        });

        let count = finished.len();
        if count > 0 {
            debug!(count, "queue closed with outstanding transfers");
        }
        for (transfer, completion) in finished {
            if let Some(complete) = completion {
                complete(transfer);
            }
        }
        count
    }

    /// Returns `true` once [`close`](Self::close) has run.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.with(|s| s.closed)
    }

    /// Number of transfers waiting in a direction's queue, excluding the
    /// active one. O(n); diagnostic use.
    #[must_use]
    pub fn pending(&self, dir: Dir) -> usize {
        self.state
            .with(|s| s.queues[dir.index()].len(&s.slots))
    }

    /// Returns `true` if a transfer is currently active for the direction.
    #[must_use]
    pub fn is_active(&self, dir: Dir) -> bool {
        self.state.with(|s| s.active[dir.index()].is_some())
    }

    fn now(&self) -> u32 {
        self.clock.now_ms() & TIME_MASK
    }
}

impl Drop for TransferQueue {
    fn drop(&mut self) {
        self.close();
    }
}
