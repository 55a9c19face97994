//! Transfer records and completion handoff.

use crate::time::Deadline;
use bytes::{Bytes, BytesMut};

/// Maximum transfer length in bytes.
///
/// Progress is tracked in 16-bit counters, so a transfer must fit below
/// `u16::MAX`.
pub const MAX_TRANSFER_LEN: usize = u16::MAX as usize - 1;

/// Transfer direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dir {
    /// Outgoing transfer (engine hands chunks to the backend).
    Tx,
    /// Incoming transfer (backend hands received bytes to the engine).
    Rx,
}

impl Dir {
    pub(crate) fn index(self) -> usize {
        match self {
            Dir::Tx => 0,
            Dir::Rx => 1,
        }
    }
}

/// The bytes a transfer moves, owned by the engine while queued.
///
/// The original owner hands the buffer over at submission and gets it back
/// exactly once through the completion, the move-based rendition of
/// "keep this memory alive until the callback fires". The engine never
/// inspects payload contents.
#[derive(Debug)]
pub enum Payload {
    /// Bytes to transmit. `Bytes` clones are cheap reference-counted
    /// views, so chunk handoff to the backend copies nothing.
    Outgoing(Bytes),
    /// Buffer being filled by received bytes.
    Incoming(BytesMut),
}

/// Single-shot completion callback.
///
/// `FnOnce` makes exactly-once delivery a type-system fact: the box can
/// only ever be called by moving it.
pub(crate) type CompletionFn = Box<dyn FnOnce(CompletedTransfer) + Send>;

/// A finished transfer, handed to the completion with full ownership.
#[derive(Debug)]
pub struct CompletedTransfer {
    dir: Dir,
    payload: Payload,
    requested: u16,
    transferred: u16,
}

impl CompletedTransfer {
    /// The transfer's direction.
    #[must_use]
    pub fn direction(&self) -> Dir {
        self.dir
    }

    /// Bytes requested at submission.
    #[must_use]
    pub fn requested(&self) -> usize {
        usize::from(self.requested)
    }

    /// Bytes actually transferred.
    ///
    /// Short of [`requested`](Self::requested) when the transfer was
    /// flushed, purged, cancelled, or finalized early; that shortfall is
    /// the only way transport failure reaches the owner.
    #[must_use]
    pub fn transferred(&self) -> usize {
        usize::from(self.transferred)
    }

    /// Returns `true` if every requested byte was transferred.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.transferred == self.requested
    }

    /// Borrows the payload.
    #[must_use]
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Takes the payload back, returning buffer ownership to the caller.
    #[must_use]
    pub fn into_payload(self) -> Payload {
        self.payload
    }
}

/// One scheduled transfer while it lives inside the engine.
pub(crate) struct Transfer {
    pub(crate) dir: Dir,
    pub(crate) payload: Payload,
    pub(crate) requested: u16,
    pub(crate) transferred: u16,
    pub(crate) deadline: Deadline,
    pub(crate) completion: Option<CompletionFn>,
}

impl Transfer {
    pub(crate) fn new(
        dir: Dir,
        payload: Payload,
        requested: u16,
        deadline: Deadline,
        completion: Option<CompletionFn>,
    ) -> Self {
        Self {
            dir,
            payload,
            requested,
            transferred: 0,
            deadline,
            completion,
        }
    }

    /// Bytes still to move.
    pub(crate) fn remaining(&self) -> usize {
        usize::from(self.requested - self.transferred)
    }

    /// Splits the record into the owner-facing result and its completion.
    pub(crate) fn into_completed(self) -> (CompletedTransfer, Option<CompletionFn>) {
        (
            CompletedTransfer {
                dir: self.dir,
                payload: self.payload,
                requested: self.requested,
                transferred: self.transferred,
            },
            self.completion,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completed_reports_shortfall() {
        let t = Transfer::new(
            Dir::Tx,
            Payload::Outgoing(Bytes::from_static(b"abcd")),
            4,
            Deadline::NEVER,
            None,
        );
        let (done, completion) = t.into_completed();
        assert!(completion.is_none());
        assert_eq!(done.requested(), 4);
        assert_eq!(done.transferred(), 0);
        assert!(!done.is_complete());
    }

    #[test]
    fn payload_returns_to_owner() {
        let t = Transfer::new(
            Dir::Rx,
            Payload::Incoming(BytesMut::with_capacity(8)),
            8,
            Deadline::NEVER,
            None,
        );
        let (done, _) = t.into_completed();
        assert_eq!(done.direction(), Dir::Rx);
        match done.into_payload() {
            Payload::Incoming(buf) => assert!(buf.is_empty()),
            Payload::Outgoing(_) => panic!("expected an incoming payload"),
        }
    }

    #[test]
    fn remaining_tracks_progress() {
        let mut t = Transfer::new(
            Dir::Tx,
            Payload::Outgoing(Bytes::from_static(b"abcdefgh")),
            8,
            Deadline::NEVER,
            None,
        );
        assert_eq!(t.remaining(), 8);
        t.transferred = 3;
        assert_eq!(t.remaining(), 5);
    }
}
