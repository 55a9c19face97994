//! Scripted backend drivers.
//!
//! These helpers play the role of a transport backend: load the next
//! chunk, pretend to move some bytes, commit the count. They exist to
//! exercise the engine contract in tests; real backends live outside the
//! engine entirely.

use xferq_core::{Chunk, CommitOptions, Dir, Progress, TransferQueue};

/// Drains the TX side, transferring at most `chunk_sizes[i % len]` bytes
/// per commit.
///
/// Runs until nothing is queued or active. Returns the total bytes
/// "transmitted". Panics if a commit fails, which in a test means the
/// scripted drive and the engine disagree about state.
pub fn drive_writes(queue: &TransferQueue, chunk_sizes: &[usize]) -> usize {
    assert!(!chunk_sizes.is_empty(), "need at least one chunk size");

    let mut total = 0;
    let mut step = 0;
    while let Some(Chunk::Write { data, .. }) = queue.load_next(Dir::Tx) {
        let chunk = chunk_sizes[step % chunk_sizes.len()].min(data.len());
        step += 1;
        queue
            .commit(Progress::Sent(chunk), CommitOptions::new())
            .expect("scripted write commit failed");
        total += chunk;
    }
    total
}

/// Feeds `frames` into the RX side, one commit per frame, clipping each
/// frame to the active transfer's remaining capacity.
///
/// Stops early when no transfer is queued or active. Returns the total
/// bytes "received".
pub fn drive_reads(queue: &TransferQueue, frames: &[&[u8]]) -> usize {
    let mut total = 0;
    for frame in frames {
        let Some(Chunk::Read { remaining, .. }) = queue.load_next(Dir::Rx) else {
            break;
        };
        let take = remaining.min(frame.len());
        queue
            .commit(Progress::Received(&frame[..take]), CommitOptions::new())
            .expect("scripted read commit failed");
        total += take;
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::TestQueue;
    use bytes::{Bytes, BytesMut};
    use xferq_core::Timeout;

    #[test]
    fn drive_writes_fragments_transfers() {
        let fixture = TestQueue::new();
        fixture
            .submit_write_with(
                Bytes::from(vec![7u8; 10]),
                Timeout::Never,
                fixture.recorder.on_complete("t"),
            )
            .unwrap();

        // 4 + 4 + 2 bytes over three commits.
        assert_eq!(drive_writes(&fixture, &[4]), 10);
        let records = fixture.recorder.records();
        assert_eq!(records.len(), 1);
        assert!(records[0].is_complete());
    }

    #[test]
    fn drive_reads_respects_capacity() {
        let fixture = TestQueue::new();
        fixture
            .submit_read_with(
                BytesMut::with_capacity(4),
                4,
                Timeout::Never,
                fixture.recorder.on_complete("r"),
            )
            .unwrap();

        // The second frame is clipped to the 1 remaining byte.
        assert_eq!(drive_reads(&fixture, &[b"abc", b"xyz"]), 4);
        let records = fixture.recorder.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].transferred, 4);
    }
}
