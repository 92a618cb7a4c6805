//! Sequence allocator + bounded pending-request table (§4.2, §4.3).
//!
//! The sequence counter and the pending map share one lock, exactly as
//! §4.3's invariants require ("the sequence counter is incremented
//! under the same lock" as the pending table) — this is what makes
//! "insert the entry, then send" race-free against a response arriving
//! before the waiter is registered.

use std::collections::HashMap;

use tokio::sync::{oneshot, Mutex};

use crate::error::IcapError;
use crate::wire::Frame;

/// What happens when a response for this `seq_num` arrives.
pub enum PendingEntry {
    /// A blocking caller is waiting on this oneshot (application role:
    /// every response resolves a waiter, §4.5 step 3). Carries a
    /// `Result` rather than a bare `Frame` so `deinit` can wake a
    /// still-pending waiter with `Timeout` instead of a real frame
    /// (§4.6).
    Waiter(oneshot::Sender<Result<Frame, IcapError>>),
    /// A fire-and-forget notification registered a response callback
    /// instead of blocking (device role's `FRAG_READY`/`XRUN`/`ERROR`
    /// notifications, §4.5 step 3). Carries the originating command so
    /// the dispatcher knows which callback to invoke.
    Callback(u32),
}

struct Inner {
    next_seq: u32,
    entries: HashMap<u32, PendingEntry>,
    max_pending: usize,
}

/// Bounded map from `seq_num` to in-flight request state, plus the
/// monotonic sequence counter that feeds it.
pub struct PendingTable {
    inner: Mutex<Inner>,
}

impl PendingTable {
    pub fn new(max_pending: usize) -> Self {
        PendingTable {
            inner: Mutex::new(Inner {
                next_seq: 0,
                entries: HashMap::new(),
                max_pending,
            }),
        }
    }

    /// Allocate the next sequence number and register `entry` for it in
    /// one atomic step (§4.3 step 1: "the caller first inserts a new
    /// entry keyed by the about-to-be-used `seq_num`").
    ///
    /// `Busy` if allocation would collide with a still-pending entry
    /// (§4.2: wraparound is defined, but a collision with a pending seq
    /// is a protocol error) or if the table is already at capacity.
    pub async fn register(&self, entry: PendingEntry) -> Result<u32, IcapError> {
        let mut inner = self.inner.lock().await;
        if inner.entries.len() >= inner.max_pending {
            return Err(IcapError::Busy);
        }
        let start = inner.next_seq;
        loop {
            let seq = inner.next_seq;
            inner.next_seq = inner.next_seq.wrapping_add(1);
            if !inner.entries.contains_key(&seq) {
                inner.entries.insert(seq, entry);
                return Ok(seq);
            }
            if inner.next_seq == start {
                // Wrapped all the way around without finding a free slot.
                return Err(IcapError::Busy);
            }
        }
    }

    /// Allocate the next sequence number without registering any entry
    /// for it — for a fire-and-forget send that expects no response at
    /// all (the device-role `ERROR` notification, §4.5) but still needs
    /// a `seq_num` that can't collide with a real pending request.
    pub async fn reserve(&self) -> Result<u32, IcapError> {
        let mut inner = self.inner.lock().await;
        let start = inner.next_seq;
        loop {
            let seq = inner.next_seq;
            inner.next_seq = inner.next_seq.wrapping_add(1);
            if !inner.entries.contains_key(&seq) {
                return Ok(seq);
            }
            if inner.next_seq == start {
                return Err(IcapError::Busy);
            }
        }
    }

    /// Remove and return the entry for `seq`, if any. Used both by a
    /// timed-out waiter tearing down its own registration and by the
    /// dispatcher resolving an inbound response — whichever runs first
    /// wins, and the other sees `None` (§4.3: "removal must be atomic
    /// with respect to signaling").
    pub async fn take(&self, seq: u32) -> Option<PendingEntry> {
        self.inner.lock().await.entries.remove(&seq)
    }

    /// Drain every pending entry, e.g. on `deinit` (§4.6: "waking all
    /// current waiters with `Timeout`").
    pub async fn drain(&self) -> Vec<PendingEntry> {
        self.inner.lock().await.entries.drain().map(|(_, v)| v).collect()
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.inner.lock().await.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn register_allocates_increasing_seqs() {
        let table = PendingTable::new(10);
        let (tx1, _rx1) = oneshot::channel();
        let (tx2, _rx2) = oneshot::channel();
        let seq1 = table.register(PendingEntry::Waiter(tx1)).await.unwrap();
        let seq2 = table.register(PendingEntry::Waiter(tx2)).await.unwrap();
        assert_eq!(seq2, seq1.wrapping_add(1));
    }

    #[tokio::test]
    async fn take_removes_entry_once() {
        let table = PendingTable::new(10);
        let (tx, _rx) = oneshot::channel();
        let seq = table.register(PendingEntry::Waiter(tx)).await.unwrap();
        assert_eq!(table.len().await, 1);
        assert!(table.take(seq).await.is_some());
        assert_eq!(table.len().await, 0);
        assert!(table.take(seq).await.is_none());
    }

    #[tokio::test]
    async fn register_respects_capacity() {
        let table = PendingTable::new(1);
        let (tx1, _rx1) = oneshot::channel();
        let (tx2, _rx2) = oneshot::channel();
        table.register(PendingEntry::Waiter(tx1)).await.unwrap();
        assert_eq!(
            table.register(PendingEntry::Waiter(tx2)).await.unwrap_err(),
            IcapError::Busy
        );
    }

    #[tokio::test]
    async fn concurrent_registers_yield_unique_seqs() {
        let table = std::sync::Arc::new(PendingTable::new(64));
        let mut handles = Vec::new();
        for _ in 0..32 {
            let table = table.clone();
            handles.push(tokio::spawn(async move {
                let (tx, _rx) = oneshot::channel::<Result<Frame, IcapError>>();
                table.register(PendingEntry::Waiter(tx)).await.unwrap()
            }));
        }
        let mut seqs = Vec::new();
        for h in handles {
            seqs.push(h.await.unwrap());
        }
        seqs.sort_unstable();
        let mut expected: Vec<u32> = (0..32).collect();
        expected.sort_unstable();
        assert_eq!(seqs, expected);
    }
}
