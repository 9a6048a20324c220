//! Version chain implementation
//!
//! Newest-first linked list of committed versions for a single key.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use crossbeam::epoch::{self, Atomic, Guard, Owned};

use super::{CommitSeq, VersionEntry, VersionInfo, VersionRecord};

struct Node {
    record: VersionRecord,
    /// Next older version
    next: Atomic<Node>,
}

/// Append-only chain of committed versions for one key
///
/// ## Concurrency:
/// - `read`/`latest_commit_seq`/`history`: lock-free, any number of threads
/// - `append`: lock-free publish; callers serialize appends per commit
/// - Records are never unlinked while the chain is alive
pub struct VersionChain {
    /// Newest version, or null for a chain that only carries a read watermark
    head: Atomic<Node>,

    /// Number of versions
    len: AtomicUsize,

    /// Highest read watermark recorded against any version of this key,
    /// including reads that found no visible version
    rts: AtomicU64,
}

impl VersionChain {
    /// Create an empty chain
    pub fn new() -> Self {
        Self {
            head: Atomic::null(),
            len: AtomicUsize::new(0),
            rts: AtomicU64::new(0),
        }
    }

    /// Entry of the newest version with `commit_seq <= snapshot`
    pub fn read(&self, snapshot: CommitSeq) -> Option<VersionEntry> {
        let guard = epoch::pin();
        self.visible(snapshot, &guard)
            .map(|record| record.entry().clone())
    }

    /// Append a version at the tail (newest end) of the chain
    ///
    /// `commit_seq` must be greater than every existing version's.
    pub fn append(&self, entry: VersionEntry, commit_seq: CommitSeq) {
        debug_assert!(
            self.latest_commit_seq().map_or(true, |latest| latest < commit_seq),
            "commit sequence {} is not newer than the chain head",
            commit_seq
        );

        let guard = epoch::pin();
        let mut node = Owned::new(Node {
            record: VersionRecord::new(entry, commit_seq),
            next: Atomic::null(),
        });

        loop {
            let head = self.head.load(Ordering::Acquire, &guard);
            node.next.store(head, Ordering::Relaxed);

            match self
                .head
                .compare_exchange(head, node, Ordering::AcqRel, Ordering::Acquire, &guard)
            {
                Ok(_) => break,
                Err(err) => node = err.new,
            }
        }

        self.len.fetch_add(1, Ordering::AcqRel);
    }

    /// Commit sequence of the newest version (the key's WTS)
    pub fn latest_commit_seq(&self) -> Option<CommitSeq> {
        let guard = epoch::pin();
        let head = self.head.load(Ordering::Acquire, &guard);
        // SAFETY: nodes are never freed while the chain is alive
        unsafe { head.as_ref() }.map(|node| node.record.commit_seq())
    }

    /// Highest read watermark for this key (the key's RTS)
    pub fn read_timestamp(&self) -> CommitSeq {
        self.rts.load(Ordering::Acquire)
    }

    /// Record that `snapshot` observed this key
    ///
    /// Raises the watermark of the version visible at `snapshot`, if any, and
    /// the chain-wide RTS.
    pub fn advance_read_watermark(&self, snapshot: CommitSeq) {
        let guard = epoch::pin();
        if let Some(record) = self.visible(snapshot, &guard) {
            record.advance_read_watermark(snapshot);
        }
        self.rts.fetch_max(snapshot, Ordering::AcqRel);
    }

    /// All versions, oldest first
    pub fn history(&self) -> Vec<VersionInfo> {
        let guard = epoch::pin();
        let mut versions = Vec::with_capacity(self.len());
        let mut current = self.head.load(Ordering::Acquire, &guard);

        // SAFETY: nodes are never freed while the chain is alive
        while let Some(node) = unsafe { current.as_ref() } {
            versions.push(node.record.info());
            current = node.next.load(Ordering::Acquire, &guard);
        }

        versions.reverse();
        versions
    }

    pub fn len(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn visible<'g>(&'g self, snapshot: CommitSeq, guard: &'g Guard) -> Option<&'g VersionRecord> {
        let mut current = self.head.load(Ordering::Acquire, guard);

        // SAFETY: nodes are never freed while the chain is alive
        while let Some(node) = unsafe { current.as_ref() } {
            if node.record.commit_seq() <= snapshot {
                return Some(&node.record);
            }
            current = node.next.load(Ordering::Acquire, guard);
        }

        None
    }
}

impl Default for VersionChain {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for VersionChain {
    fn drop(&mut self) {
        // SAFETY: `&mut self` guarantees no reader holds a guard into this
        // chain, so every node can be reclaimed immediately.
        unsafe {
            let guard = epoch::unprotected();
            let mut current = self.head.load(Ordering::Relaxed, guard);
            while !current.is_null() {
                let node = current.into_owned();
                current = node.next.load(Ordering::Relaxed, guard);
            }
        }
    }
}
