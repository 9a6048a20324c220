//! Version Module
//!
//! Committed, multi-version storage for every key.
//!
//! ## Responsibilities
//! - Keep, per key, an append-only chain of committed versions
//! - Answer snapshot reads without taking locks on the chain
//! - Track per-version read watermarks for timestamp ordering
//!
//! ## Data Structure Choice
//! Each chain is a newest-first linked list managed with crossbeam's
//! epoch-based pointers:
//! - Appends publish a fully built node with a single atomic swap of the head
//! - Readers walk from the head and never see a half-written record
//! - Nodes are only freed when the whole chain is dropped (no reclamation yet)

mod chain;
mod store;

pub use chain::VersionChain;
pub use store::VersionStore;

use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;

/// Commit sequence number: strictly increasing, assigned at commit time
pub type CommitSeq = u64;

/// Opaque, immutable key
pub type Key = Bytes;

/// Opaque, immutable value
pub type Value = Bytes;

/// Payload of a single version
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionEntry {
    /// A live value
    Value(Value),

    /// A tombstone (deleted key)
    Tombstone,
}

impl VersionEntry {
    /// The value, or `None` for a tombstone
    pub fn into_value(self) -> Option<Value> {
        match self {
            VersionEntry::Value(v) => Some(v),
            VersionEntry::Tombstone => None,
        }
    }

    pub fn is_tombstone(&self) -> bool {
        matches!(self, VersionEntry::Tombstone)
    }
}

/// One committed version of a key
///
/// Immutable after creation except for `read_watermark`, which only moves
/// forward.
#[derive(Debug)]
pub struct VersionRecord {
    entry: VersionEntry,
    commit_seq: CommitSeq,
    read_watermark: AtomicU64,
}

impl VersionRecord {
    pub(crate) fn new(entry: VersionEntry, commit_seq: CommitSeq) -> Self {
        Self {
            entry,
            commit_seq,
            read_watermark: AtomicU64::new(0),
        }
    }

    pub fn entry(&self) -> &VersionEntry {
        &self.entry
    }

    pub fn commit_seq(&self) -> CommitSeq {
        self.commit_seq
    }

    /// Highest snapshot that has observed this version
    pub fn read_watermark(&self) -> CommitSeq {
        self.read_watermark.load(Ordering::Acquire)
    }

    /// Raise the read watermark to `snapshot` if it is higher
    pub(crate) fn advance_read_watermark(&self, snapshot: CommitSeq) {
        self.read_watermark.fetch_max(snapshot, Ordering::AcqRel);
    }

    /// Point-in-time copy for inspection
    pub fn info(&self) -> VersionInfo {
        VersionInfo {
            entry: self.entry.clone(),
            commit_seq: self.commit_seq,
            read_watermark: self.read_watermark(),
        }
    }
}

/// Detached copy of a [`VersionRecord`], returned by history queries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionInfo {
    pub entry: VersionEntry,
    pub commit_seq: CommitSeq,
    pub read_watermark: CommitSeq,
}
