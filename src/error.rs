//! Error types for ChronoKV
//!
//! Every failure a caller can observe is one of two kinds: the transaction
//! id is no longer active, or a conflict was detected. Both are surfaced
//! immediately; the engine never retries internally.

use bytes::Bytes;
use thiserror::Error;

use crate::txn::TxnId;
use crate::version::CommitSeq;

/// Result type alias using ChronoError
pub type Result<T> = std::result::Result<T, ChronoError>;

/// Unified error type for ChronoKV operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChronoError {
    // -------------------------------------------------------------------------
    // Lifecycle Errors
    // -------------------------------------------------------------------------
    /// The id is unknown, already committed, or rolled back
    #[error("transaction {0} is not active")]
    InactiveTransaction(TxnId),

    // -------------------------------------------------------------------------
    // Concurrency Errors
    // -------------------------------------------------------------------------
    #[error("transaction conflict: {0}")]
    Conflict(#[from] Conflict),
}

impl ChronoError {
    /// Whether the caller may retry the work with a fresh transaction
    pub fn is_conflict(&self) -> bool {
        matches!(self, ChronoError::Conflict(_))
    }

    pub fn is_inactive(&self) -> bool {
        matches!(self, ChronoError::InactiveTransaction(_))
    }

    /// The conflict detail, if this is a conflict
    pub fn conflict(&self) -> Option<&Conflict> {
        match self {
            ChronoError::Conflict(c) => Some(c),
            ChronoError::InactiveTransaction(_) => None,
        }
    }
}

/// A detected violation of the isolation rules
///
/// Each variant names the key involved and enough context to tell which
/// rule fired.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Conflict {
    /// Another active transaction already buffered a write to the key
    #[error("write-write on key {key:?}: already written by active transaction {holder}")]
    WriteWrite { key: Bytes, holder: TxnId },

    /// Another active transaction has a pending write to a key being read
    #[error("read-write on key {key:?}: pending write by active transaction {writer}")]
    ReadWrite { key: Bytes, writer: TxnId },

    /// The key was committed by someone else after this snapshot was taken
    #[error("key {key:?} committed at {committed} after snapshot {snapshot}")]
    CommittedAfterSnapshot {
        key: Bytes,
        snapshot: CommitSeq,
        committed: CommitSeq,
    },

    /// Timestamp ordering: snapshot is older than the key's write timestamp
    #[error("stale snapshot {snapshot} on key {key:?} (write timestamp {wts})")]
    StaleRead {
        key: Bytes,
        snapshot: CommitSeq,
        wts: CommitSeq,
    },

    /// Timestamp ordering: a newer snapshot has already read the key
    #[error("write behind read on key {key:?}: snapshot {snapshot} < read timestamp {rts}")]
    WriteBehindRead {
        key: Bytes,
        snapshot: CommitSeq,
        rts: CommitSeq,
    },
}

impl Conflict {
    /// The key the conflict was detected on
    pub fn key(&self) -> &Bytes {
        match self {
            Conflict::WriteWrite { key, .. }
            | Conflict::ReadWrite { key, .. }
            | Conflict::CommittedAfterSnapshot { key, .. }
            | Conflict::StaleRead { key, .. }
            | Conflict::WriteBehindRead { key, .. } => key,
        }
    }

    /// Short rule name, used in log events
    pub fn rule(&self) -> &'static str {
        match self {
            Conflict::WriteWrite { .. } => "write-write",
            Conflict::ReadWrite { .. } => "read-write",
            Conflict::CommittedAfterSnapshot { .. } => "committed-after-snapshot",
            Conflict::StaleRead { .. } => "stale-read",
            Conflict::WriteBehindRead { .. } => "write-behind-read",
        }
    }
}
