//! Conflict Detection
//!
//! Decides whether a read or write by one transaction would violate
//! isolation with respect to the others. Checks run when the operation is
//! issued and again, for every key in the read and write sets, at commit.
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │  ConflictDetector (trait)                        │
//! │  - check_read(key, txn)                          │
//! │  - check_write(key, txn)                         │
//! ├────────────────────────┬─────────────────────────┤
//! │  ActiveSetScan         │  TimestampOrdering      │
//! │  - scans write sets of │  - per-key WTS / RTS    │
//! │    active transactions │    watermarks           │
//! │  - O(active txns)      │  - O(1) per key         │
//! └────────────────────────┴─────────────────────────┘
//! ```
//!
//! Both strategies reject an access to a key whose newest committed version
//! is newer than the transaction's snapshot: first committer wins.

mod active_set;
mod timestamp;

pub use active_set::ActiveSetScan;
pub use timestamp::TimestampOrdering;

use std::sync::Arc;

use crate::config::DetectorKind;
use crate::error::Conflict;
use crate::txn::{TransactionRegistry, TxnMeta};
use crate::version::VersionStore;

/// Result of a single conflict check
pub type CheckResult = std::result::Result<(), Conflict>;

/// Pluggable conflict-detection strategy
///
/// Implementations must be safe to call from many threads at once and must
/// never block waiting for another transaction to finish.
pub trait ConflictDetector: Send + Sync {
    /// May `txn` read `key`?
    fn check_read(&self, key: &[u8], txn: &TxnMeta) -> CheckResult;

    /// May `txn` write (or delete) `key`?
    fn check_write(&self, key: &[u8], txn: &TxnMeta) -> CheckResult;

    /// Which strategy this is
    fn kind(&self) -> DetectorKind;
}

/// Construct the detector selected by `kind` for one store instance
pub fn build_detector(
    kind: DetectorKind,
    registry: Arc<TransactionRegistry>,
    store: Arc<VersionStore>,
) -> Box<dyn ConflictDetector> {
    match kind {
        DetectorKind::ActiveSetScan => Box::new(ActiveSetScan::new(registry, store)),
        DetectorKind::TimestampOrdering => Box::new(TimestampOrdering::new(store)),
    }
}

/// Shared first-committer-wins rule
fn committed_after_snapshot(store: &VersionStore, key: &[u8], txn: &TxnMeta) -> CheckResult {
    match store.latest_commit_seq(key) {
        Some(committed) if committed > txn.snapshot_seq => Err(Conflict::CommittedAfterSnapshot {
            key: bytes::Bytes::copy_from_slice(key),
            snapshot: txn.snapshot_seq,
            committed,
        }),
        _ => Ok(()),
    }
}
