//! Active-set scanning detector
//!
//! A key is contended if any other active transaction has it in its write
//! set. Cost grows with the number of active transactions.

use std::sync::Arc;

use bytes::Bytes;

use super::{committed_after_snapshot, CheckResult, ConflictDetector};
use crate::config::DetectorKind;
use crate::error::Conflict;
use crate::txn::{TransactionRegistry, TxnId, TxnMeta};
use crate::version::VersionStore;

/// Conflict detection by scanning the registry
///
/// Rules:
/// - write-write: another active transaction already buffered a write to
///   the key (first writer wins, the second is refused)
/// - read-write: another active transaction has a pending write to the key
/// - a version committed after the snapshot conflicts with both reads and
///   writes, which covers writers that already left the registry
pub struct ActiveSetScan {
    registry: Arc<TransactionRegistry>,
    store: Arc<VersionStore>,
}

impl ActiveSetScan {
    pub fn new(registry: Arc<TransactionRegistry>, store: Arc<VersionStore>) -> Self {
        Self { registry, store }
    }

    /// First other active transaction with a pending write to `key`
    fn pending_writer(&self, key: &[u8], txn: &TxnMeta) -> Option<TxnId> {
        self.registry
            .active_snapshot()
            .into_iter()
            .filter(|other| other.id() != txn.id)
            .find(|other| other.writes_key(key))
            .map(|other| other.id())
    }
}

impl ConflictDetector for ActiveSetScan {
    fn check_read(&self, key: &[u8], txn: &TxnMeta) -> CheckResult {
        committed_after_snapshot(&self.store, key, txn)?;

        match self.pending_writer(key, txn) {
            Some(writer) => Err(Conflict::ReadWrite {
                key: Bytes::copy_from_slice(key),
                writer,
            }),
            None => Ok(()),
        }
    }

    fn check_write(&self, key: &[u8], txn: &TxnMeta) -> CheckResult {
        committed_after_snapshot(&self.store, key, txn)?;

        match self.pending_writer(key, txn) {
            Some(holder) => Err(Conflict::WriteWrite {
                key: Bytes::copy_from_slice(key),
                holder,
            }),
            None => Ok(()),
        }
    }

    fn kind(&self) -> DetectorKind {
        DetectorKind::ActiveSetScan
    }
}
