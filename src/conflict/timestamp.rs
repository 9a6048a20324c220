//! Timestamp-ordering detector
//!
//! Uses two watermarks derived from each key's version chain:
//! - WTS: commit sequence of the newest committed version
//! - RTS: highest snapshot recorded as having read the key
//!
//! Neither depends on how many transactions are active.

use std::sync::Arc;

use bytes::Bytes;

use super::{committed_after_snapshot, CheckResult, ConflictDetector};
use crate::config::DetectorKind;
use crate::error::Conflict;
use crate::txn::TxnMeta;
use crate::version::VersionStore;

/// Conflict detection with per-key read/write timestamps
pub struct TimestampOrdering {
    store: Arc<VersionStore>,
}

impl TimestampOrdering {
    pub fn new(store: Arc<VersionStore>) -> Self {
        Self { store }
    }
}

impl ConflictDetector for TimestampOrdering {
    /// Refuses when `snapshot < WTS`; otherwise records the read by raising
    /// the key's read watermark.
    fn check_read(&self, key: &[u8], txn: &TxnMeta) -> CheckResult {
        if let Some(wts) = self.store.latest_commit_seq(key) {
            if txn.snapshot_seq < wts {
                return Err(Conflict::StaleRead {
                    key: Bytes::copy_from_slice(key),
                    snapshot: txn.snapshot_seq,
                    wts,
                });
            }
        }

        self.store.advance_read_watermark(key, txn.snapshot_seq);
        Ok(())
    }

    /// Refuses when `snapshot < WTS` or `snapshot < RTS`.
    fn check_write(&self, key: &[u8], txn: &TxnMeta) -> CheckResult {
        committed_after_snapshot(&self.store, key, txn)?;

        let rts = self.store.read_timestamp(key);
        if txn.snapshot_seq < rts {
            return Err(Conflict::WriteBehindRead {
                key: Bytes::copy_from_slice(key),
                snapshot: txn.snapshot_seq,
                rts,
            });
        }

        Ok(())
    }

    fn kind(&self) -> DetectorKind {
        DetectorKind::TimestampOrdering
    }
}
