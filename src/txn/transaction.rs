//! Shared transaction handle
//!
//! The registry and the coordinator hold the same `Arc<Transaction>`. The
//! mutable part lives behind one mutex so that state checks and buffer
//! updates happen together.

use parking_lot::{Mutex, MutexGuard};

use super::{TransactionContext, TxnId, TxnMeta, TxnState};
use crate::version::CommitSeq;

/// Mutable part of a transaction
#[derive(Debug)]
pub struct TxnInner {
    pub state: TxnState,
    pub context: TransactionContext,
}

/// A transaction registered with a store
#[derive(Debug)]
pub struct Transaction {
    meta: TxnMeta,
    inner: Mutex<TxnInner>,
}

impl Transaction {
    pub fn new(id: TxnId, snapshot_seq: CommitSeq) -> Self {
        Self {
            meta: TxnMeta { id, snapshot_seq },
            inner: Mutex::new(TxnInner {
                state: TxnState::Active,
                context: TransactionContext::new(),
            }),
        }
    }

    pub fn id(&self) -> TxnId {
        self.meta.id
    }

    pub fn snapshot_seq(&self) -> CommitSeq {
        self.meta.snapshot_seq
    }

    pub fn meta(&self) -> TxnMeta {
        self.meta
    }

    pub fn state(&self) -> TxnState {
        self.inner.lock().state
    }

    /// Whether this transaction has a pending write to `key`
    ///
    /// Blocks briefly if the transaction is in the middle of committing.
    pub fn writes_key(&self, key: &[u8]) -> bool {
        let inner = self.inner.lock();
        inner.state == TxnState::Active && inner.context.has_write(key)
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, TxnInner> {
        self.inner.lock()
    }
}
