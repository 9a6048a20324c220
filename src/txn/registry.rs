//! Transaction Registry
//!
//! Table of active transactions for one store instance, plus the sequence
//! counter that transaction ids and commit sequences are drawn from.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use super::{Transaction, TxnId};

/// Active transactions of one store
///
/// ## Concurrency:
/// - `active`: RwLock, so `register`/`unregister` are atomic with respect to
///   `active_snapshot` and every scan sees a consistent set
/// - `next_seq`: atomic counter shared by ids and commit sequences; values
///   are unique and never reused
pub struct TransactionRegistry {
    active: RwLock<HashMap<TxnId, Arc<Transaction>>>,
    next_seq: AtomicU64,
}

impl TransactionRegistry {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            active: RwLock::new(HashMap::with_capacity(capacity)),
            next_seq: AtomicU64::new(0),
        }
    }

    /// Allocate the next sequence number (first value is 1)
    pub fn next_seq(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Last sequence number handed out
    pub fn current_seq(&self) -> u64 {
        self.next_seq.load(Ordering::SeqCst)
    }

    /// Add a transaction to the active table
    pub fn register(&self, txn: Arc<Transaction>) {
        self.active.write().insert(txn.id(), txn);
    }

    /// Remove a transaction; unknown ids are ignored
    pub fn unregister(&self, id: TxnId) -> Option<Arc<Transaction>> {
        self.active.write().remove(&id)
    }

    pub fn get(&self, id: TxnId) -> Option<Arc<Transaction>> {
        self.active.read().get(&id).cloned()
    }

    pub fn contains(&self, id: TxnId) -> bool {
        self.active.read().contains_key(&id)
    }

    /// Momentary view of every active transaction
    pub fn active_snapshot(&self) -> Vec<Arc<Transaction>> {
        self.active.read().values().cloned().collect()
    }

    pub fn active_count(&self) -> usize {
        self.active.read().len()
    }
}

impl Default for TransactionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
