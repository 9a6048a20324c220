//! Coordinator Module
//!
//! The transactional front door of a store instance.
//!
//! ## Responsibilities
//! - Begin transactions and hand out ids and snapshots
//! - Route reads through the local write buffer, the conflict detector and
//!   the version store
//! - Buffer writes until commit
//! - Own the commit critical section (re-validate, then apply)
//! - Roll back on request or on commit-time conflicts

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::{Config, DetectorKind};
use crate::conflict::{build_detector, ConflictDetector};
use crate::error::{ChronoError, Conflict, Result};
use crate::txn::{Transaction, TransactionContext, TransactionRegistry, TxnId, TxnInner, TxnMeta, TxnState};
use crate::version::{CommitSeq, Key, Value, VersionEntry, VersionInfo, VersionStore};

/// Point-in-time counters for monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CoordinatorStats {
    /// Currently active transactions
    pub active: usize,

    /// Transactions committed so far
    pub committed: u64,

    /// Transactions rolled back, explicitly or by a commit-time conflict
    pub aborted: u64,

    /// Conflicts reported to callers (operation-time and commit-time)
    pub conflicts: u64,

    /// Keys with at least one committed version
    pub keys: usize,

    /// Committed versions across all keys
    pub versions: usize,

    /// Newest commit sequence visible to new transactions
    pub last_committed_seq: CommitSeq,
}

/// Multi-version transactional key-value store
///
/// ## Concurrency Model: Optimistic, Serialized Commits
///
/// - **Reads**: never wait on other transactions; chains are walked without
///   locks and the snapshot fixes which versions are visible
/// - **Writes**: buffered in the transaction's own context
/// - **Commits**: serialized by `commit_lock`, so validation and apply are
///   one atomic step with respect to every other commit
/// - **Conflicts**: reported immediately; nothing queues or waits
///
/// ## Visibility
/// A commit appends all of its versions first and only then publishes its
/// commit sequence in `visible_seq`. New transactions take `visible_seq` as
/// their snapshot, so no reader can observe part of a commit.
pub struct TransactionCoordinator {
    /// Store configuration
    config: Config,

    /// Active transactions and the shared sequence counter
    registry: Arc<TransactionRegistry>,

    /// Committed versions
    store: Arc<VersionStore>,

    /// Strategy chosen at construction
    detector: Box<dyn ConflictDetector>,

    /// Highest commit sequence whose writes are fully applied
    visible_seq: AtomicU64,

    /// Serializes commits (validation → append → publish)
    commit_lock: Mutex<()>,

    committed: AtomicU64,
    aborted: AtomicU64,
    conflicts: AtomicU64,
}

impl TransactionCoordinator {
    /// Create a store with the given config
    pub fn open(config: Config) -> Self {
        let registry = Arc::new(TransactionRegistry::with_capacity(config.registry_capacity));
        let store = Arc::new(VersionStore::new());
        let detector = build_detector(config.detector, Arc::clone(&registry), Arc::clone(&store));

        tracing::debug!(detector = %config.detector, "store opened");

        Self {
            config,
            registry,
            store,
            detector,
            visible_seq: AtomicU64::new(0),
            commit_lock: Mutex::new(()),
            committed: AtomicU64::new(0),
            aborted: AtomicU64::new(0),
            conflicts: AtomicU64::new(0),
        }
    }

    /// Create a store with default config
    pub fn new() -> Self {
        Self::open(Config::default())
    }

    /// Create a store using the given detector and otherwise default config
    pub fn with_detector(kind: DetectorKind) -> Self {
        Self::open(Config::builder().detector(kind).build())
    }

    // =========================================================================
    // Transaction Lifecycle
    // =========================================================================

    /// Start a transaction and return its id
    ///
    /// The snapshot is the newest fully applied commit.
    pub fn begin(&self) -> TxnId {
        let id = self.registry.next_seq();
        let snapshot_seq = self.visible_seq.load(Ordering::Acquire);

        self.registry
            .register(Arc::new(Transaction::new(id, snapshot_seq)));

        tracing::debug!(txn_id = id, snapshot_seq, "transaction started");
        id
    }

    /// Read `key` as of the transaction's snapshot
    ///
    /// Order:
    /// 1. The transaction's own buffered write (read-your-own-write)
    /// 2. Conflict check
    /// 3. Version store at the snapshot
    ///
    /// A conflict leaves the transaction active.
    pub fn read(&self, id: TxnId, key: &[u8]) -> Result<Option<Value>> {
        let txn = self.active(id)?;

        {
            let inner = txn.lock();
            Self::ensure_active(&inner, id)?;
            if let Some(entry) = inner.context.buffered(key) {
                tracing::trace!(txn_id = id, "read served from write buffer");
                return Ok(entry.clone().into_value());
            }
        }

        let meta = txn.meta();
        self.detector
            .check_read(key, &meta)
            .map_err(|conflict| self.reject(id, conflict))?;

        {
            let mut inner = txn.lock();
            Self::ensure_active(&inner, id)?;
            inner.context.record_read(Key::copy_from_slice(key));
        }

        tracing::trace!(txn_id = id, snapshot_seq = meta.snapshot_seq, "read from version store");
        Ok(self.store.read(key, meta.snapshot_seq))
    }

    /// Buffer a write of `value` to `key`
    ///
    /// Nothing reaches the version store before commit. A conflict leaves
    /// the transaction active.
    pub fn write(&self, id: TxnId, key: impl Into<Key>, value: impl Into<Value>) -> Result<()> {
        self.buffer(id, key.into(), VersionEntry::Value(value.into()))
    }

    /// Buffer a delete of `key`
    pub fn delete(&self, id: TxnId, key: impl Into<Key>) -> Result<()> {
        self.buffer(id, key.into(), VersionEntry::Tombstone)
    }

    /// Validate and apply the transaction's writes
    ///
    /// Returns the commit sequence the writes became visible at. A
    /// transaction without writes consumes no sequence and returns its
    /// snapshot.
    ///
    /// Commit sequence (under `commit_lock`):
    /// 1. Re-validate every read and written key
    /// 2. On conflict: abort, unregister, report the conflict
    /// 3. Allocate the commit sequence
    /// 4. Append every buffered write at that sequence
    /// 5. Publish the sequence to new snapshots
    /// 6. Mark committed and unregister
    pub fn commit(&self, id: TxnId) -> Result<CommitSeq> {
        let txn = self.active(id)?;

        let _commit_guard = self.commit_lock.lock();
        let mut inner = txn.lock();
        Self::ensure_active(&inner, id)?;

        let meta = txn.meta();
        if let Err(conflict) = self.validate(&inner.context, &meta) {
            inner.state = TxnState::Aborted;
            inner.context.clear();
            drop(inner);
            self.registry.unregister(id);
            self.aborted.fetch_add(1, Ordering::Relaxed);

            tracing::debug!(txn_id = id, "transaction aborted during commit validation");
            return Err(self.reject(id, conflict));
        }

        let commit_seq = if inner.context.is_read_only() {
            meta.snapshot_seq
        } else {
            let commit_seq = self.registry.next_seq();
            let writes = inner.context.take_writes();
            let write_count = writes.len();

            for (key, entry) in writes {
                self.store.append(key, entry, commit_seq);
            }
            self.visible_seq.store(commit_seq, Ordering::Release);

            tracing::debug!(txn_id = id, commit_seq, write_count, "writes applied");
            commit_seq
        };

        inner.state = TxnState::Committed;
        inner.context.clear();
        drop(inner);
        self.registry.unregister(id);
        self.committed.fetch_add(1, Ordering::Relaxed);

        tracing::debug!(txn_id = id, commit_seq, "transaction committed");
        Ok(commit_seq)
    }

    /// Discard the transaction's buffered writes and end it
    ///
    /// Always succeeds; unknown or already finished ids are a no-op.
    pub fn rollback(&self, id: TxnId) {
        let Some(txn) = self.registry.get(id) else {
            tracing::trace!(txn_id = id, "rollback of inactive transaction ignored");
            return;
        };

        {
            let mut inner = txn.lock();
            if inner.state == TxnState::Active {
                inner.state = TxnState::Aborted;
                inner.context.clear();
                self.aborted.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(txn_id = id, "transaction rolled back");
            }
        }

        self.registry.unregister(id);
    }

    // =========================================================================
    // Internal
    // =========================================================================

    fn buffer(&self, id: TxnId, key: Key, entry: VersionEntry) -> Result<()> {
        let txn = self.active(id)?;
        Self::ensure_active(&txn.lock(), id)?;

        self.detector
            .check_write(&key, &txn.meta())
            .map_err(|conflict| self.reject(id, conflict))?;

        let mut inner = txn.lock();
        Self::ensure_active(&inner, id)?;
        tracing::trace!(txn_id = id, tombstone = entry.is_tombstone(), "write buffered");
        inner.context.buffer_write(key, entry);
        Ok(())
    }

    /// Re-run the detector over the read set, then the write set
    fn validate(&self, context: &TransactionContext, meta: &TxnMeta) -> std::result::Result<(), Conflict> {
        for key in context.read_keys() {
            self.detector.check_read(key, meta)?;
        }
        for key in context.write_keys() {
            self.detector.check_write(key, meta)?;
        }
        Ok(())
    }

    fn active(&self, id: TxnId) -> Result<Arc<Transaction>> {
        self.registry
            .get(id)
            .ok_or(ChronoError::InactiveTransaction(id))
    }

    fn ensure_active(inner: &TxnInner, id: TxnId) -> Result<()> {
        if inner.state == TxnState::Active {
            Ok(())
        } else {
            Err(ChronoError::InactiveTransaction(id))
        }
    }

    fn reject(&self, id: TxnId, conflict: Conflict) -> ChronoError {
        self.conflicts.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(txn_id = id, rule = conflict.rule(), %conflict, "conflict detected");
        ChronoError::Conflict(conflict)
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// State of a registered transaction; `None` once it has finished
    pub fn state(&self, id: TxnId) -> Option<TxnState> {
        self.registry.get(id).map(|txn| txn.state())
    }

    /// Snapshot of an active transaction
    pub fn snapshot_seq(&self, id: TxnId) -> Option<CommitSeq> {
        self.registry.get(id).map(|txn| txn.snapshot_seq())
    }

    /// Newest commit sequence visible to new transactions
    pub fn last_committed_seq(&self) -> CommitSeq {
        self.visible_seq.load(Ordering::Acquire)
    }

    /// Latest committed value of `key`, outside any transaction
    pub fn read_latest(&self, key: &[u8]) -> Option<Value> {
        self.store.read(key, self.last_committed_seq())
    }

    /// Every committed version of `key`, oldest first
    pub fn history(&self, key: &[u8]) -> Vec<VersionInfo> {
        self.store.history(key)
    }

    pub fn active_count(&self) -> usize {
        self.registry.active_count()
    }

    pub fn detector_kind(&self) -> DetectorKind {
        self.detector.kind()
    }

    pub fn stats(&self) -> CoordinatorStats {
        CoordinatorStats {
            active: self.registry.active_count(),
            committed: self.committed.load(Ordering::Relaxed),
            aborted: self.aborted.load(Ordering::Relaxed),
            conflicts: self.conflicts.load(Ordering::Relaxed),
            keys: self.store.key_count(),
            versions: self.store.version_count(),
            last_committed_seq: self.last_committed_seq(),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl Default for TransactionCoordinator {
    fn default() -> Self {
        Self::new()
    }
}
