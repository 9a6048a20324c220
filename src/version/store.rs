//! Version Store
//!
//! Maps keys to their version chains and answers snapshot reads.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use super::{CommitSeq, Key, Value, VersionChain, VersionEntry, VersionInfo};

/// Committed versions of every key
///
/// ## Concurrency:
/// - `chains`: RwLock only guards the key → chain index; a lookup clones the
///   `Arc` and walks the chain after releasing the lock
/// - Chains themselves are lock-free for readers
/// - `append` is called from inside the commit critical section only
pub struct VersionStore {
    chains: RwLock<HashMap<Key, Arc<VersionChain>>>,

    /// Total versions across all chains
    version_count: AtomicUsize,
}

impl VersionStore {
    pub fn new() -> Self {
        Self {
            chains: RwLock::new(HashMap::new()),
            version_count: AtomicUsize::new(0),
        }
    }

    /// Value of the newest version of `key` with `commit_seq <= snapshot`
    ///
    /// Returns:
    /// - `Some(value)` — a live version is visible
    /// - `None` — no chain, no visible version, or the visible version is a
    ///   tombstone
    pub fn read(&self, key: &[u8], snapshot: CommitSeq) -> Option<Value> {
        self.read_entry(key, snapshot)
            .and_then(VersionEntry::into_value)
    }

    /// Like [`read`](Self::read), but keeps tombstones distinguishable
    pub fn read_entry(&self, key: &[u8], snapshot: CommitSeq) -> Option<VersionEntry> {
        self.chain(key)?.read(snapshot)
    }

    /// Append a committed version to the key's chain
    ///
    /// The caller guarantees `commit_seq` is globally monotonic and newer than
    /// every version already on the chain.
    pub fn append(&self, key: Key, entry: VersionEntry, commit_seq: CommitSeq) {
        self.chain_or_insert(key).append(entry, commit_seq);
        self.version_count.fetch_add(1, Ordering::AcqRel);
    }

    /// Record that a reader at `snapshot` observed `key`
    ///
    /// Creates an empty chain for keys with no versions so that reads of
    /// absent keys are remembered as well.
    pub fn advance_read_watermark(&self, key: &[u8], snapshot: CommitSeq) {
        match self.chain(key) {
            Some(chain) => chain.advance_read_watermark(snapshot),
            None => self
                .chain_or_insert(Key::copy_from_slice(key))
                .advance_read_watermark(snapshot),
        }
    }

    /// Commit sequence of the key's newest version (WTS)
    pub fn latest_commit_seq(&self, key: &[u8]) -> Option<CommitSeq> {
        self.chain(key)?.latest_commit_seq()
    }

    /// Highest snapshot recorded as having read the key (RTS), 0 if none
    pub fn read_timestamp(&self, key: &[u8]) -> CommitSeq {
        self.chain(key)
            .map(|chain| chain.read_timestamp())
            .unwrap_or(0)
    }

    /// Every committed version of `key`, oldest first
    pub fn history(&self, key: &[u8]) -> Vec<VersionInfo> {
        self.chain(key)
            .map(|chain| chain.history())
            .unwrap_or_default()
    }

    /// Number of keys with at least one committed version
    pub fn key_count(&self) -> usize {
        self.chains
            .read()
            .values()
            .filter(|chain| !chain.is_empty())
            .count()
    }

    /// Total number of committed versions
    pub fn version_count(&self) -> usize {
        self.version_count.load(Ordering::Acquire)
    }

    fn chain(&self, key: &[u8]) -> Option<Arc<VersionChain>> {
        self.chains.read().get(key).cloned()
    }

    fn chain_or_insert(&self, key: Key) -> Arc<VersionChain> {
        if let Some(chain) = self.chain(&key) {
            return chain;
        }

        let mut chains = self.chains.write();
        Arc::clone(chains.entry(key).or_default())
    }
}

impl Default for VersionStore {
    fn default() -> Self {
        Self::new()
    }
}
