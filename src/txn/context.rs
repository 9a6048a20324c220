//! Transaction Context - per-transaction read/write sets
//!
//! Writes are buffered here until commit; nothing else observes them.

use std::collections::{BTreeMap, BTreeSet};

use crate::version::{Key, VersionEntry};

/// Buffered writes and read set of a single transaction
///
/// Owned by its transaction; other components only inspect it.
#[derive(Debug, Default)]
pub struct TransactionContext {
    /// Uncommitted writes: key → value or tombstone
    write_set: BTreeMap<Key, VersionEntry>,

    /// Keys read from the version store, re-validated at commit
    read_set: BTreeSet<Key>,
}

impl TransactionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// This transaction's own uncommitted write for `key`, if any
    pub fn buffered(&self, key: &[u8]) -> Option<&VersionEntry> {
        self.write_set.get(key)
    }

    /// Buffer a write, replacing any earlier write to the same key
    pub fn buffer_write(&mut self, key: Key, entry: VersionEntry) {
        self.write_set.insert(key, entry);
    }

    pub fn record_read(&mut self, key: Key) {
        self.read_set.insert(key);
    }

    pub fn has_write(&self, key: &[u8]) -> bool {
        self.write_set.contains_key(key)
    }

    pub fn has_read(&self, key: &[u8]) -> bool {
        self.read_set.contains(key)
    }

    pub fn read_keys(&self) -> impl Iterator<Item = &Key> {
        self.read_set.iter()
    }

    pub fn write_keys(&self) -> impl Iterator<Item = &Key> {
        self.write_set.keys()
    }

    pub fn is_read_only(&self) -> bool {
        self.write_set.is_empty()
    }

    pub fn write_count(&self) -> usize {
        self.write_set.len()
    }

    pub fn read_count(&self) -> usize {
        self.read_set.len()
    }

    /// Move the buffered writes out, in key order
    pub fn take_writes(&mut self) -> BTreeMap<Key, VersionEntry> {
        std::mem::take(&mut self.write_set)
    }

    /// Discard everything (rollback)
    pub fn clear(&mut self) {
        self.write_set.clear();
        self.read_set.clear();
    }
}
