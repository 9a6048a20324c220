//! Tests for VersionStore
//!
//! These tests verify:
//! - Snapshot visibility (newest version with commit_seq <= snapshot)
//! - Tombstone handling
//! - Append-only history
//! - Read watermarks
//! - Concurrent readers while versions are appended

use std::sync::Arc;
use std::thread;

use bytes::Bytes;
use chronokv::version::{VersionEntry, VersionStore};
use proptest::prelude::*;

// =============================================================================
// Helper Functions
// =============================================================================

fn value(s: &str) -> VersionEntry {
    VersionEntry::Value(Bytes::copy_from_slice(s.as_bytes()))
}

fn key(s: &'static str) -> Bytes {
    Bytes::from_static(s.as_bytes())
}

// =============================================================================
// Snapshot Visibility Tests
// =============================================================================

#[test]
fn test_read_missing_key() {
    let store = VersionStore::new();
    assert_eq!(store.read(b"missing", 100), None);
    assert_eq!(store.latest_commit_seq(b"missing"), None);
}

#[test]
fn test_read_before_first_version_is_absent() {
    let store = VersionStore::new();
    store.append(key("k"), value("v1"), 5);

    assert_eq!(store.read(b"k", 4), None);
    assert_eq!(store.read(b"k", 5), Some(Bytes::from_static(b"v1")));
}

#[test]
fn test_read_returns_newest_visible_version() {
    let store = VersionStore::new();
    store.append(key("k"), value("v1"), 2);
    store.append(key("k"), value("v2"), 4);
    store.append(key("k"), value("v3"), 8);

    assert_eq!(store.read(b"k", 3), Some(Bytes::from_static(b"v1")));
    assert_eq!(store.read(b"k", 4), Some(Bytes::from_static(b"v2")));
    assert_eq!(store.read(b"k", 7), Some(Bytes::from_static(b"v2")));
    assert_eq!(store.read(b"k", u64::MAX), Some(Bytes::from_static(b"v3")));
}

#[test]
fn test_keys_are_independent() {
    let store = VersionStore::new();
    store.append(key("a"), value("1"), 1);
    store.append(key("b"), value("2"), 2);

    assert_eq!(store.read(b"a", 10), Some(Bytes::from_static(b"1")));
    assert_eq!(store.read(b"b", 1), None);
    assert_eq!(store.key_count(), 2);
    assert_eq!(store.version_count(), 2);
}

// =============================================================================
// Tombstone Tests
// =============================================================================

#[test]
fn test_tombstone_hides_older_value() {
    let store = VersionStore::new();
    store.append(key("k"), value("v1"), 1);
    store.append(key("k"), VersionEntry::Tombstone, 3);

    assert_eq!(store.read(b"k", 2), Some(Bytes::from_static(b"v1")));
    assert_eq!(store.read(b"k", 3), None);
    assert_eq!(store.read_entry(b"k", 3), Some(VersionEntry::Tombstone));
}

#[test]
fn test_value_after_tombstone() {
    let store = VersionStore::new();
    store.append(key("k"), VersionEntry::Tombstone, 1);
    store.append(key("k"), value("back"), 2);

    assert_eq!(store.read(b"k", 1), None);
    assert_eq!(store.read(b"k", 2), Some(Bytes::from_static(b"back")));
}

// =============================================================================
// History Tests
// =============================================================================

#[test]
fn test_history_is_oldest_first_and_append_only() {
    let store = VersionStore::new();
    store.append(key("k"), value("a"), 1);
    store.append(key("k"), value("b"), 5);

    let before = store.history(b"k");
    store.append(key("k"), value("c"), 9);
    let after = store.history(b"k");

    let seqs: Vec<_> = after.iter().map(|v| v.commit_seq).collect();
    assert_eq!(seqs, vec![1, 5, 9]);
    assert_eq!(&after[..2], &before[..]);
}

#[test]
fn test_history_of_missing_key_is_empty() {
    let store = VersionStore::new();
    assert!(store.history(b"nope").is_empty());
}

// =============================================================================
// Read Watermark Tests
// =============================================================================

#[test]
fn test_watermark_advances_visible_version_only() {
    let store = VersionStore::new();
    store.append(key("k"), value("a"), 2);
    store.append(key("k"), value("b"), 6);

    store.advance_read_watermark(b"k", 4);

    let history = store.history(b"k");
    assert_eq!(history[0].read_watermark, 4);
    assert_eq!(history[1].read_watermark, 0);
    assert_eq!(store.read_timestamp(b"k"), 4);
}

#[test]
fn test_watermark_never_moves_backwards() {
    let store = VersionStore::new();
    store.append(key("k"), value("a"), 1);

    store.advance_read_watermark(b"k", 10);
    store.advance_read_watermark(b"k", 3);

    assert_eq!(store.read_timestamp(b"k"), 10);
    assert_eq!(store.history(b"k")[0].read_watermark, 10);
}

#[test]
fn test_watermark_on_absent_key_is_remembered() {
    let store = VersionStore::new();

    store.advance_read_watermark(b"ghost", 7);

    assert_eq!(store.read_timestamp(b"ghost"), 7);
    assert_eq!(store.read(b"ghost", 100), None);
    assert_eq!(store.key_count(), 0);
}

// =============================================================================
// Concurrent Access Tests
// =============================================================================

#[test]
fn test_concurrent_reads_during_appends() {
    let store = Arc::new(VersionStore::new());
    store.append(key("k"), value("0"), 1);

    let writer = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            for seq in 2..=500u64 {
                store.append(key("k"), value(&seq.to_string()), seq);
            }
        })
    };

    let mut readers = vec![];
    for _ in 0..4 {
        let store = Arc::clone(&store);
        readers.push(thread::spawn(move || {
            for _ in 0..500 {
                // A snapshot pinned at 1 must never see later versions
                assert_eq!(store.read(b"k", 1), Some(Bytes::from_static(b"0")));

                if let Some(latest) = store.latest_commit_seq(b"k") {
                    let seen = store.read(b"k", latest).unwrap();
                    let expected = if latest == 1 { "0".to_string() } else { latest.to_string() };
                    assert_eq!(seen, Bytes::from(expected));
                }
            }
        }));
    }

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }

    assert_eq!(store.history(b"k").len(), 500);
}

// =============================================================================
// Property Tests
// =============================================================================

proptest! {
    /// read(k, s) is the value of the newest version with commit_seq <= s
    #[test]
    fn prop_snapshot_visibility(
        gaps in prop::collection::vec(1u64..5, 1..20),
        tombstones in prop::collection::vec(any::<bool>(), 20),
        snapshot in 0u64..120,
    ) {
        let store = VersionStore::new();
        let mut seq = 0;
        let mut committed = Vec::new();

        for (i, gap) in gaps.iter().enumerate() {
            seq += gap;
            let entry = if tombstones[i] {
                VersionEntry::Tombstone
            } else {
                value(&format!("v{}", i))
            };
            store.append(key("k"), entry.clone(), seq);
            committed.push((seq, entry));
        }

        let expected = committed
            .iter()
            .rev()
            .find(|(s, _)| *s <= snapshot)
            .and_then(|(_, entry)| entry.clone().into_value());

        prop_assert_eq!(store.read(b"k", snapshot), expected);
    }
}
