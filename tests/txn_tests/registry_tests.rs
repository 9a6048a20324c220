//! Tests for TransactionRegistry and Transaction
//!
//! These tests verify:
//! - Unique, monotonic sequence numbers (also under concurrency)
//! - Register / unregister / scan semantics
//! - Idempotent unregister
//! - Write-set visibility to other transactions

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use chronokv::txn::{Transaction, TransactionRegistry, TxnState};

// =============================================================================
// Helper Functions
// =============================================================================

fn register(registry: &TransactionRegistry, snapshot: u64) -> Arc<Transaction> {
    let txn = Arc::new(Transaction::new(registry.next_seq(), snapshot));
    registry.register(Arc::clone(&txn));
    txn
}

// =============================================================================
// Sequence Tests
// =============================================================================

#[test]
fn test_sequence_starts_at_one_and_increases() {
    let registry = TransactionRegistry::new();

    assert_eq!(registry.current_seq(), 0);
    assert_eq!(registry.next_seq(), 1);
    assert_eq!(registry.next_seq(), 2);
    assert_eq!(registry.current_seq(), 2);
}

#[test]
fn test_concurrent_sequences_are_unique() {
    let registry = Arc::new(TransactionRegistry::new());

    let mut handles = vec![];
    for _ in 0..8 {
        let registry = Arc::clone(&registry);
        handles.push(thread::spawn(move || {
            (0..500).map(|_| registry.next_seq()).collect::<Vec<_>>()
        }));
    }

    let mut seen = HashSet::new();
    for handle in handles {
        for seq in handle.join().unwrap() {
            assert!(seen.insert(seq), "sequence {} issued twice", seq);
        }
    }

    assert_eq!(seen.len(), 4000);
    assert_eq!(registry.current_seq(), 4000);
}

// =============================================================================
// Register / Unregister Tests
// =============================================================================

#[test]
fn test_register_and_get() {
    let registry = TransactionRegistry::new();
    let txn = register(&registry, 0);

    assert!(registry.contains(txn.id()));
    assert_eq!(registry.get(txn.id()).map(|t| t.id()), Some(txn.id()));
    assert_eq!(registry.active_count(), 1);
}

#[test]
fn test_unregister_removes() {
    let registry = TransactionRegistry::new();
    let txn = register(&registry, 0);

    assert!(registry.unregister(txn.id()).is_some());
    assert!(!registry.contains(txn.id()));
    assert_eq!(registry.active_count(), 0);
}

#[test]
fn test_unregister_unknown_is_noop() {
    let registry = TransactionRegistry::new();
    let txn = register(&registry, 0);

    assert!(registry.unregister(999).is_none());
    assert!(registry.unregister(txn.id()).is_some());
    assert!(registry.unregister(txn.id()).is_none());
}

#[test]
fn test_active_snapshot_is_a_copy() {
    let registry = TransactionRegistry::new();
    let t1 = register(&registry, 0);
    let t2 = register(&registry, 0);

    let snapshot = registry.active_snapshot();
    registry.unregister(t1.id());

    let ids: HashSet<_> = snapshot.iter().map(|t| t.id()).collect();
    assert_eq!(ids, HashSet::from([t1.id(), t2.id()]));
    assert_eq!(registry.active_count(), 1);
}

#[test]
fn test_concurrent_register_and_scan() {
    let registry = Arc::new(TransactionRegistry::new());

    let mut handles = vec![];
    for _ in 0..4 {
        let registry = Arc::clone(&registry);
        handles.push(thread::spawn(move || {
            for _ in 0..200 {
                let txn = register(&registry, 0);
                assert!(registry.active_snapshot().iter().any(|t| t.id() == txn.id()));
                registry.unregister(txn.id());
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(registry.active_count(), 0);
}

// =============================================================================
// Transaction Handle Tests
// =============================================================================

#[test]
fn test_new_transaction_is_active() {
    let txn = Transaction::new(3, 2);

    assert_eq!(txn.id(), 3);
    assert_eq!(txn.snapshot_seq(), 2);
    assert_eq!(txn.state(), TxnState::Active);
    assert!(!txn.writes_key(b"anything"));
}

#[test]
fn test_terminal_states() {
    assert!(!TxnState::Active.is_terminal());
    assert!(TxnState::Committed.is_terminal());
    assert!(TxnState::Aborted.is_terminal());
}
