//! # ChronoKV
//!
//! An in-process, in-memory key-value store with:
//! - Multi-version storage: every commit appends a new version per key
//! - Snapshot reads that never wait on writers
//! - Optimistic transactions with buffered writes
//! - Two interchangeable conflict detectors (active-set scan, timestamp
//!   ordering)
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  TransactionCoordinator                     │
//! │        begin / read / write / delete / commit / rollback    │
//! └──────┬───────────────────┬───────────────────────┬──────────┘
//!        │                   │                       │
//!        ▼                   ▼                       ▼
//! ┌─────────────┐   ┌──────────────────┐   ┌──────────────────┐
//! │ Transaction │   │ ConflictDetector │   │   VersionStore   │
//! │  Registry   │◄──│ (ActiveSetScan | │──►│ (per-key chains, │
//! │ (RwLock)    │   │  TimestampOrder) │   │  lock-free read) │
//! └──────┬──────┘   └──────────────────┘   └──────────────────┘
//!        │
//!        ▼
//! ┌─────────────────────┐
//! │ TransactionContext  │
//! │ (write buffer,      │
//! │  read set)          │
//! └─────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use chronokv::TransactionCoordinator;
//!
//! let db = TransactionCoordinator::new();
//!
//! let t1 = db.begin();
//! db.write(t1, "greeting", "hello").unwrap();
//! db.commit(t1).unwrap();
//!
//! let t2 = db.begin();
//! assert_eq!(db.read(t2, b"greeting").unwrap().as_deref(), Some(&b"hello"[..]));
//! db.rollback(t2);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod version;
pub mod txn;
pub mod conflict;
pub mod coordinator;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{ChronoError, Conflict, Result};
pub use config::{Config, DetectorKind};
pub use coordinator::{CoordinatorStats, TransactionCoordinator};
pub use txn::{TxnId, TxnState};
pub use version::{CommitSeq, Key, Value};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of ChronoKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
