//! Transaction Module
//!
//! Per-transaction state and the table of active transactions.
//!
//! ## Responsibilities
//! - Buffer uncommitted writes and track read sets (`TransactionContext`)
//! - Share each transaction's identity and write set with conflict
//!   detectors (`Transaction`)
//! - Track active transactions and issue sequence numbers
//!   (`TransactionRegistry`)

mod context;
mod registry;
mod transaction;

pub use context::TransactionContext;
pub use registry::TransactionRegistry;
pub use transaction::{Transaction, TxnInner};

use crate::version::CommitSeq;

/// Unique transaction identifier, drawn from the same counter as commit
/// sequences
pub type TxnId = u64;

/// Lifecycle state of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxnState {
    /// Reads and writes are allowed
    Active,

    /// Writes are visible in the version store (terminal)
    Committed,

    /// Buffered writes were discarded (terminal)
    Aborted,
}

impl TxnState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TxnState::Active)
    }
}

/// Identity of a transaction as seen by conflict detectors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxnMeta {
    pub id: TxnId,

    /// Highest commit sequence visible to this transaction's reads
    pub snapshot_seq: CommitSeq,
}
