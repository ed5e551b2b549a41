//! Transaction coordination.
//!
//! [`TransactionManager`] runs units of work inside driver transactions and
//! keeps a registry of every transaction it has opened but not yet finished,
//! so shutdown can roll them all back. [`TransactionContext`] is the manual
//! alternative for work that doesn't fit in a single closure.
//!
//! ```text
//! execute_in_transaction(options, |tx, id| async { … })
//!     begin ──► register ──► unit of work ──┬─ Ok  ──► commit   ──► deregister ──► Ok(value)
//!                                           └─ Err ──► rollback ──► deregister ──► Err(original)
//! ```

mod context;
mod handle;
mod manager;
#[cfg(test)]
pub(crate) mod mock;
mod operations;

pub use context::TransactionContext;
pub use handle::Transaction;
pub use manager::{CleanupReport, TransactionManager};
pub use operations::{operation, CompensatedOperation, TxOperation};

use std::fmt;
use std::time::Duration;

/// Process-unique, monotonically increasing transaction identifier.
pub type TransactionId = u64;

/// Lifecycle of a transaction handle. `Committed` and `RolledBack` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    Active,
    Committed,
    RolledBack,
}

impl TransactionState {
    fn as_u8(self) -> u8 {
        match self {
            TransactionState::Active => 0,
            TransactionState::Committed => 1,
            TransactionState::RolledBack => 2,
        }
    }

    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => TransactionState::Active,
            1 => TransactionState::Committed,
            _ => TransactionState::RolledBack,
        }
    }
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransactionState::Active => "active",
            TransactionState::Committed => "committed",
            TransactionState::RolledBack => "rolled_back",
        })
    }
}

/// Per-call settings for a managed transaction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionOptions {
    /// Free-form name carried into log events.
    pub label: Option<String>,
    /// Upper bound on the unit of work. Overrides the manager default.
    pub timeout: Option<Duration>,
}

impl TransactionOptions {
    pub fn labeled(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
