//! Errors from the data-access layer.

use std::time::Duration;

use crate::transaction::{TransactionId, TransactionState};

pub type DataResult<T> = Result<T, DataError>;

/// Errors surfaced by the driver, the transaction manager and the repositories.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("Database error: {0}")]
    Driver(#[from] sqlx::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Migration failed: {0}")]
    Migration(String),
    #[error("Transaction {id} is already {state}")]
    InvalidTransactionState {
        id: TransactionId,
        state: TransactionState,
    },
    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },
    #[error("{failed} of {total} items failed: {}", details.join("; "))]
    Composite {
        failed: usize,
        total: usize,
        details: Vec<String>,
    },
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },
    #[error("Transaction {id} timed out after {after:?}")]
    Timeout { id: TransactionId, after: Duration },
    #[error("Failed to decode row: {0}")]
    Decode(String),
}

impl DataError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Whether this error was raised before any statement reached the store.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::Composite { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composite_message_lists_every_failure() {
        let err = DataError::Composite {
            failed: 2,
            total: 3,
            details: vec![
                "item 0: sport is required".to_string(),
                "item 2: teams must differ".to_string(),
            ],
        };
        assert_eq!(
            err.to_string(),
            "2 of 3 items failed: item 0: sport is required; item 2: teams must differ"
        );
        assert!(err.is_validation());
    }

    #[test]
    fn invalid_state_names_the_state() {
        let err = DataError::InvalidTransactionState {
            id: 7,
            state: TransactionState::Committed,
        };
        assert_eq!(err.to_string(), "Transaction 7 is already committed");
        assert!(!err.is_validation());
    }
}
