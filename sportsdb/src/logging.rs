//! Transaction lifecycle logging.
//!
//! The transaction manager doesn't log through a global; it is handed an
//! `Arc<dyn TransactionLogger>`. [`TracingLogger`] forwards every event to
//! `tracing`, [`MemoryLogger`] keeps them in memory so tests can assert on
//! swallowed failures.

use std::sync::Mutex;

use tracing_subscriber::fmt::format::{DefaultFields, FmtSpan, Format};
use tracing_subscriber::fmt::SubscriberBuilder;
use tracing_subscriber::EnvFilter;

use crate::transaction::TransactionId;

/// Something worth recording about a transaction.
#[derive(Debug, Clone, PartialEq)]
pub enum TxEvent {
    Begun {
        id: TransactionId,
        label: Option<String>,
    },
    Committed {
        id: TransactionId,
    },
    RolledBack {
        id: TransactionId,
        reason: String,
    },
    CommitFailed {
        id: TransactionId,
        error: String,
    },
    RollbackFailed {
        id: TransactionId,
        error: String,
    },
    CompensatorFailed {
        index: usize,
        error: String,
    },
    ForcedRollback {
        id: TransactionId,
    },
    ForcedRollbackFailed {
        id: TransactionId,
        error: String,
    },
}

/// Sink for [`TxEvent`]s. Implementations must not panic or block.
pub trait TransactionLogger: Send + Sync {
    fn record(&self, event: &TxEvent);
}

/// Emits structured `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl TransactionLogger for TracingLogger {
    fn record(&self, event: &TxEvent) {
        match event {
            TxEvent::Begun { id, label } => {
                tracing::debug!(transaction_id = id, label = ?label, "transaction begun");
            }
            TxEvent::Committed { id } => {
                tracing::debug!(transaction_id = id, "transaction committed");
            }
            TxEvent::RolledBack { id, reason } => {
                tracing::debug!(transaction_id = id, %reason, "transaction rolled back");
            }
            TxEvent::CommitFailed { id, error } => {
                tracing::error!(transaction_id = id, %error, "commit failed");
            }
            TxEvent::RollbackFailed { id, error } => {
                tracing::warn!(transaction_id = id, %error, "rollback failed");
            }
            TxEvent::CompensatorFailed { index, error } => {
                tracing::warn!(operation = index, %error, "compensating action failed");
            }
            TxEvent::ForcedRollback { id } => {
                tracing::info!(transaction_id = id, "forced rollback during cleanup");
            }
            TxEvent::ForcedRollbackFailed { id, error } => {
                tracing::warn!(transaction_id = id, %error, "forced rollback failed");
            }
        }
    }
}

/// Keeps every event in memory, in arrival order.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    events: Mutex<Vec<TxEvent>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<TxEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl TransactionLogger for MemoryLogger {
    fn record(&self, event: &TxEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

fn subscriber_builder() -> SubscriberBuilder<DefaultFields, Format, EnvFilter> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_span_events(FmtSpan::CLOSE)
}

/// Install a `fmt` subscriber filtered by `RUST_LOG` (default `info`).
///
/// Returns `false` if a global subscriber was already installed.
pub fn init_tracing() -> bool {
    subscriber_builder().try_init().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_logger_keeps_order() {
        let logger = MemoryLogger::new();
        logger.record(&TxEvent::Begun { id: 1, label: None });
        logger.record(&TxEvent::Committed { id: 1 });
        assert_eq!(
            logger.events(),
            vec![
                TxEvent::Begun { id: 1, label: None },
                TxEvent::Committed { id: 1 }
            ]
        );
    }

    #[test]
    fn tracing_logger_writes_through_the_configured_subscriber() {
        let subscriber = subscriber_builder().with_test_writer().finish();
        tracing::subscriber::with_default(subscriber, || {
            TracingLogger.record(&TxEvent::Begun {
                id: 3,
                label: Some("import".to_string()),
            });
            TracingLogger.record(&TxEvent::RollbackFailed {
                id: 3,
                error: "disk I/O error".to_string(),
            });
        });
    }
}
