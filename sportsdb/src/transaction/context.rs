use super::{Transaction, TransactionId, TransactionManager, TransactionState};
use crate::driver::Driver;
use crate::error::{DataError, DataResult};

/// A transaction whose end the caller decides.
///
/// Obtained from [`TransactionManager::create_transaction_context`]. Pass
/// [`transaction`](Self::transaction) to repository calls, then call exactly
/// one of [`commit`](Self::commit) or [`rollback`](Self::rollback). A context
/// dropped while active stays registered until the manager's
/// `force_rollback_all`.
pub struct TransactionContext<D: Driver> {
    manager: TransactionManager<D>,
    tx: Transaction<D::Session>,
}

impl<D: Driver> TransactionContext<D> {
    pub(crate) fn new(manager: TransactionManager<D>, tx: Transaction<D::Session>) -> Self {
        Self { manager, tx }
    }

    pub fn id(&self) -> TransactionId {
        self.tx.id()
    }

    pub fn transaction(&self) -> &Transaction<D::Session> {
        &self.tx
    }

    pub fn state(&self) -> TransactionState {
        self.tx.state()
    }

    pub fn is_active(&self) -> bool {
        self.tx.is_active()
    }

    fn ensure_active(&self) -> DataResult<()> {
        match self.state() {
            TransactionState::Active => Ok(()),
            state => Err(DataError::InvalidTransactionState {
                id: self.id(),
                state,
            }),
        }
    }

    pub async fn commit(&self) -> DataResult<()> {
        self.ensure_active()?;
        self.manager.commit_transaction(&self.tx).await
    }

    pub async fn rollback(&self) -> DataResult<()> {
        self.ensure_active()?;
        self.manager
            .rollback_transaction(&self.tx, "rolled back by caller")
            .await
    }
}
