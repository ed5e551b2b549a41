use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use super::operations::{CompensatedOperation, TxOperation};
use super::{
    Transaction, TransactionContext, TransactionId, TransactionOptions, TransactionState,
};
use crate::config::DataConfig;
use crate::driver::Driver;
use crate::error::{DataError, DataResult};
use crate::logging::{TracingLogger, TransactionLogger, TxEvent};

/// Runs units of work inside driver transactions.
///
/// Cloning is cheap; clones share the driver, the id counter and the
/// registry of open transactions.
pub struct TransactionManager<D: Driver> {
    inner: Arc<ManagerInner<D>>,
}

struct ManagerInner<D: Driver> {
    driver: D,
    registry: RwLock<HashMap<TransactionId, Transaction<D::Session>>>,
    next_id: AtomicU64,
    logger: Arc<dyn TransactionLogger>,
    default_timeout: Option<Duration>,
}

impl<D: Driver> Clone for TransactionManager<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// What [`TransactionManager::force_rollback_all`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub rolled_back: Vec<TransactionId>,
    pub failed: Vec<TransactionId>,
}

impl<D: Driver> TransactionManager<D> {
    /// A manager that logs through `tracing`.
    pub fn new(driver: D) -> Self {
        Self::build(driver, Arc::new(TracingLogger), None)
    }

    pub fn with_logger(driver: D, logger: Arc<dyn TransactionLogger>) -> Self {
        Self::build(driver, logger, None)
    }

    /// Like [`with_logger`](Self::with_logger), taking the default timeout
    /// from `config`.
    pub fn from_config(driver: D, config: &DataConfig, logger: Arc<dyn TransactionLogger>) -> Self {
        Self::build(driver, logger, config.transaction_timeout)
    }

    fn build(
        driver: D,
        logger: Arc<dyn TransactionLogger>,
        default_timeout: Option<Duration>,
    ) -> Self {
        Self {
            inner: Arc::new(ManagerInner {
                driver,
                registry: RwLock::new(HashMap::new()),
                next_id: AtomicU64::new(1),
                logger,
                default_timeout,
            }),
        }
    }

    pub fn driver(&self) -> &D {
        &self.inner.driver
    }

    /// Number of transactions begun but not yet committed or rolled back.
    pub async fn open_transaction_count(&self) -> usize {
        self.inner.registry.read().await.len()
    }

    pub async fn is_open(&self, id: TransactionId) -> bool {
        self.inner.registry.read().await.contains_key(&id)
    }

    fn log(&self, event: TxEvent) {
        self.inner.logger.record(&event);
    }

    /// Assign an id, begin on the driver, register. Nothing is registered if
    /// the driver fails.
    async fn begin(&self, label: Option<&str>) -> DataResult<Transaction<D::Session>> {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let session = self.inner.driver.begin().await?;
        let tx = Transaction::new(id, session);
        self.inner.registry.write().await.insert(id, tx.clone());
        self.log(TxEvent::Begun {
            id,
            label: label.map(str::to_string),
        });
        Ok(tx)
    }

    async fn deregister(&self, id: TransactionId) {
        self.inner.registry.write().await.remove(&id);
    }

    pub(crate) async fn commit_transaction(&self, tx: &Transaction<D::Session>) -> DataResult<()> {
        let id = tx.id();
        let session = match tx.take_session(TransactionState::Committed).await {
            Ok(session) => session,
            Err(err) => {
                self.deregister(id).await;
                return Err(err);
            }
        };
        let result = self.inner.driver.commit(session).await;
        self.deregister(id).await;
        match result {
            Ok(()) => {
                self.log(TxEvent::Committed { id });
                Ok(())
            }
            Err(err) => {
                // The driver discarded the session; nothing was committed.
                tx.mark(TransactionState::RolledBack);
                self.log(TxEvent::CommitFailed {
                    id,
                    error: err.to_string(),
                });
                Err(err)
            }
        }
    }

    pub(crate) async fn rollback_transaction(
        &self,
        tx: &Transaction<D::Session>,
        reason: &str,
    ) -> DataResult<()> {
        let id = tx.id();
        let session = match tx.take_session(TransactionState::RolledBack).await {
            Ok(session) => session,
            Err(err) => {
                self.deregister(id).await;
                return Err(err);
            }
        };
        let result = self.inner.driver.rollback(session).await;
        self.deregister(id).await;
        match result {
            Ok(()) => {
                self.log(TxEvent::RolledBack {
                    id,
                    reason: reason.to_string(),
                });
                Ok(())
            }
            Err(err) => {
                self.log(TxEvent::RollbackFailed {
                    id,
                    error: err.to_string(),
                });
                Err(err)
            }
        }
    }

    /// Run `unit_of_work` inside one transaction.
    ///
    /// Commits if the unit of work returns `Ok`. Otherwise rolls back and
    /// returns the unit of work's own error; a failing rollback is logged and
    /// never replaces it. A failing commit is returned as is. When a timeout
    /// applies and expires, the unit of work is dropped, the transaction rolled
    /// back, and [`DataError::Timeout`] returned.
    pub async fn execute_in_transaction<T, E, F, Fut>(
        &self,
        options: TransactionOptions,
        unit_of_work: F,
    ) -> Result<T, E>
    where
        F: FnOnce(Transaction<D::Session>, TransactionId) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<DataError> + Display,
    {
        let tx = self.begin(options.label.as_deref()).await?;
        let id = tx.id();

        let work = unit_of_work(tx.clone(), id);
        let outcome = match options.timeout.or(self.inner.default_timeout) {
            Some(limit) => match tokio::time::timeout(limit, work).await {
                Ok(outcome) => outcome,
                Err(_) => Err(E::from(DataError::Timeout { id, after: limit })),
            },
            None => work.await,
        };

        match outcome {
            Ok(value) => {
                self.commit_transaction(&tx).await?;
                Ok(value)
            }
            Err(err) => {
                // Rollback failures are already logged; the caller sees `err`.
                let _ = self.rollback_transaction(&tx, &err.to_string()).await;
                Err(err)
            }
        }
    }

    /// Run `operations` in order inside one transaction, collecting results.
    /// The first failure rolls back everything, including earlier steps.
    pub async fn execute_multiple_in_transaction<T, E>(
        &self,
        operations: Vec<TxOperation<D::Session, T, E>>,
    ) -> Result<Vec<T>, E>
    where
        E: From<DataError> + Display,
    {
        self.execute_in_transaction(TransactionOptions::default(), |tx, _| async move {
            let mut results = Vec::with_capacity(operations.len());
            for operation in operations {
                results.push(operation(tx.clone()).await?);
            }
            Ok(results)
        })
        .await
    }

    /// Run forward operations in order inside one transaction, registering
    /// each compensator as soon as its forward action succeeds.
    ///
    /// On the first failure the transaction is rolled back, then the
    /// registered compensators run newest-first; each failure among them is
    /// logged and the rest still run. The triggering error is returned.
    /// Operations that never ran have nothing to undo and are not touched.
    pub async fn execute_with_rollback_on_failure<T, E>(
        &self,
        operations: Vec<CompensatedOperation<D::Session, T, E>>,
    ) -> Result<Vec<T>, E>
    where
        E: From<DataError> + Display,
    {
        let mut compensators = Vec::new();
        let outcome = self
            .execute_in_transaction(TransactionOptions::default(), |tx, _| {
                let compensators = &mut compensators;
                async move {
                    let mut results = Vec::with_capacity(operations.len());
                    for (index, operation) in operations.into_iter().enumerate() {
                        let (execute, rollback) = operation.into_parts();
                        results.push(execute(tx.clone()).await?);
                        if let Some(rollback) = rollback {
                            compensators.push((index, rollback));
                        }
                    }
                    Ok(results)
                }
            })
            .await;

        if outcome.is_err() {
            while let Some((done, rollback)) = compensators.pop() {
                if let Err(err) = rollback().await {
                    self.log(TxEvent::CompensatorFailed {
                        index: done,
                        error: err.to_string(),
                    });
                }
            }
        }
        outcome
    }

    /// Roll back every open transaction and empty the registry. Never fails;
    /// per-transaction failures are logged and reported.
    pub async fn force_rollback_all(&self) -> CleanupReport {
        let mut open: Vec<_> = self
            .inner
            .registry
            .write()
            .await
            .drain()
            .map(|(_, tx)| tx)
            .collect();
        open.sort_by_key(Transaction::id);

        let mut report = CleanupReport::default();
        for tx in open {
            let id = tx.id();
            // Err means another path finalized it after the drain.
            let Ok(session) = tx.take_session(TransactionState::RolledBack).await else {
                continue;
            };
            match self.inner.driver.rollback(session).await {
                Ok(()) => {
                    self.log(TxEvent::ForcedRollback { id });
                    report.rolled_back.push(id);
                }
                Err(err) => {
                    self.log(TxEvent::ForcedRollbackFailed {
                        id,
                        error: err.to_string(),
                    });
                    report.failed.push(id);
                }
            }
        }
        report
    }

    /// Roll back everything still open, then disconnect the driver.
    pub async fn shutdown(&self) -> CleanupReport {
        let report = self.force_rollback_all().await;
        self.inner.driver.disconnect().await;
        report
    }

    /// Begin a transaction whose commit/rollback the caller drives.
    pub async fn create_transaction_context(&self) -> DataResult<TransactionContext<D>> {
        let tx = self.begin(None).await?;
        Ok(TransactionContext::new(self.clone(), tx))
    }
}
