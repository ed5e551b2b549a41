//! Boxed operations for the batch entry points of the manager.

use std::future::Future;

use futures::future::BoxFuture;

use super::Transaction;

/// One step of a [`TransactionManager`] batch.
///
/// [`TransactionManager`]: super::TransactionManager
pub type TxOperation<S, T, E> =
    Box<dyn FnOnce(Transaction<S>) -> BoxFuture<'static, Result<T, E>> + Send>;

/// Box a closure as a [`TxOperation`].
pub fn operation<S, T, E, F, Fut>(f: F) -> TxOperation<S, T, E>
where
    S: 'static,
    F: FnOnce(Transaction<S>) -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    Box::new(move |tx| Box::pin(f(tx)) as BoxFuture<'static, Result<T, E>>)
}

type Execute<S, T, E> = TxOperation<S, T, E>;
type Compensate<E> = Box<dyn FnOnce() -> BoxFuture<'static, Result<(), E>> + Send>;

/// A forward action run inside the batch transaction and, optionally, the
/// action that undoes its effects outside the store.
pub struct CompensatedOperation<S, T, E> {
    execute: Execute<S, T, E>,
    rollback: Option<Compensate<E>>,
}

impl<S: 'static, T: 'static, E: 'static> CompensatedOperation<S, T, E> {
    pub fn new<F, Fut>(execute: F) -> Self
    where
        F: FnOnce(Transaction<S>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        Self {
            execute: operation(execute),
            rollback: None,
        }
    }

    /// Runs after the batch transaction has been rolled back, so it gets no
    /// handle.
    pub fn with_rollback<F, Fut>(mut self, rollback: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
    {
        self.rollback = Some(Box::new(move || {
            Box::pin(rollback()) as BoxFuture<'static, Result<(), E>>
        }));
        self
    }
}

impl<S, T, E> CompensatedOperation<S, T, E> {
    pub fn has_rollback(&self) -> bool {
        self.rollback.is_some()
    }

    pub(crate) fn into_parts(self) -> (Execute<S, T, E>, Option<Compensate<E>>) {
        (self.execute, self.rollback)
    }
}
