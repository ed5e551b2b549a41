use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use tokio::sync::{MappedMutexGuard, Mutex, MutexGuard};

use super::{TransactionId, TransactionState};
use crate::error::{DataError, DataResult};

/// Handle to one open driver session.
///
/// Clones share the session. Statements lock it one at a time through
/// [`session`](Self::session), so the handle can be held across any number
/// of awaits. Once the transaction is committed or rolled back the session is
/// gone and every further use fails with
/// [`DataError::InvalidTransactionState`].
pub struct Transaction<S> {
    inner: Arc<Inner<S>>,
}

struct Inner<S> {
    id: TransactionId,
    state: AtomicU8,
    session: Mutex<Option<S>>,
}

impl<S> Clone for Transaction<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S> fmt::Debug for Transaction<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("id", &self.inner.id)
            .field("state", &self.state())
            .finish()
    }
}

impl<S> Transaction<S> {
    pub(crate) fn new(id: TransactionId, session: S) -> Self {
        Self {
            inner: Arc::new(Inner {
                id,
                state: AtomicU8::new(TransactionState::Active.as_u8()),
                session: Mutex::new(Some(session)),
            }),
        }
    }

    pub fn id(&self) -> TransactionId {
        self.inner.id
    }

    pub fn state(&self) -> TransactionState {
        TransactionState::from_u8(self.inner.state.load(Ordering::Acquire))
    }

    pub fn is_active(&self) -> bool {
        self.state() == TransactionState::Active
    }

    /// Lock the session for the duration of one statement.
    pub async fn session(&self) -> DataResult<MappedMutexGuard<'_, S>> {
        let guard = self.inner.session.lock().await;
        MutexGuard::try_map(guard, Option::as_mut).map_err(|_| self.invalid_state())
    }

    /// Remove the session so it can be finalized, moving to `next`.
    ///
    /// The state flips under the session lock, so exactly one caller wins.
    pub(crate) async fn take_session(&self, next: TransactionState) -> DataResult<S> {
        let mut guard = self.inner.session.lock().await;
        let session = guard.take().ok_or_else(|| self.invalid_state())?;
        self.mark(next);
        Ok(session)
    }

    pub(crate) fn mark(&self, state: TransactionState) {
        self.inner.state.store(state.as_u8(), Ordering::Release);
    }

    fn invalid_state(&self) -> DataError {
        DataError::InvalidTransactionState {
            id: self.inner.id,
            state: self.state(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn clones_share_state() {
        let tx = Transaction::new(4, 10u32);
        let other = tx.clone();
        *tx.session().await.unwrap() += 1;
        assert_eq!(*other.session().await.unwrap(), 11);

        let session = other
            .take_session(TransactionState::Committed)
            .await
            .unwrap();
        assert_eq!(session, 11);
        assert_eq!(tx.state(), TransactionState::Committed);
        assert!(!tx.is_active());
    }

    #[tokio::test]
    async fn finalized_handle_is_inert() {
        let tx = Transaction::new(9, ());
        tx.take_session(TransactionState::RolledBack).await.unwrap();

        let err = tx.session().await.unwrap_err();
        assert!(matches!(
            err,
            DataError::InvalidTransactionState {
                id: 9,
                state: TransactionState::RolledBack
            }
        ));
        assert!(tx.take_session(TransactionState::Committed).await.is_err());
        assert_eq!(tx.state(), TransactionState::RolledBack);
    }
}
