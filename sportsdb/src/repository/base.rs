//! Statement passthrough shared by the concrete repositories.

use super::DriverTransaction;
use crate::driver::{Driver, ExecResult};
use crate::error::DataResult;
use crate::query::{PlaceholderStyle, QueryFragment, Statement};

/// Runs statements for one table against the pool or a supplied transaction.
#[derive(Clone)]
pub struct RepositoryBase<D: Driver> {
    driver: D,
    table: &'static str,
}

impl<D: Driver> RepositoryBase<D> {
    pub fn new(driver: D, table: &'static str) -> Self {
        Self { driver, table }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn table(&self) -> &'static str {
        self.table
    }

    pub fn style(&self) -> PlaceholderStyle {
        D::PLACEHOLDER_STYLE
    }

    /// Fetch rows, inside `tx` when given.
    pub async fn query(
        &self,
        statement: &Statement,
        tx: Option<&DriverTransaction<D>>,
    ) -> DataResult<Vec<D::Row>> {
        tracing::trace!(sql = %statement.sql, params = statement.params.len(), "query");
        match tx {
            Some(tx) => {
                let mut session = tx.session().await?;
                self.driver
                    .query(&statement.sql, &statement.params, Some(&mut *session))
                    .await
            }
            None => {
                self.driver
                    .query(&statement.sql, &statement.params, None)
                    .await
            }
        }
    }

    /// Execute a write, inside `tx` when given.
    pub async fn exec(
        &self,
        statement: &Statement,
        tx: Option<&DriverTransaction<D>>,
    ) -> DataResult<ExecResult> {
        tracing::trace!(sql = %statement.sql, params = statement.params.len(), "exec");
        match tx {
            Some(tx) => {
                let mut session = tx.session().await?;
                self.driver
                    .exec(&statement.sql, &statement.params, Some(&mut *session))
                    .await
            }
            None => {
                self.driver
                    .exec(&statement.sql, &statement.params, None)
                    .await
            }
        }
    }

    /// `<prefix> WHERE id = ?1`
    pub fn by_id(&self, prefix: &str, id: i64) -> Statement {
        let mut statement = QueryFragment::new(self.style(), 1);
        statement.push_sql(prefix).push_sql(" WHERE id = ").bind(id);
        statement.finish()
    }

    pub async fn delete_by_id(
        &self,
        id: i64,
        tx: Option<&DriverTransaction<D>>,
    ) -> DataResult<bool> {
        let statement = self.by_id(&format!("DELETE FROM {}", self.table), id);
        Ok(self.exec(&statement, tx).await?.affected_rows > 0)
    }

    pub async fn exists_by_id(
        &self,
        id: i64,
        tx: Option<&DriverTransaction<D>>,
    ) -> DataResult<bool> {
        let mut statement = QueryFragment::new(self.style(), 1);
        statement
            .push_sql(&format!("SELECT 1 FROM {} WHERE id = ", self.table))
            .bind(id)
            .push_sql(" LIMIT 1");
        Ok(!self.query(&statement.finish(), tx).await?.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::Value;
    use crate::error::DataError;
    use crate::transaction::mock::{MockCall, MockDriver};
    use crate::transaction::{TransactionManager, TransactionOptions};

    #[tokio::test]
    async fn statements_without_tx_use_the_pool() {
        let driver = MockDriver::new();
        let base = RepositoryBase::new(driver.clone(), "teams");
        let statement = base.by_id("SELECT name FROM teams", 3);
        base.query(&statement, None).await.unwrap();

        assert_eq!(
            driver.calls(),
            vec![MockCall::Query {
                session: None,
                sql: "SELECT name FROM teams WHERE id = $1".to_string(),
                params: vec![Value::Integer(3)],
            }]
        );
    }

    #[tokio::test]
    async fn statements_with_tx_use_its_session() {
        let driver = MockDriver::new();
        let manager = TransactionManager::new(driver.clone());
        let base = RepositoryBase::new(driver.clone(), "teams");

        manager
            .execute_in_transaction(TransactionOptions::default(), |tx, _| async move {
                base.delete_by_id(8, Some(&tx)).await?;
                base.exists_by_id(8, Some(&tx)).await?;
                Ok::<_, DataError>(())
            })
            .await
            .unwrap();

        let calls = driver.calls();
        assert_eq!(calls.len(), 4);
        assert_eq!(calls[0], MockCall::Begin(1));
        let sessions_and_sql: Vec<_> = calls[1..3]
            .iter()
            .map(|call| match call {
                MockCall::Query { session, sql, .. } => (*session, sql.as_str()),
                other => panic!("expected a query, got {other:?}"),
            })
            .collect();
        assert_eq!(
            sessions_and_sql,
            vec![
                (Some(1), "DELETE FROM teams WHERE id = $1"),
                (Some(1), "SELECT 1 FROM teams WHERE id = $1 LIMIT 1"),
            ]
        );
        assert_eq!(calls[3], MockCall::Commit(1));
    }

    #[tokio::test]
    async fn finished_tx_is_refused() {
        let driver = MockDriver::new();
        let manager = TransactionManager::new(driver.clone());
        let base = RepositoryBase::new(driver.clone(), "games");
        let ctx = manager.create_transaction_context().await.unwrap();
        ctx.commit().await.unwrap();

        let err = base.exists_by_id(1, Some(ctx.transaction())).await.unwrap_err();
        assert!(matches!(err, DataError::InvalidTransactionState { .. }));
    }
}
