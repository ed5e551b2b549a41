//! SQLite driver: a `sqlx::SqlitePool` plus the embedded schema.
//!
//! The pool is configured with:
//! - **WAL mode** — one writer and multiple concurrent readers, so pool reads
//!   don't block behind an open transaction.
//! - **Foreign keys enabled** — enforced at the connection level.
//! - **Embedded migrations** — `sqlx::migrate!` applies `migrations/` on open.
//!   The schema is idempotent.
//!
//! A session is a `sqlx::Transaction`, so a session that is dropped without
//! commit or rollback is still rolled back when its connection returns to
//! the pool.

use std::path::Path;
use std::str::FromStr;

use sqlx::query::Query;
use sqlx::sqlite::{
    SqliteArguments, SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow,
    SqliteSynchronous,
};
use sqlx::{Sqlite, SqlitePool};

use super::{Driver, ExecResult, Value};
use crate::config::DataConfig;
use crate::error::{DataError, DataResult};
use crate::query::PlaceholderStyle;

/// Holds a connection pool to the SQLite database.
#[derive(Clone)]
pub struct SqliteDriver {
    pool: SqlitePool,
}

impl SqliteDriver {
    /// Open (or create) the database described by `config`, run migrations,
    /// and return a ready-to-use driver.
    pub async fn open(config: &DataConfig) -> DataResult<Self> {
        Self::open_path(&config.database_path, config.max_connections).await
    }

    /// Open (or create) the database file at `path`.
    pub async fn open_path(path: &Path, max_connections: u32) -> DataResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await?;

        let driver = Self { pool };
        driver.run_migrations().await?;
        tracing::info!("Opened SQLite database at {}", path.display());
        Ok(driver)
    }

    /// Create an in-memory database for testing. Migrations are applied.
    ///
    /// The pool has a single connection: a pool read issued while a
    /// transaction is open waits for that transaction to finish.
    #[cfg(test)]
    pub async fn new_in_memory() -> DataResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let driver = Self { pool };
        driver.run_migrations().await?;
        Ok(driver)
    }

    /// Run embedded migrations from `sportsdb/migrations/`.
    async fn run_migrations(&self) -> DataResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| DataError::Migration(e.to_string()))?;
        Ok(())
    }

    /// Get a reference to the underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn bind_values<'q>(
    mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    params: &[Value],
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    for value in params {
        query = match value {
            Value::Null => query.bind(None::<String>),
            Value::Integer(v) => query.bind(*v),
            Value::Real(v) => query.bind(*v),
            Value::Text(v) => query.bind(v.clone()),
        };
    }
    query
}

impl Driver for SqliteDriver {
    type Session = sqlx::Transaction<'static, Sqlite>;
    type Row = SqliteRow;

    const PLACEHOLDER_STYLE: PlaceholderStyle = PlaceholderStyle::QuestionNumbered;

    async fn connect(&self) -> DataResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn disconnect(&self) {
        self.pool.close().await;
        tracing::info!("SQLite pool closed");
    }

    async fn begin(&self) -> DataResult<Self::Session> {
        Ok(self.pool.begin().await?)
    }

    async fn commit(&self, session: Self::Session) -> DataResult<()> {
        session.commit().await?;
        Ok(())
    }

    async fn rollback(&self, session: Self::Session) -> DataResult<()> {
        session.rollback().await?;
        Ok(())
    }

    async fn query(
        &self,
        sql: &str,
        params: &[Value],
        session: Option<&mut Self::Session>,
    ) -> DataResult<Vec<SqliteRow>> {
        let query = bind_values(sqlx::query(sql), params);
        let rows = match session {
            Some(tx) => query.fetch_all(&mut **tx).await?,
            None => query.fetch_all(&self.pool).await?,
        };
        Ok(rows)
    }

    async fn exec(
        &self,
        sql: &str,
        params: &[Value],
        session: Option<&mut Self::Session>,
    ) -> DataResult<ExecResult> {
        let query = bind_values(sqlx::query(sql), params);
        let done = match session {
            Some(tx) => query.execute(&mut **tx).await?,
            None => query.execute(&self.pool).await?,
        };
        Ok(ExecResult {
            affected_rows: done.rows_affected(),
            insert_id: done.last_insert_rowid(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::Row;

    #[tokio::test]
    async fn test_open_in_memory() {
        let driver = SqliteDriver::new_in_memory().await.unwrap();
        driver.connect().await.unwrap();
        let rows = driver.query("SELECT 1 AS one", &[], None).await.unwrap();
        let one: i64 = rows[0].get("one");
        assert_eq!(one, 1);
    }

    #[tokio::test]
    async fn test_migrations_create_tables() {
        let driver = SqliteDriver::new_in_memory().await.unwrap();
        let rows = driver
            .query(
                "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
                &[],
                None,
            )
            .await
            .unwrap();
        let names: Vec<String> = rows.iter().map(|r| r.get::<String, _>("name")).collect();
        assert!(names.iter().any(|n| n == "teams"));
        assert!(names.iter().any(|n| n == "games"));
    }

    #[tokio::test]
    async fn test_open_file_based() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("nested").join("test.db");
        let driver = SqliteDriver::open(&DataConfig::with_database(&db_path))
            .await
            .unwrap();
        driver.connect().await.unwrap();
        assert!(db_path.exists());
        driver.disconnect().await;
        assert!(driver.connect().await.is_err());
    }

    #[tokio::test]
    async fn test_numbered_placeholders_bind_by_index() {
        let driver = SqliteDriver::new_in_memory().await.unwrap();
        let params = vec![Value::from("a"), Value::from(2i64), Value::Null];
        let rows = driver
            .query("SELECT ?2 AS two, ?1 AS one, ?3 AS three", &params, None)
            .await
            .unwrap();
        assert_eq!(rows[0].get::<i64, _>("two"), 2);
        assert_eq!(rows[0].get::<String, _>("one"), "a");
        assert_eq!(rows[0].get::<Option<String>, _>("three"), None);
    }

    #[tokio::test]
    async fn test_session_writes_invisible_until_commit() {
        let dir = tempfile::tempdir().unwrap();
        let driver = SqliteDriver::open_path(&dir.path().join("tx.db"), 2)
            .await
            .unwrap();
        let mut session = driver.begin().await.unwrap();
        let done = driver
            .exec(
                "INSERT INTO teams (name, sport, created_at) VALUES (?1, ?2, ?3)",
                &[Value::from("Hawks"), Value::from("basketball"), Value::from(1i64)],
                Some(&mut session),
            )
            .await
            .unwrap();
        assert_eq!(done.affected_rows, 1);
        assert!(done.insert_id > 0);

        let outside = driver
            .query("SELECT id FROM teams", &[], None)
            .await
            .unwrap();
        assert!(outside.is_empty());

        driver.rollback(session).await.unwrap();
        let after = driver
            .query("SELECT id FROM teams", &[], None)
            .await
            .unwrap();
        assert!(after.is_empty());
    }
}
