//! Transactional data access for a sports schedule store.
//!
//! ```text
//! TransactionManager ──► Driver (SqliteDriver)
//!        │                  ▲
//!        ▼                  │
//!   Transaction ──► GameRepository / TeamRepository ──► query::{select, count, aggregate}
//! ```
//!
//! Repositories accept an optional [`Transaction`] on every call; pass the one
//! handed to a unit of work by [`TransactionManager::execute_in_transaction`]
//! or held by a [`TransactionContext`] to make several calls atomic.

pub mod config;
pub mod driver;
pub mod error;
pub mod logging;
pub mod query;
pub mod repository;
pub mod transaction;

pub use config::{DataConfig, PageLimits};
pub use driver::{Driver, SqliteDriver, Value};
pub use error::{DataError, DataResult};
pub use logging::{init_tracing, MemoryLogger, TracingLogger, TransactionLogger, TxEvent};
pub use query::{FilterSpec, Page, PaginationRequest, SortDirection};
pub use repository::{
    Game, GameRepository, GameStatistics, GameStatus, GameUpdate, NewGame, NewTeam, Repository,
    Team, TeamRepository, TeamUpdate,
};
pub use transaction::{
    CleanupReport, CompensatedOperation, Transaction, TransactionContext, TransactionId,
    TransactionManager, TransactionOptions, TransactionState,
};

/// A ready-to-use stack opened from one [`DataConfig`].
pub struct DataStore {
    pub manager: TransactionManager<SqliteDriver>,
    pub games: GameRepository,
    pub teams: TeamRepository,
}

impl DataStore {
    /// Open the database, run migrations and wire the repositories.
    pub async fn open(config: &DataConfig) -> DataResult<Self> {
        let driver = SqliteDriver::open(config).await?;
        driver.connect().await?;
        tracing::info!(
            path = %config.database_path.display(),
            max_connections = config.max_connections,
            "data store ready"
        );
        Ok(Self {
            manager: TransactionManager::from_config(
                driver.clone(),
                config,
                std::sync::Arc::new(TracingLogger),
            ),
            games: GameRepository::new(driver.clone(), config.page_limits),
            teams: TeamRepository::new(driver, config.page_limits),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn open_from_config() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = DataConfig::with_database(dir.path().join("nested").join("store.db"));
        let store = DataStore::open(&config).await.unwrap();

        let team = store
            .teams
            .create(
                &NewTeam {
                    name: Some("Storm".into()),
                    sport: Some("basketball".into()),
                    ..Default::default()
                },
                None,
            )
            .await
            .unwrap();
        assert!(store.teams.exists(team.id, None).await.unwrap());

        let report = store.manager.shutdown().await;
        assert!(report.rolled_back.is_empty());
    }
}
