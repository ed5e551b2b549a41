//! Repositories over the SQLite driver.
//!
//! ## Contract
//!
//! Every entity repository implements [`Repository`]: the usual CRUD set
//! plus `count` and `exists`. Each method takes an optional transaction
//! handle as its last argument; with `None` the statement runs on the pool,
//! with `Some(tx)` it runs inside that transaction.
//!
//! | Type | Entity | Extra |
//! |------|--------|-------|
//! | [`GameRepository`] | [`Game`] | `find_page`, `statistics`, `create_many` |
//! | [`TeamRepository`] | [`Team`] | |
//!
//! Writes validate their input before touching the store and return the row
//! as re-read from the store afterwards.

mod base;
mod games;
pub(crate) mod helpers;
mod teams;

pub use base::RepositoryBase;
pub use games::{
    Game, GameQueries, GameRepository, GameStatistics, GameStatus, GameUpdate, NewGame,
    GAME_FILTERS, GAME_SORTS,
};
pub use teams::{NewTeam, Team, TeamRepository, TeamUpdate, TEAM_FILTERS, TEAM_SORTS};

use std::future::Future;

use crate::driver::Driver;
use crate::error::DataResult;
use crate::query::{FilterSpec, PaginationRequest};
use crate::transaction::Transaction;

/// Transaction handle type for a given driver.
pub type DriverTransaction<D> = Transaction<<D as Driver>::Session>;

/// CRUD contract shared by entity repositories.
pub trait Repository: Send + Sync {
    type Driver: Driver;
    type Entity: Send;
    /// Input for `create`; validated before any statement runs.
    type Draft: Sync;
    /// Partial input for `update`.
    type Changes: Sync;

    fn find_all(
        &self,
        filters: &FilterSpec,
        page: &PaginationRequest,
        tx: Option<&DriverTransaction<Self::Driver>>,
    ) -> impl Future<Output = DataResult<Vec<Self::Entity>>> + Send;

    fn find_by_id(
        &self,
        id: i64,
        tx: Option<&DriverTransaction<Self::Driver>>,
    ) -> impl Future<Output = DataResult<Option<Self::Entity>>> + Send;

    fn create(
        &self,
        draft: &Self::Draft,
        tx: Option<&DriverTransaction<Self::Driver>>,
    ) -> impl Future<Output = DataResult<Self::Entity>> + Send;

    /// Fails with `NotFound` if no row has `id`.
    fn update(
        &self,
        id: i64,
        changes: &Self::Changes,
        tx: Option<&DriverTransaction<Self::Driver>>,
    ) -> impl Future<Output = DataResult<Self::Entity>> + Send;

    /// Returns whether a row was deleted.
    fn delete(
        &self,
        id: i64,
        tx: Option<&DriverTransaction<Self::Driver>>,
    ) -> impl Future<Output = DataResult<bool>> + Send;

    fn count(
        &self,
        filters: &FilterSpec,
        tx: Option<&DriverTransaction<Self::Driver>>,
    ) -> impl Future<Output = DataResult<u64>> + Send;

    fn exists(
        &self,
        id: i64,
        tx: Option<&DriverTransaction<Self::Driver>>,
    ) -> impl Future<Output = DataResult<bool>> + Send;
}
