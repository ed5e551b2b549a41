//! SQLite-backed repository for teams.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::helpers::{non_blank, now_timestamp, read_total, required_text};
use super::{DriverTransaction, Repository, RepositoryBase};
use crate::config::PageLimits;
use crate::driver::{Driver, SqliteDriver, Value};
use crate::error::{DataError, DataResult};
use crate::query::{
    self, FilterField, FilterKind, FilterSpec, PaginationPolicy, PaginationRequest,
    QueryFragment, SortDirection, SortField, Statement,
};

type SqliteTx = DriverTransaction<SqliteDriver>;

const TABLE: &str = "teams";
const COLUMNS: &str = "id, name, sport, city, abbreviation, created_at";

pub const TEAM_FILTERS: &[FilterField] = &[
    FilterField::new("sport", FilterKind::Equals("sport")),
    FilterField::new("city", FilterKind::Equals("city")),
    FilterField::new("name", FilterKind::Contains("name")),
];

pub const TEAM_SORTS: &[SortField] = &[
    SortField::new("name", "name", SortDirection::Asc),
    SortField::new("created_at", "created_at", SortDirection::Desc),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Team {
    pub id: i64,
    pub name: String,
    pub sport: String,
    pub city: Option<String>,
    pub abbreviation: Option<String>,
    pub created_at: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewTeam {
    pub name: Option<String>,
    pub sport: Option<String>,
    pub city: Option<String>,
    pub abbreviation: Option<String>,
}

/// Partial update; a blank `city` or `abbreviation` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamUpdate {
    pub name: Option<String>,
    pub sport: Option<String>,
    pub city: Option<String>,
    pub abbreviation: Option<String>,
}

/// SQLite implementation of the teams [`Repository`].
pub struct TeamRepository {
    base: RepositoryBase<SqliteDriver>,
    policy: PaginationPolicy,
}

impl TeamRepository {
    pub fn new(driver: SqliteDriver, limits: PageLimits) -> Self {
        Self {
            base: RepositoryBase::new(driver, TABLE),
            policy: PaginationPolicy {
                limits,
                sort_fields: TEAM_SORTS,
                tiebreak_column: "id",
            },
        }
    }

    fn style(&self) -> query::PlaceholderStyle {
        SqliteDriver::PLACEHOLDER_STYLE
    }

    async fn fetch(&self, statement: &Statement, tx: Option<&SqliteTx>) -> DataResult<Vec<Team>> {
        let rows = self.base.query(statement, tx).await?;
        Ok(rows.iter().map(Team::from_row).collect::<Result<_, _>>()?)
    }

    async fn fetch_existing(&self, id: i64, tx: Option<&SqliteTx>) -> DataResult<Team> {
        self.find_by_id(id, tx)
            .await?
            .ok_or(DataError::NotFound { entity: "team", id })
    }

    fn update_statement(&self, id: i64, changes: &TeamUpdate) -> DataResult<Statement> {
        let mut sets: Vec<(&str, Value)> = Vec::new();
        if let Some(name) = &changes.name {
            sets.push(("name", required_text("name", Some(name.as_str()))?.into()));
        }
        if let Some(sport) = &changes.sport {
            sets.push(("sport", required_text("sport", Some(sport.as_str()))?.into()));
        }
        if let Some(city) = &changes.city {
            sets.push(("city", non_blank(Some(city.as_str())).into()));
        }
        if let Some(abbreviation) = &changes.abbreviation {
            sets.push(("abbreviation", non_blank(Some(abbreviation.as_str())).into()));
        }
        if sets.is_empty() {
            return Err(DataError::validation("update", "no fields to update"));
        }

        let mut statement = QueryFragment::new(self.style(), 1);
        statement.push_sql("UPDATE teams SET ");
        for (i, (column, value)) in sets.into_iter().enumerate() {
            if i > 0 {
                statement.push_sql(", ");
            }
            statement.push_sql(&format!("{column} = ")).bind(value);
        }
        statement.push_sql(" WHERE id = ").bind(id);
        Ok(statement.finish())
    }
}

impl Repository for TeamRepository {
    type Driver = SqliteDriver;
    type Entity = Team;
    type Draft = NewTeam;
    type Changes = TeamUpdate;

    async fn find_all(
        &self,
        filters: &FilterSpec,
        page: &PaginationRequest,
        tx: Option<&SqliteTx>,
    ) -> DataResult<Vec<Team>> {
        let page = self.policy.sanitize(page);
        let statement = query::select(self.style(), COLUMNS, TABLE, filters, TEAM_FILTERS, &page);
        self.fetch(&statement, tx).await
    }

    async fn find_by_id(&self, id: i64, tx: Option<&SqliteTx>) -> DataResult<Option<Team>> {
        let statement = self.base.by_id(&format!("SELECT {COLUMNS} FROM {TABLE}"), id);
        Ok(self.fetch(&statement, tx).await?.pop())
    }

    async fn create(&self, draft: &NewTeam, tx: Option<&SqliteTx>) -> DataResult<Team> {
        let name = required_text("name", draft.name.as_deref())?;
        let sport = required_text("sport", draft.sport.as_deref())?;

        let mut statement = QueryFragment::new(self.style(), 1);
        statement
            .push_sql("INSERT INTO teams (name, sport, city, abbreviation, created_at) VALUES (")
            .bind_list([
                Value::from(name),
                Value::from(sport),
                Value::from(non_blank(draft.city.as_deref())),
                Value::from(non_blank(draft.abbreviation.as_deref())),
                Value::from(now_timestamp()),
            ])
            .push_sql(")");

        let result = self.base.exec(&statement.finish(), tx).await?;
        tracing::debug!(id = result.insert_id, "team created");
        self.fetch_existing(result.insert_id, tx).await
    }

    async fn update(
        &self,
        id: i64,
        changes: &TeamUpdate,
        tx: Option<&SqliteTx>,
    ) -> DataResult<Team> {
        let statement = self.update_statement(id, changes)?;
        if self.base.exec(&statement, tx).await?.affected_rows == 0 {
            return Err(DataError::NotFound { entity: "team", id });
        }
        self.fetch_existing(id, tx).await
    }

    async fn delete(&self, id: i64, tx: Option<&SqliteTx>) -> DataResult<bool> {
        self.base.delete_by_id(id, tx).await
    }

    async fn count(&self, filters: &FilterSpec, tx: Option<&SqliteTx>) -> DataResult<u64> {
        let statement = query::count(self.style(), TABLE, filters, TEAM_FILTERS);
        read_total(&self.base.query(&statement, tx).await?)
    }

    async fn exists(&self, id: i64, tx: Option<&SqliteTx>) -> DataResult<bool> {
        self.base.exists_by_id(id, tx).await
    }
}
