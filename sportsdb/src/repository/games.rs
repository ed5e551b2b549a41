//! SQLite-backed repository for games.
//!
//! Statement text is built by [`GameQueries`], which needs no connection,
//! and executed by [`GameRepository`].

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::helpers::{
    decode_status, encode_status, non_blank, now_timestamp, parse_status, read_total,
    required_text,
};
use super::{DriverTransaction, Repository, RepositoryBase};
use crate::config::PageLimits;
use crate::driver::{Driver, SqliteDriver, Value};
use crate::error::{DataError, DataResult};
use crate::query::{
    self, FilterField, FilterKind, FilterSpec, Page, PaginationPolicy, PaginationRequest,
    PaginationSpec, PlaceholderStyle, QueryFragment, SortDirection, SortField, Statement,
};

type SqliteTx = DriverTransaction<SqliteDriver>;

const STYLE: PlaceholderStyle = SqliteDriver::PLACEHOLDER_STYLE;
const TABLE: &str = "games";
const COLUMNS: &str = "id, sport, status, home_team_id, away_team_id, scheduled_at, venue, \
    league, season, home_score, away_score, created_at, updated_at";

/// Filterable fields, in the order their predicates are emitted.
pub const GAME_FILTERS: &[FilterField] = &[
    FilterField::new("sport", FilterKind::Equals("sport")),
    FilterField::new("status", FilterKind::Equals("status")),
    FilterField::new("league", FilterKind::Equals("league")),
    FilterField::new("season", FilterKind::Equals("season")),
    FilterField::new("team_id", FilterKind::EitherOf("home_team_id", "away_team_id")),
    FilterField::new("venue", FilterKind::Contains("venue")),
    FilterField::new("date_from", FilterKind::AtLeast("scheduled_at")),
    FilterField::new("date_to", FilterKind::AtMost("scheduled_at")),
];

/// Sortable fields; `date` is the default.
pub const GAME_SORTS: &[SortField] = &[
    SortField::new("date", "scheduled_at", SortDirection::Desc),
    SortField::new("sport", "sport", SortDirection::Asc),
    SortField::new("status", "status", SortDirection::Asc),
    SortField::new("created_at", "created_at", SortDirection::Desc),
    SortField::new("updated_at", "updated_at", SortDirection::Desc),
];

const STATISTICS_PROJECTION: &str = "COUNT(*) AS total, \
    COALESCE(SUM(CASE WHEN status = 'scheduled' THEN 1 ELSE 0 END), 0) AS scheduled, \
    COALESCE(SUM(CASE WHEN status = 'live' THEN 1 ELSE 0 END), 0) AS live, \
    COALESCE(SUM(CASE WHEN status = 'final' THEN 1 ELSE 0 END), 0) AS finished, \
    COALESCE(SUM(CASE WHEN status = 'postponed' THEN 1 ELSE 0 END), 0) AS postponed, \
    COALESCE(SUM(CASE WHEN status = 'cancelled' THEN 1 ELSE 0 END), 0) AS cancelled, \
    AVG(CASE WHEN status = 'final' THEN home_score + away_score END) AS average_total_score";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Scheduled,
    Live,
    Final,
    Postponed,
    Cancelled,
}

impl std::fmt::Display for GameStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(encode_status(*self))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub id: i64,
    pub sport: String,
    pub status: GameStatus,
    pub home_team_id: i64,
    pub away_team_id: i64,
    pub scheduled_at: String,
    pub venue: Option<String>,
    pub league: Option<String>,
    pub season: Option<String>,
    pub home_score: i64,
    pub away_score: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Input for [`GameRepository::create`]. Everything is optional here so a
/// missing field is reported as a validation error, not a decode error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewGame {
    pub sport: Option<String>,
    pub home_team_id: Option<i64>,
    pub away_team_id: Option<i64>,
    pub scheduled_at: Option<String>,
    pub status: Option<String>,
    pub venue: Option<String>,
    pub league: Option<String>,
    pub season: Option<String>,
    pub home_score: Option<i64>,
    pub away_score: Option<i64>,
}

/// Partial update. `None` leaves a column alone; a blank string clears an
/// optional text column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameUpdate {
    pub status: Option<String>,
    pub scheduled_at: Option<String>,
    pub venue: Option<String>,
    pub league: Option<String>,
    pub season: Option<String>,
    pub home_score: Option<i64>,
    pub away_score: Option<i64>,
}

impl GameUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Aggregates over the games matching a filter set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameStatistics {
    pub total: u64,
    pub scheduled: u64,
    pub live: u64,
    pub finished: u64,
    pub postponed: u64,
    pub cancelled: u64,
    /// Mean of `home_score + away_score` over final games; `None` without any.
    pub average_total_score: Option<f64>,
}

/// Row type for game queries, mapped via `sqlx::FromRow`.
#[derive(FromRow)]
struct GameRow {
    id: i64,
    sport: String,
    status: String,
    home_team_id: i64,
    away_team_id: i64,
    scheduled_at: String,
    venue: Option<String>,
    league: Option<String>,
    season: Option<String>,
    home_score: i64,
    away_score: i64,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<GameRow> for Game {
    type Error = DataError;

    fn try_from(r: GameRow) -> DataResult<Self> {
        Ok(Self {
            id: r.id,
            sport: r.sport,
            status: decode_status(&r.status)?,
            home_team_id: r.home_team_id,
            away_team_id: r.away_team_id,
            scheduled_at: r.scheduled_at,
            venue: r.venue,
            league: r.league,
            season: r.season,
            home_score: r.home_score,
            away_score: r.away_score,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

#[derive(FromRow)]
struct StatisticsRow {
    total: i64,
    scheduled: i64,
    live: i64,
    finished: i64,
    postponed: i64,
    cancelled: i64,
    average_total_score: Option<f64>,
}

impl From<StatisticsRow> for GameStatistics {
    fn from(r: StatisticsRow) -> Self {
        let n = |v: i64| u64::try_from(v).unwrap_or(0);
        Self {
            total: n(r.total),
            scheduled: n(r.scheduled),
            live: n(r.live),
            finished: n(r.finished),
            postponed: n(r.postponed),
            cancelled: n(r.cancelled),
            average_total_score: r.average_total_score,
        }
    }
}

/// A `NewGame` that passed validation, with defaults filled in.
#[derive(Debug, Clone, PartialEq)]
struct ValidGame {
    sport: String,
    status: GameStatus,
    home_team_id: i64,
    away_team_id: i64,
    scheduled_at: String,
    venue: Option<String>,
    league: Option<String>,
    season: Option<String>,
    home_score: i64,
    away_score: i64,
}

fn team_id(field: &'static str, raw: Option<i64>) -> DataResult<i64> {
    match raw {
        Some(id) if id > 0 => Ok(id),
        Some(_) => Err(DataError::validation(field, "must be a positive id")),
        None => Err(DataError::validation(field, "is required")),
    }
}

fn score(field: &'static str, raw: Option<i64>) -> DataResult<i64> {
    match raw {
        Some(v) if v < 0 => Err(DataError::validation(field, "must not be negative")),
        Some(v) => Ok(v),
        None => Ok(0),
    }
}

fn known_status(raw: &str) -> DataResult<GameStatus> {
    parse_status(raw)
        .ok_or_else(|| DataError::validation("status", format!("unknown status '{}'", raw.trim())))
}

impl NewGame {
    fn validate(&self) -> DataResult<ValidGame> {
        let sport = required_text("sport", self.sport.as_deref())?;
        let home_team_id = team_id("home_team_id", self.home_team_id)?;
        let away_team_id = team_id("away_team_id", self.away_team_id)?;
        if home_team_id == away_team_id {
            return Err(DataError::validation(
                "away_team_id",
                "must differ from home_team_id",
            ));
        }
        let scheduled_at = required_text("scheduled_at", self.scheduled_at.as_deref())?;
        let status = match non_blank(self.status.as_deref()) {
            Some(raw) => known_status(&raw)?,
            None => GameStatus::Scheduled,
        };

        Ok(ValidGame {
            sport,
            status,
            home_team_id,
            away_team_id,
            scheduled_at,
            venue: non_blank(self.venue.as_deref()),
            league: non_blank(self.league.as_deref()),
            season: non_blank(self.season.as_deref()),
            home_score: score("home_score", self.home_score)?,
            away_score: score("away_score", self.away_score)?,
        })
    }
}

/// Statement builders for the `games` table.
#[derive(Debug, Clone, Copy)]
pub struct GameQueries {
    policy: PaginationPolicy,
}

/// Spell a recognised `status` filter the way it is stored, so the filter
/// accepts the same spellings as create and update. Anything else is bound
/// unchanged and matches no rows.
fn canonical_status(filters: &FilterSpec) -> Cow<'_, FilterSpec> {
    let Some(status) = filters
        .get("status")
        .and_then(|raw| parse_status(&raw.as_text()))
    else {
        return Cow::Borrowed(filters);
    };
    let mut filters = filters.clone();
    filters.insert("status", encode_status(status));
    Cow::Owned(filters)
}

impl GameQueries {
    pub fn new(limits: PageLimits) -> Self {
        Self {
            policy: PaginationPolicy {
                limits,
                sort_fields: GAME_SORTS,
                tiebreak_column: "id",
            },
        }
    }

    pub fn paginate(&self, request: &PaginationRequest) -> PaginationSpec {
        self.policy.sanitize(request)
    }

    pub fn find_all(&self, filters: &FilterSpec, page: &PaginationSpec) -> Statement {
        let filters = canonical_status(filters);
        query::select(STYLE, COLUMNS, TABLE, &filters, GAME_FILTERS, page)
    }

    pub fn count(&self, filters: &FilterSpec) -> Statement {
        query::count(STYLE, TABLE, &canonical_status(filters), GAME_FILTERS)
    }

    pub fn statistics(&self, filters: &FilterSpec) -> Statement {
        let filters = canonical_status(filters);
        query::aggregate(STYLE, STATISTICS_PROJECTION, TABLE, &filters, GAME_FILTERS)
    }

    pub fn find_by_id(&self, id: i64) -> Statement {
        let mut statement = QueryFragment::new(STYLE, 1);
        statement
            .push_sql(&format!("SELECT {COLUMNS} FROM {TABLE} WHERE id = "))
            .bind(id);
        statement.finish()
    }

    fn insert(&self, game: &ValidGame, now: i64) -> Statement {
        let mut statement = QueryFragment::new(STYLE, 1);
        statement
            .push_sql(
                "INSERT INTO games (sport, status, home_team_id, away_team_id, scheduled_at, \
                 venue, league, season, home_score, away_score, created_at, updated_at) VALUES (",
            )
            .bind_list([
                Value::from(&game.sport),
                Value::from(encode_status(game.status)),
                Value::from(game.home_team_id),
                Value::from(game.away_team_id),
                Value::from(&game.scheduled_at),
                Value::from(game.venue.clone()),
                Value::from(game.league.clone()),
                Value::from(game.season.clone()),
                Value::from(game.home_score),
                Value::from(game.away_score),
                Value::from(now),
                Value::from(now),
            ])
            .push_sql(")");
        statement.finish()
    }

    /// `UPDATE games SET … WHERE id = ?n`, columns in a fixed order.
    fn update(&self, id: i64, changes: &GameUpdate, now: i64) -> DataResult<Statement> {
        if changes.is_empty() {
            return Err(DataError::validation("update", "no fields to update"));
        }

        let mut sets: Vec<(&str, Value)> = Vec::new();
        if let Some(raw) = &changes.status {
            sets.push(("status", encode_status(known_status(raw)?).into()));
        }
        if let Some(raw) = &changes.scheduled_at {
            let scheduled_at = required_text("scheduled_at", Some(raw.as_str()))?;
            sets.push(("scheduled_at", scheduled_at.into()));
        }
        for (column, raw) in [
            ("venue", &changes.venue),
            ("league", &changes.league),
            ("season", &changes.season),
        ] {
            if let Some(raw) = raw {
                sets.push((column, non_blank(Some(raw.as_str())).into()));
            }
        }
        if changes.home_score.is_some() {
            sets.push(("home_score", score("home_score", changes.home_score)?.into()));
        }
        if changes.away_score.is_some() {
            sets.push(("away_score", score("away_score", changes.away_score)?.into()));
        }
        sets.push(("updated_at", now.into()));

        let mut statement = QueryFragment::new(STYLE, 1);
        statement.push_sql("UPDATE games SET ");
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

/// SQLite implementation of the games [`Repository`].
pub struct GameRepository {
    base: RepositoryBase<SqliteDriver>,
    queries: GameQueries,
}

impl GameRepository {
    pub fn new(driver: SqliteDriver, limits: PageLimits) -> Self {
        Self {
            base: RepositoryBase::new(driver, TABLE),
            queries: GameQueries::new(limits),
        }
    }

    pub fn queries(&self) -> &GameQueries {
        &self.queries
    }

    async fn fetch(&self, statement: &Statement, tx: Option<&SqliteTx>) -> DataResult<Vec<Game>> {
        let rows = self.base.query(statement, tx).await?;
        rows.iter()
            .map(|row| Game::try_from(GameRow::from_row(row)?))
            .collect()
    }

    async fn fetch_existing(&self, id: i64, tx: Option<&SqliteTx>) -> DataResult<Game> {
        self.find_by_id(id, tx)
            .await?
            .ok_or(DataError::NotFound { entity: "game", id })
    }

    /// One page of games plus the total matching the same filters.
    pub async fn find_page(
        &self,
        filters: &FilterSpec,
        request: &PaginationRequest,
        tx: Option<&SqliteTx>,
    ) -> DataResult<Page<Game>> {
        let page = self.queries.paginate(request);
        let items = self.fetch(&self.queries.find_all(filters, &page), tx).await?;
        let total = self.count(filters, tx).await?;
        Ok(Page {
            items,
            total,
            limit: page.limit(),
            offset: page.offset(),
        })
    }

    pub async fn statistics(
        &self,
        filters: &FilterSpec,
        tx: Option<&SqliteTx>,
    ) -> DataResult<GameStatistics> {
        let rows = self.base.query(&self.queries.statistics(filters), tx).await?;
        match rows.first() {
            Some(row) => Ok(StatisticsRow::from_row(row)?.into()),
            None => Err(DataError::Decode("statistics query returned no row".to_string())),
        }
    }

    /// Validate every draft, then insert them in order. Validation failures
    /// are reported together and nothing is written. Pass `tx` to make the
    /// inserts all-or-nothing as well.
    pub async fn create_many(
        &self,
        drafts: &[NewGame],
        tx: Option<&SqliteTx>,
    ) -> DataResult<Vec<Game>> {
        let mut valid = Vec::with_capacity(drafts.len());
        let mut details = Vec::new();
        for (i, draft) in drafts.iter().enumerate() {
            match draft.validate() {
                Ok(game) => valid.push(game),
                Err(e) => details.push(format!("item {i}: {e}")),
            }
        }
        if !details.is_empty() {
            return Err(DataError::Composite {
                failed: details.len(),
                total: drafts.len(),
                details,
            });
        }

        let mut created = Vec::with_capacity(valid.len());
        for game in &valid {
            created.push(self.insert(game, tx).await?);
        }
        Ok(created)
    }

    async fn insert(&self, game: &ValidGame, tx: Option<&SqliteTx>) -> DataResult<Game> {
        let result = self
            .base
            .exec(&self.queries.insert(game, now_timestamp()), tx)
            .await?;
        tracing::debug!(id = result.insert_id, sport = %game.sport, "game created");
        self.fetch_existing(result.insert_id, tx).await
    }
}

impl Repository for GameRepository {
    type Driver = SqliteDriver;
    type Entity = Game;
    type Draft = NewGame;
    type Changes = GameUpdate;

    async fn find_all(
        &self,
        filters: &FilterSpec,
        page: &PaginationRequest,
        tx: Option<&SqliteTx>,
    ) -> DataResult<Vec<Game>> {
        let page = self.queries.paginate(page);
        self.fetch(&self.queries.find_all(filters, &page), tx).await
    }

    async fn find_by_id(&self, id: i64, tx: Option<&SqliteTx>) -> DataResult<Option<Game>> {
        let mut games = self.fetch(&self.queries.find_by_id(id), tx).await?;
        Ok(games.pop())
    }

    async fn create(&self, draft: &NewGame, tx: Option<&SqliteTx>) -> DataResult<Game> {
        let game = draft.validate()?;
        self.insert(&game, tx).await
    }

    async fn update(
        &self,
        id: i64,
        changes: &GameUpdate,
        tx: Option<&SqliteTx>,
    ) -> DataResult<Game> {
        let statement = self.queries.update(id, changes, now_timestamp())?;
        let result = self.base.exec(&statement, tx).await?;
        if result.affected_rows == 0 {
            return Err(DataError::NotFound { entity: "game", id });
        }
        self.fetch_existing(id, tx).await
    }

    async fn delete(&self, id: i64, tx: Option<&SqliteTx>) -> DataResult<bool> {
        self.base.delete_by_id(id, tx).await
    }

    async fn count(&self, filters: &FilterSpec, tx: Option<&SqliteTx>) -> DataResult<u64> {
        let rows = self.base.query(&self.queries.count(filters), tx).await?;
        read_total(&rows)
    }

    async fn exists(&self, id: i64, tx: Option<&SqliteTx>) -> DataResult<bool> {
        self.base.exists_by_id(id, tx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn queries() -> GameQueries {
        GameQueries::new(PageLimits::default())
    }

    fn first_page() -> PaginationRequest {
        PaginationRequest::new().limit(10).offset(0).sort("date", "DESC")
    }

    #[test]
    fn filters_and_page_bind_in_order() {
        let q = queries();
        let filters = FilterSpec::new()
            .with("sport", "basketball")
            .with("status", "live");
        let statement = q.find_all(&filters, &q.paginate(&first_page()));

        assert_eq!(
            statement.sql,
            format!(
                "SELECT {COLUMNS} FROM games WHERE 1 = 1 AND sport = ?1 AND status = ?2 \
                 ORDER BY scheduled_at DESC, id DESC LIMIT ?3 OFFSET ?4"
            )
        );
        assert_eq!(
            statement.params,
            vec![
                Value::from("basketball"),
                Value::from("live"),
                Value::Integer(10),
                Value::Integer(0),
            ]
        );
    }

    #[test]
    fn team_filter_binds_twice() {
        let q = queries();
        let filters = FilterSpec::new().with("team_id", 4_i64);
        let statement = q.count(&filters);
        assert_eq!(
            statement.sql,
            "SELECT COUNT(*) AS total FROM games WHERE 1 = 1 \
             AND (home_team_id = ?1 OR away_team_id = ?2)"
        );
        assert_eq!(statement.params, vec![Value::Integer(4), Value::Integer(4)]);
    }

    #[test]
    fn unknown_filters_and_sorts_are_ignored() {
        let q = queries();
        let filters = FilterSpec::new()
            .with("sport", "hockey")
            .with("1 = 1; DROP TABLE games; --", "x");
        let page = q.paginate(&PaginationRequest::new().sort("home_score; --", "sideways"));
        let statement = q.find_all(&filters, &page);

        assert!(!statement.sql.contains("DROP"));
        assert!(!statement.sql.contains("sideways"));
        assert!(statement.sql.contains("ORDER BY scheduled_at DESC, id DESC"));
        assert_eq!(statement.params.len(), 3);
    }

    #[test]
    fn status_filter_accepts_the_spellings_writes_accept() {
        let q = queries();
        for raw in ["LIVE", " Live ", "live"] {
            let statement = q.count(&FilterSpec::new().with("status", raw));
            assert_eq!(statement.params, vec![Value::from("live")], "{raw:?}");
        }
        assert!(matches!(known_status("LIVE"), Ok(GameStatus::Live)));

        let unknown = q.count(&FilterSpec::new().with("status", "halftime"));
        assert_eq!(unknown.params, vec![Value::from("halftime")]);
    }

    #[test]
    fn statistics_share_the_filter_clause() {
        let q = queries();
        let filters = FilterSpec::new()
            .with("league", "NBA")
            .with("venue", "Garden");
        let stats = q.statistics(&filters);
        let count = q.count(&filters);

        let where_of = |sql: &str| sql[sql.find(" WHERE").unwrap()..].to_string();
        assert_eq!(where_of(&stats.sql), where_of(&count.sql));
        assert_eq!(stats.params, count.params);
        assert_eq!(stats.params[1], Value::from("%Garden%"));
    }

    #[test]
    fn validation_fills_defaults() {
        let draft = NewGame {
            sport: Some(" soccer ".into()),
            home_team_id: Some(1),
            away_team_id: Some(2),
            scheduled_at: Some("2024-03-01T19:00:00Z".into()),
            venue: Some("".into()),
            ..Default::default()
        };
        let game = draft.validate().unwrap();
        assert_eq!(game.sport, "soccer");
        assert_eq!(game.status, GameStatus::Scheduled);
        assert_eq!((game.home_score, game.away_score), (0, 0));
        assert_eq!(game.venue, None);

        let statement = queries().insert(&game, 1_700_000_000);
        assert_eq!(statement.params.len(), 12);
        assert_eq!(statement.params[5], Value::Null);
        assert_eq!(statement.placeholder_count(STYLE), 12);
    }

    #[test]
    fn validation_rejects_bad_drafts() {
        let base = NewGame {
            sport: Some("soccer".into()),
            home_team_id: Some(1),
            away_team_id: Some(2),
            scheduled_at: Some("2024-03-01".into()),
            ..Default::default()
        };

        let cases = [
            (NewGame { sport: None, ..base.clone() }, "sport"),
            (NewGame { home_team_id: Some(0), ..base.clone() }, "home_team_id"),
            (NewGame { away_team_id: Some(1), ..base.clone() }, "away_team_id"),
            (NewGame { scheduled_at: Some(" ".into()), ..base.clone() }, "scheduled_at"),
            (NewGame { status: Some("halftime".into()), ..base.clone() }, "status"),
            (NewGame { home_score: Some(-1), ..base.clone() }, "home_score"),
        ];
        for (draft, expected) in cases {
            match draft.validate() {
                Err(DataError::Validation { field, .. }) => assert_eq!(field, expected),
                other => panic!("expected validation error on {expected}, got {other:?}"),
            }
        }
    }

    #[test]
    fn partial_update_sets_only_given_columns() {
        let changes = GameUpdate {
            status: Some("FINAL".into()),
            home_score: Some(101),
            away_score: Some(99),
            ..Default::default()
        };
        let statement = queries().update(7, &changes, 1_700_000_000).unwrap();
        assert_eq!(
            statement.sql,
            "UPDATE games SET status = ?1, home_score = ?2, away_score = ?3, updated_at = ?4 \
             WHERE id = ?5"
        );
        assert_eq!(
            statement.params,
            vec![
                Value::from("final"),
                Value::Integer(101),
                Value::Integer(99),
                Value::Integer(1_700_000_000),
                Value::Integer(7),
            ]
        );
    }

    #[test]
    fn empty_update_is_rejected() {
        let err = queries().update(1, &GameUpdate::default(), 0).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn new_game_deserializes_with_missing_fields() {
        let draft: NewGame = serde_json::from_str(r#"{"sport":"tennis"}"#).unwrap();
        assert_eq!(draft.sport.as_deref(), Some("tennis"));
        assert!(draft.validate().is_err());
    }

    fn filter_subset() -> impl Strategy<Value = FilterSpec> {
        proptest::collection::vec(any::<bool>(), GAME_FILTERS.len()).prop_map(|mask| {
            let mut spec = FilterSpec::new();
            for (field, on) in GAME_FILTERS.iter().zip(mask) {
                if on {
                    spec.insert(field.name, "v%_\\?1");
                }
            }
            spec
        })
    }

    proptest! {
        #[test]
        fn placeholders_match_params(
            filters in filter_subset(),
            limit in proptest::option::of(-5_i64..500),
            offset in proptest::option::of(-5_i64..500),
        ) {
            let q = queries();
            let mut request = PaginationRequest::new();
            if let Some(l) = limit { request = request.limit(l); }
            if let Some(o) = offset { request = request.offset(o); }

            for statement in [
                q.find_all(&filters, &q.paginate(&request)),
                q.count(&filters),
                q.statistics(&filters),
            ] {
                prop_assert_eq!(statement.placeholder_count(STYLE), statement.params.len());
            }
        }

        #[test]
        fn page_size_stays_within_limits(limit in any::<i64>()) {
            let page = queries().paginate(&PaginationRequest::new().limit(limit));
            prop_assert!(page.limit() >= 1);
            prop_assert!(page.limit() <= PageLimits::default().max_limit);
        }
    }
}
