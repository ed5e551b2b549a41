//! Shared encode/decode helpers for SQLite ↔ domain conversions.

use std::time::{SystemTime, UNIX_EPOCH};

use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::GameStatus;
use crate::error::{DataError, DataResult};

// ── GameStatus ─────────────────────────────────────────────────────────

/// Encode a `GameStatus` to the string used in the `games.status` CHECK.
pub fn encode_status(status: GameStatus) -> &'static str {
    match status {
        GameStatus::Scheduled => "scheduled",
        GameStatus::Live => "live",
        GameStatus::Final => "final",
        GameStatus::Postponed => "postponed",
        GameStatus::Cancelled => "cancelled",
    }
}

/// Parse a status as supplied by callers. Case and surrounding whitespace
/// are ignored.
pub fn parse_status(raw: &str) -> Option<GameStatus> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "scheduled" => Some(GameStatus::Scheduled),
        "live" => Some(GameStatus::Live),
        "final" => Some(GameStatus::Final),
        "postponed" => Some(GameStatus::Postponed),
        "cancelled" => Some(GameStatus::Cancelled),
        _ => None,
    }
}

/// Decode a stored status. Unlike [`parse_status`] this is strict: anything
/// outside the CHECK set means the row is corrupt.
pub fn decode_status(stored: &str) -> DataResult<GameStatus> {
    match stored {
        "scheduled" => Ok(GameStatus::Scheduled),
        "live" => Ok(GameStatus::Live),
        "final" => Ok(GameStatus::Final),
        "postponed" => Ok(GameStatus::Postponed),
        "cancelled" => Ok(GameStatus::Cancelled),
        _ => Err(DataError::Decode(format!("unknown game status '{stored}'"))),
    }
}

// ── Text fields ────────────────────────────────────────────────────────

/// Trim `raw`; `None` if nothing is left.
pub fn non_blank(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Like [`non_blank`] but the field is required.
pub fn required_text(field: &'static str, raw: Option<&str>) -> DataResult<String> {
    non_blank(raw).ok_or_else(|| DataError::validation(field, "is required"))
}

// ── Rows ───────────────────────────────────────────────────────────────

/// Read the `total` column of the first row of a count query.
pub fn read_total(rows: &[SqliteRow]) -> DataResult<u64> {
    let total: i64 = match rows.first() {
        Some(row) => row.try_get("total")?,
        None => 0,
    };
    Ok(u64::try_from(total).unwrap_or(0))
}

/// Get the current unix timestamp in seconds.
pub fn now_timestamp() -> i64 {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    i64::try_from(secs).unwrap_or(i64::MAX)
}
