//! The narrow interface the transaction manager and repositories need from a
//! backing store.
//!
//! A [`Driver`] owns connectivity and the store's native transaction
//! primitives. A *session* is whatever the store hands back from `begin`; the
//! core never looks inside it, it only threads it back into `query`/`exec`
//! and finally into `commit` or `rollback`.
//!
//! Methods return `impl Future + Send` so manager futures stay `Send` and can
//! be driven from `tokio::spawn`.

mod sqlite;

pub use sqlite::SqliteDriver;

use std::fmt;
use std::future::Future;

use crate::error::DataResult;
use crate::query::PlaceholderStyle;

/// A backing-store adapter.
pub trait Driver: Send + Sync + 'static {
    /// One open store transaction.
    type Session: Send + 'static;
    /// A result row as produced by the store.
    type Row: Send + 'static;

    /// The single placeholder convention statements for this store use.
    const PLACEHOLDER_STYLE: PlaceholderStyle;

    /// Verify the store is reachable.
    fn connect(&self) -> impl Future<Output = DataResult<()>> + Send;
    /// Release every connection. Further calls fail.
    fn disconnect(&self) -> impl Future<Output = ()> + Send;

    fn begin(&self) -> impl Future<Output = DataResult<Self::Session>> + Send;
    fn commit(&self, session: Self::Session) -> impl Future<Output = DataResult<()>> + Send;
    fn rollback(&self, session: Self::Session) -> impl Future<Output = DataResult<()>> + Send;

    /// Run a row-returning statement, inside `session` if one is given.
    fn query(
        &self,
        sql: &str,
        params: &[Value],
        session: Option<&mut Self::Session>,
    ) -> impl Future<Output = DataResult<Vec<Self::Row>>> + Send;

    /// Run a statement for its side effects, inside `session` if one is given.
    fn exec(
        &self,
        sql: &str,
        params: &[Value],
        session: Option<&mut Self::Session>,
    ) -> impl Future<Output = DataResult<ExecResult>> + Send;
}

/// Outcome of a write statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecResult {
    pub affected_rows: u64,
    /// Rowid of the last inserted row (0 if the statement inserted nothing).
    pub insert_id: i64,
}

/// A bound statement parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Integer(v) => write!(f, "{v}"),
            Value::Real(v) => write!(f, "{v}"),
            Value::Text(v) => f.write_str(v),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v.into())
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Integer(v.into())
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        // Offsets and timestamps never get near i64::MAX; saturate rather than wrap.
        Value::Integer(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Text(v.clone())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_maps_to_null() {
        assert_eq!(Value::from(None::<String>), Value::Null);
        assert_eq!(Value::from(Some("arena")), Value::Text("arena".to_string()));
    }

    #[test]
    fn unsigned_values_saturate() {
        assert_eq!(Value::from(u64::MAX), Value::Integer(i64::MAX));
        assert_eq!(Value::from(10u32), Value::Integer(10));
    }

    #[test]
    fn display_is_plain() {
        assert_eq!(Value::from("live").to_string(), "live");
        assert_eq!(Value::Null.to_string(), "NULL");
        assert_eq!(Value::from(2.5).to_string(), "2.5");
    }
}
