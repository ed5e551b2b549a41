//! Allow-listed filters and the WHERE-clause composer.
//!
//! A [`FilterSpec`] is whatever the caller sent: field names and scalar
//! values. Each repository declares the fields it honors as a static slice of
//! [`FilterField`]s; [`compose_where`] walks that slice in order and emits a
//! predicate only for fields present in the spec. Anything else in the spec is
//! ignored.

use std::collections::BTreeMap;

use serde_json::Value as JsonValue;

use super::fragment::{PlaceholderStyle, QueryFragment};
use crate::driver::Value;

/// Scalar filter value.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Text(String),
    Integer(i64),
    Real(f64),
}

impl From<&FilterValue> for Value {
    fn from(v: &FilterValue) -> Self {
        match v {
            FilterValue::Text(s) => Value::Text(s.clone()),
            FilterValue::Integer(i) => Value::Integer(*i),
            FilterValue::Real(r) => Value::Real(*r),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(v: &str) -> Self {
        FilterValue::Text(v.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(v: String) -> Self {
        FilterValue::Text(v)
    }
}

impl From<i64> for FilterValue {
    fn from(v: i64) -> Self {
        FilterValue::Integer(v)
    }
}

impl From<f64> for FilterValue {
    fn from(v: f64) -> Self {
        FilterValue::Real(v)
    }
}

impl FilterValue {
    pub(crate) fn as_text(&self) -> String {
        match self {
            FilterValue::Text(s) => s.clone(),
            FilterValue::Integer(i) => i.to_string(),
            FilterValue::Real(r) => r.to_string(),
        }
    }
}

/// Caller-supplied filters, keyed by logical field name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSpec {
    values: BTreeMap<String, FilterValue>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<FilterValue>) {
        self.values.insert(field.into(), value.into());
    }

    /// Build from a JSON object such as a decoded query string.
    ///
    /// Strings and numbers are kept; empty strings, booleans, nulls, arrays
    /// and nested objects are dropped. A non-object yields an empty spec.
    pub fn from_json(json: &JsonValue) -> Self {
        let mut spec = Self::new();
        let Some(object) = json.as_object() else {
            return spec;
        };
        for (key, value) in object {
            match value {
                JsonValue::String(s) if !s.trim().is_empty() => {
                    spec.insert(key.clone(), s.trim().to_string())
                }
                JsonValue::Number(n) => {
                    if let Some(i) = n.as_i64() {
                        spec.insert(key.clone(), i);
                    } else if let Some(f) = n.as_f64() {
                        spec.insert(key.clone(), f);
                    }
                }
                _ => tracing::debug!(field = %key, "dropping non-scalar filter value"),
            }
        }
        spec
    }

    pub fn get(&self, field: &str) -> Option<&FilterValue> {
        self.values.get(field)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Keys not named by `allowed`, i.e. what composition will ignore.
    pub fn unrecognized<'a>(&'a self, allowed: &[FilterField]) -> Vec<&'a str> {
        self.values
            .keys()
            .filter(|k| !allowed.iter().any(|f| f.name == k.as_str()))
            .map(String::as_str)
            .collect()
    }
}

/// How a filter field turns into a predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    /// `column = ?n`
    Equals(&'static str),
    /// `column LIKE ?n ESCAPE '\'`, matching anywhere, case-insensitive for ASCII.
    Contains(&'static str),
    /// `column >= ?n`
    AtLeast(&'static str),
    /// `column <= ?n`
    AtMost(&'static str),
    /// `(first = ?n OR second = ?n+1)`, binding the value twice.
    EitherOf(&'static str, &'static str),
}

impl FilterKind {
    /// Placeholders this kind emits.
    pub fn arity(self) -> usize {
        match self {
            FilterKind::EitherOf(..) => 2,
            _ => 1,
        }
    }
}

/// An allow-listed filter field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterField {
    pub name: &'static str,
    pub kind: FilterKind,
}

impl FilterField {
    pub const fn new(name: &'static str, kind: FilterKind) -> Self {
        Self { name, kind }
    }
}

fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 2);
    out.push('%');
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}

/// Append ` AND <predicate>` to `fragment` for one present field.
fn push_predicate(fragment: &mut QueryFragment, kind: FilterKind, value: &FilterValue) {
    match kind {
        FilterKind::Equals(column) => {
            fragment.push_sql(&format!(" AND {column} = ")).bind(value);
        }
        FilterKind::Contains(column) => {
            fragment
                .push_sql(&format!(" AND {column} LIKE "))
                .bind(escape_like(&value.as_text()))
                .push_sql(" ESCAPE '\\'");
        }
        FilterKind::AtLeast(column) => {
            fragment.push_sql(&format!(" AND {column} >= ")).bind(value);
        }
        FilterKind::AtMost(column) => {
            fragment.push_sql(&format!(" AND {column} <= ")).bind(value);
        }
        FilterKind::EitherOf(first, second) => {
            fragment
                .push_sql(&format!(" AND ({first} = "))
                .bind(value)
                .push_sql(&format!(" OR {second} = "))
                .bind(value)
                .push_sql(")");
        }
    }
}

/// Compose `WHERE 1 = 1 [AND …]` for the allow-listed fields present in `spec`,
/// numbering placeholders from `start_index`.
pub fn compose_where(
    spec: &FilterSpec,
    allowed: &[FilterField],
    style: PlaceholderStyle,
    start_index: usize,
) -> QueryFragment {
    let mut fragment = QueryFragment::new(style, start_index);
    fragment.push_sql(" WHERE 1 = 1");
    for field in allowed {
        if let Some(value) = spec.get(field.name) {
            push_predicate(&mut fragment, field.kind, value);
        }
    }
    let ignored = spec.unrecognized(allowed);
    if !ignored.is_empty() {
        tracing::debug!(?ignored, "ignoring filters outside the allow-list");
    }
    fragment
}
