//! Pagination and sort sanitizing.
//!
//! Raw paging input arrives as a [`PaginationRequest`] with every field
//! optional and possibly out of range. [`PaginationPolicy::sanitize`] is the
//! only way to obtain a [`PaginationSpec`], so statement builders only ever
//! see a clamped limit, a non-negative offset and a sort column taken from the
//! repository's allow-list.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::fragment::QueryFragment;
use crate::config::PageLimits;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// Case-insensitive `asc`/`ascending`/`desc`/`descending`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Some(SortDirection::Asc),
            "desc" | "descending" => Some(SortDirection::Desc),
            _ => None,
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Paging input as received. Nothing here is trusted.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PaginationRequest {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    /// 1-based; only used when `offset` is absent.
    pub page: Option<i64>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

impl PaginationRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn page(mut self, page: i64) -> Self {
        self.page = Some(page);
        self
    }

    pub fn sort(mut self, field: impl Into<String>, order: impl Into<String>) -> Self {
        self.sort_by = Some(field.into());
        self.sort_order = Some(order.into());
        self
    }

    /// Read paging options from a JSON object, accepting numbers or numeric
    /// strings (query strings arrive as text). Unusable values are dropped.
    pub fn from_json(json: &JsonValue) -> Self {
        let int = |key: &str| match json.get(key) {
            Some(JsonValue::Number(n)) => n.as_i64(),
            Some(JsonValue::String(s)) => s.trim().parse().ok(),
            _ => None,
        };
        let text = |key: &str| {
            json.get(key)
                .and_then(JsonValue::as_str)
                .map(str::to_string)
        };
        Self {
            limit: int("limit"),
            offset: int("offset"),
            page: int("page"),
            sort_by: text("sort_by").or_else(|| text("sortBy")),
            sort_order: text("sort_order").or_else(|| text("sortOrder")),
        }
    }
}

/// A sortable field: the name callers use and the column it maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortField {
    pub name: &'static str,
    pub column: &'static str,
    pub default_direction: SortDirection,
}

impl SortField {
    pub const fn new(
        name: &'static str,
        column: &'static str,
        default_direction: SortDirection,
    ) -> Self {
        Self {
            name,
            column,
            default_direction,
        }
    }
}

/// Per-repository paging rules.
#[derive(Debug, Clone, Copy)]
pub struct PaginationPolicy {
    pub limits: PageLimits,
    /// Allow-listed sort fields; the first one is the default.
    pub sort_fields: &'static [SortField],
    /// Appended to every ORDER BY so equal sort keys page deterministically.
    pub tiebreak_column: &'static str,
}

/// Sanitized paging, ready for a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationSpec {
    limit: u32,
    offset: u64,
    sort_column: &'static str,
    tiebreak_column: &'static str,
    direction: SortDirection,
}

impl PaginationSpec {
    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn sort_column(&self) -> &'static str {
        self.sort_column
    }

    pub fn direction(&self) -> SortDirection {
        self.direction
    }

    /// Append `ORDER BY … LIMIT ?n OFFSET ?n+1`.
    pub fn push_order_and_page(&self, fragment: &mut QueryFragment) {
        let dir = self.direction.as_sql();
        if self.sort_column == self.tiebreak_column {
            fragment.push_sql(&format!(" ORDER BY {} {dir}", self.sort_column));
        } else {
            fragment.push_sql(&format!(
                " ORDER BY {} {dir}, {} {dir}",
                self.sort_column, self.tiebreak_column
            ));
        }
        fragment
            .push_sql(" LIMIT ")
            .bind(self.limit)
            .push_sql(" OFFSET ")
            .bind(self.offset);
    }
}

impl PaginationPolicy {
    pub fn sanitize(&self, request: &PaginationRequest) -> PaginationSpec {
        // Limits built by hand bypass `PageLimits::new`.
        let max = self.limits.max_limit.max(1);
        let limit = match request.limit {
            Some(l) if l > 0 => u32::try_from(l).unwrap_or(u32::MAX).min(max),
            _ => self.limits.default_limit.clamp(1, max),
        };

        let offset = match (request.offset, request.page) {
            (Some(o), _) => u64::try_from(o).unwrap_or(0),
            (None, Some(p)) if p > 1 => u64::try_from(p - 1)
                .unwrap_or(0)
                .saturating_mul(u64::from(limit)),
            _ => 0,
        };

        let requested_field = request.sort_by.as_deref().and_then(|raw| {
            let raw = raw.trim();
            self.sort_fields
                .iter()
                .find(|f| f.name.eq_ignore_ascii_case(raw))
        });
        let (sort_column, field_direction) = match requested_field.or(self.sort_fields.first()) {
            Some(field) => (field.column, field.default_direction),
            None => (self.tiebreak_column, SortDirection::Asc),
        };
        let direction = request
            .sort_order
            .as_deref()
            .and_then(SortDirection::parse)
            .unwrap_or(field_direction);

        PaginationSpec {
            limit,
            offset,
            sort_column,
            tiebreak_column: self.tiebreak_column,
            direction,
        }
    }
}

/// One page of results plus the total matching the same filters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub limit: u32,
    pub offset: u64,
}

impl<T> Page<T> {
    pub fn has_more(&self) -> bool {
        self.offset + (self.items.len() as u64) < self.total
    }
}
