//! Dynamic statement composition.
//!
//! Every read a repository issues goes through [`select`], [`count`] or
//! [`aggregate`]. All three build their WHERE clause with the same
//! [`compose_where`] call and differ only in the projection (and, for
//! `select`, the ORDER BY/LIMIT/OFFSET tail), so a filter can't mean one
//! thing for the rows and another for the totals.

mod filter;
mod fragment;
mod pagination;

pub use filter::{compose_where, FilterField, FilterKind, FilterSpec, FilterValue};
pub use fragment::{PlaceholderStyle, QueryFragment, Statement};
pub use pagination::{
    Page, PaginationPolicy, PaginationRequest, PaginationSpec, SortDirection, SortField,
};

/// `SELECT <columns> FROM <table> WHERE … ORDER BY … LIMIT ? OFFSET ?`
pub fn select(
    style: PlaceholderStyle,
    columns: &str,
    table: &str,
    filters: &FilterSpec,
    allowed: &[FilterField],
    page: &PaginationSpec,
) -> Statement {
    let mut statement = QueryFragment::new(style, 1);
    statement.push_sql(&format!("SELECT {columns} FROM {table}"));
    let predicate = compose_where(filters, allowed, style, statement.next_index());
    statement.append(predicate);
    page.push_order_and_page(&mut statement);
    statement.finish()
}

/// `SELECT COUNT(*) AS total FROM <table> WHERE …`
pub fn count(
    style: PlaceholderStyle,
    table: &str,
    filters: &FilterSpec,
    allowed: &[FilterField],
) -> Statement {
    aggregate(style, "COUNT(*) AS total", table, filters, allowed)
}

/// `SELECT <projection> FROM <table> WHERE …` with no ordering or paging.
pub fn aggregate(
    style: PlaceholderStyle,
    projection: &str,
    table: &str,
    filters: &FilterSpec,
    allowed: &[FilterField],
) -> Statement {
    let mut statement = QueryFragment::new(style, 1);
    statement.push_sql(&format!("SELECT {projection} FROM {table}"));
    let predicate = compose_where(filters, allowed, style, statement.next_index());
    statement.append(predicate);
    statement.finish()
}
