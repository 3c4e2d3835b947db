//! Shared query-building helpers.

use sqlx::{Postgres, QueryBuilder};

/// Starts the filter list with WHERE, then joins each later filter with AND.
pub fn push_clause(builder: &mut QueryBuilder<'_, Postgres>, has_clause: &mut bool) {
    builder.push(if *has_clause { " AND " } else { " WHERE " });
    *has_clause = true;
}
