//! Errors surfaced by the persistence layer.

use thiserror::Error;

/// Partial unique index allowing one `active` session per user.
pub const ONE_ACTIVE_PER_USER_CONSTRAINT: &str = "time_sessions_one_active_per_user";
/// Unique index allowing one session per user per UTC calendar day.
pub const ONE_PER_DAY_CONSTRAINT: &str = "time_sessions_one_per_day";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("an active session already exists for this user")]
    ActiveSessionConflict,
    #[error("a session already exists for this date")]
    DateConflict,
    #[error("record not found")]
    NotFound,
    #[error(transparent)]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                match db_err.constraint() {
                    Some(ONE_ACTIVE_PER_USER_CONSTRAINT) => return StoreError::ActiveSessionConflict,
                    Some(ONE_PER_DAY_CONSTRAINT) => return StoreError::DateConflict,
                    _ => {}
                }
            }
        }
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            other => StoreError::Database(other),
        }
    }
}
