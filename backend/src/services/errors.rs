//! Failure kinds returned by the session rules and the schedule manager.

use thiserror::Error;

use crate::repositories::error::StoreError;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session not found")]
    SessionNotFound,
    #[error("user not found")]
    UserNotFound,
    #[error("you do not have access to this session")]
    Unauthorized,
    #[error("session already active")]
    SessionAlreadyActive,
    #[error("a session already exists for this date")]
    SessionExistsForDate,
    #[error("no active session")]
    NoActiveSession,
    #[error("end time must be after start time")]
    InvalidTimeRange,
    #[error("session must be at least 4 hours")]
    SessionTooShort,
    #[error("session duration cannot exceed 24 hours")]
    SessionTooLong,
    #[error("end time cannot be in the future")]
    FutureEndTime,
    #[error("schedule time must be in the future")]
    InvalidScheduleTime,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl SessionError {
    /// Stable machine-readable code exposed to API clients.
    pub fn code(&self) -> &'static str {
        match self {
            SessionError::SessionNotFound => "SESSION_NOT_FOUND",
            SessionError::UserNotFound => "USER_NOT_FOUND",
            SessionError::Unauthorized => "FORBIDDEN",
            SessionError::SessionAlreadyActive => "SESSION_ALREADY_ACTIVE",
            SessionError::SessionExistsForDate => "SESSION_EXISTS_FOR_DATE",
            SessionError::NoActiveSession => "NO_ACTIVE_SESSION",
            SessionError::InvalidTimeRange => "INVALID_TIME_RANGE",
            SessionError::SessionTooShort => "SESSION_TOO_SHORT",
            SessionError::SessionTooLong => "SESSION_TOO_LONG",
            SessionError::FutureEndTime => "FUTURE_END_TIME",
            SessionError::InvalidScheduleTime => "INVALID_SCHEDULE_TIME",
            SessionError::Internal(_) => "INTERNAL_SERVER_ERROR",
        }
    }
}

impl From<StoreError> for SessionError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ActiveSessionConflict => SessionError::SessionAlreadyActive,
            StoreError::DateConflict => SessionError::SessionExistsForDate,
            StoreError::NotFound => SessionError::SessionNotFound,
            StoreError::Database(db) => SessionError::Internal(db.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_conflicts_surface_as_business_failures() {
        assert!(matches!(
            SessionError::from(StoreError::ActiveSessionConflict),
            SessionError::SessionAlreadyActive
        ));
        assert!(matches!(
            SessionError::from(StoreError::DateConflict),
            SessionError::SessionExistsForDate
        ));
    }

    #[test]
    fn database_failures_are_internal() {
        let err = SessionError::from(StoreError::Database(sqlx::Error::PoolTimedOut));
        assert!(matches!(err, SessionError::Internal(_)));
        assert_eq!(err.code(), "INTERNAL_SERVER_ERROR");
    }

    #[test]
    fn codes_are_stable() {
        assert_eq!(SessionError::SessionTooShort.code(), "SESSION_TOO_SHORT");
        assert_eq!(SessionError::Unauthorized.code(), "FORBIDDEN");
        assert_eq!(SessionError::InvalidScheduleTime.to_string(), "schedule time must be in the future");
    }
}
