//! Session rules: gatekeeper for every session-creating or -completing operation.
//!
//! The store performs no validation of its own. Each operation reads "now"
//! once from the injected [`Clock`] and checks its preconditions in a fixed
//! order, so the first violated rule decides the reported failure.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::models::session::{
    max_manual_session_duration, min_session_duration, normalize_device_id, Session,
    SessionListFilters,
};
use crate::repositories::{session::SessionRepositoryTrait, user::UserDirectory};
use crate::services::errors::SessionError;
use crate::types::{SessionId, UserId};
use crate::utils::time::{utc_date, Clock};

#[derive(Clone)]
pub struct TimeService {
    sessions: Arc<dyn SessionRepositoryTrait>,
    users: Arc<dyn UserDirectory>,
    clock: Arc<dyn Clock>,
}

impl TimeService {
    pub fn new(
        sessions: Arc<dyn SessionRepositoryTrait>,
        users: Arc<dyn UserDirectory>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            sessions,
            users,
            clock,
        }
    }

    /// Clocks the caller in.
    ///
    /// Fails with `SessionAlreadyActive` when a live session exists, then with
    /// `SessionExistsForDate` when any session already starts today (UTC).
    pub async fn start_session(
        &self,
        external_id: &str,
        device_id: Option<String>,
    ) -> Result<Session, SessionError> {
        let user_id = self.users.resolve_or_create_user(external_id).await?;

        if self.sessions.get_active_for_user(user_id).await?.is_some() {
            return Err(SessionError::SessionAlreadyActive);
        }

        let now = self.clock.now();
        if self
            .sessions
            .has_session_on_date(user_id, utc_date(now))
            .await?
        {
            return Err(SessionError::SessionExistsForDate);
        }

        let session = Session::new_active(user_id, now, normalize_device_id(device_id));
        let created = self.sessions.create(&session).await?;
        tracing::info!(session_id = %created.id, user_id = %user_id, "Session started");
        Ok(created)
    }

    /// Clocks the caller out of `session_id`.
    pub async fn stop_session(
        &self,
        external_id: &str,
        session_id: SessionId,
    ) -> Result<Session, SessionError> {
        let user_id = self.resolve_existing_user(external_id).await?;

        let session = self
            .sessions
            .get_by_id(session_id)
            .await?
            .ok_or(SessionError::SessionNotFound)?;
        if !session.is_owned_by(user_id) {
            return Err(SessionError::Unauthorized);
        }
        if !session.is_active() {
            return Err(SessionError::NoActiveSession);
        }

        let now = self.clock.now();
        if session.elapsed(now) < min_session_duration() {
            return Err(SessionError::SessionTooShort);
        }

        // The sweeper may have completed the session since it was read.
        let completed = self
            .sessions
            .complete(session.id, now)
            .await?
            .ok_or(SessionError::NoActiveSession)?;
        tracing::info!(session_id = %completed.id, user_id = %user_id, "Session stopped");
        Ok(completed)
    }

    /// Backfills a completed session from two RFC 3339 timestamps.
    ///
    /// Checks run in order: range, minimum length, maximum length, future end,
    /// then the per-day collision on the start's UTC date. No active-session
    /// check is made.
    pub async fn create_manual_session(
        &self,
        external_id: &str,
        start_time: &str,
        end_time: &str,
        device_id: Option<String>,
    ) -> Result<Session, SessionError> {
        let user_id = self.users.resolve_or_create_user(external_id).await?;

        let start = parse_timestamp(start_time)?;
        let end = parse_timestamp(end_time)?;

        if end <= start {
            return Err(SessionError::InvalidTimeRange);
        }
        let duration = end - start;
        if duration < min_session_duration() {
            return Err(SessionError::SessionTooShort);
        }
        if duration > max_manual_session_duration() {
            return Err(SessionError::SessionTooLong);
        }

        let now = self.clock.now();
        if end > now {
            return Err(SessionError::FutureEndTime);
        }

        if self
            .sessions
            .has_session_on_date(user_id, utc_date(start))
            .await?
        {
            return Err(SessionError::SessionExistsForDate);
        }

        let session =
            Session::new_completed(user_id, start, end, normalize_device_id(device_id), now);
        let created = self.sessions.create(&session).await?;
        tracing::info!(session_id = %created.id, user_id = %user_id, "Manual session created");
        Ok(created)
    }

    /// The caller's live session, if any.
    pub async fn get_active_session(
        &self,
        external_id: &str,
    ) -> Result<Option<Session>, SessionError> {
        let user_id = self.users.resolve_or_create_user(external_id).await?;
        Ok(self.sessions.get_active_for_user(user_id).await?)
    }

    /// One page of the caller's history, newest first, with the total match count.
    pub async fn list_sessions(
        &self,
        external_id: &str,
        filters: &SessionListFilters,
    ) -> Result<(Vec<Session>, i64), SessionError> {
        let user_id = self.users.resolve_or_create_user(external_id).await?;
        Ok(self.sessions.list_by_user(user_id, filters).await?)
    }

    async fn resolve_existing_user(&self, external_id: &str) -> Result<UserId, SessionError> {
        self.users
            .resolve_user(external_id)
            .await?
            .ok_or(SessionError::UserNotFound)
    }
}

/// Parses a strict RFC 3339 timestamp. Any failure is reported as an invalid range.
fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, SessionError> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|_| SessionError::InvalidTimeRange)
}
