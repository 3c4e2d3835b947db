//! Schedule manager: per-session auto-stop times and the sweep that enforces them.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::models::session::Session;
use crate::repositories::{session::SessionRepositoryTrait, user::UserDirectory};
use crate::services::errors::SessionError;
use crate::types::SessionId;
use crate::utils::time::Clock;

/// Outcome of one pass over the due sessions.
#[derive(Debug, Default)]
pub struct SweepReport {
    /// Sessions completed during this pass.
    pub completed: usize,
    /// Sessions whose update failed; they stay due for the next pass.
    pub failures: Vec<(SessionId, SessionError)>,
}

impl SweepReport {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

#[derive(Clone)]
pub struct ScheduleService {
    sessions: Arc<dyn SessionRepositoryTrait>,
    users: Arc<dyn UserDirectory>,
    clock: Arc<dyn Clock>,
}

impl ScheduleService {
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

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Sets or replaces the auto-stop instant of a session the caller owns.
    ///
    /// The session's status is not checked; a schedule on a finished session
    /// is stored but never acted on.
    pub async fn set_schedule(
        &self,
        external_id: &str,
        session_id: SessionId,
        scheduled_end: DateTime<Utc>,
    ) -> Result<Session, SessionError> {
        let session = self.owned_session(external_id, session_id).await?;

        if scheduled_end <= self.clock.now() {
            return Err(SessionError::InvalidScheduleTime);
        }

        let updated = self
            .sessions
            .set_scheduled_end(session.id, Some(scheduled_end))
            .await?;
        tracing::info!(
            session_id = %updated.id,
            scheduled_end = %scheduled_end,
            "Auto-stop scheduled"
        );
        Ok(updated)
    }

    /// Clears the auto-stop instant. Clearing an absent schedule succeeds.
    pub async fn cancel_schedule(
        &self,
        external_id: &str,
        session_id: SessionId,
    ) -> Result<Session, SessionError> {
        let session = self.owned_session(external_id, session_id).await?;
        let updated = self.sessions.set_scheduled_end(session.id, None).await?;
        tracing::info!(session_id = %updated.id, "Auto-stop cancelled");
        Ok(updated)
    }

    /// Read-only view of a session the caller owns.
    pub async fn get_schedule(
        &self,
        external_id: &str,
        session_id: SessionId,
    ) -> Result<Session, SessionError> {
        self.owned_session(external_id, session_id).await
    }

    /// Completes every active session whose scheduled end is at or before `now`.
    ///
    /// Each session ends exactly at its scheduled instant, however late the
    /// pass runs. Sessions stopped or rescheduled since the scan are skipped.
    /// A failed update is recorded and the pass moves on; only a failed scan
    /// aborts it.
    pub async fn process_scheduled_sessions(
        &self,
        now: DateTime<Utc>,
    ) -> Result<SweepReport, SessionError> {
        let due = self.sessions.list_due_scheduled(now).await?;

        let mut report = SweepReport::default();
        for session in due {
            match self.sessions.complete_scheduled(session.id, now).await {
                Ok(Some(_)) => report.completed += 1,
                Ok(None) => {
                    tracing::debug!(
                        session_id = %session.id,
                        "Session stopped or rescheduled before auto-stop"
                    );
                }
                Err(err) => {
                    tracing::warn!(
                        session_id = %session.id,
                        error = %err,
                        "Failed to auto-stop session"
                    );
                    report.failures.push((session.id, err.into()));
                }
            }
        }

        Ok(report)
    }

    async fn owned_session(
        &self,
        external_id: &str,
        session_id: SessionId,
    ) -> Result<Session, SessionError> {
        let user_id = self
            .users
            .resolve_user(external_id)
            .await?
            .ok_or(SessionError::UserNotFound)?;

        let session = self
            .sessions
            .get_by_id(session_id)
            .await?
            .ok_or(SessionError::SessionNotFound)?;
        if !session.is_owned_by(user_id) {
            return Err(SessionError::Unauthorized);
        }
        Ok(session)
    }
}
