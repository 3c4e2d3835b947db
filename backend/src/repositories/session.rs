//! Session store: persistence for time-tracking sessions.
//!
//! The store performs no business validation. The only guards it applies are
//! the storage-level uniqueness constraints, which surface as
//! [`StoreError::ActiveSessionConflict`] and [`StoreError::DateConflict`].

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::models::session::{Session, SessionListFilters, SessionStatus};
use crate::repositories::{common::push_clause, error::StoreError};
use crate::types::{SessionId, UserId};
use crate::utils::time::utc_day_bounds;

const SELECT_COLUMNS: &str =
    "id, user_id, start_time, end_time, scheduled_end, status, device_id, created_at";

/// Repository trait for session persistence.
///
/// Mocked with mockall in tests (`MockSessionRepositoryTrait`).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionRepositoryTrait: Send + Sync {
    /// Insert a new session.
    async fn create(&self, session: &Session) -> Result<Session, StoreError>;

    /// Find a session by ID.
    async fn get_by_id(&self, id: SessionId) -> Result<Option<Session>, StoreError>;

    /// Find the user's active session, if any.
    async fn get_active_for_user(&self, user_id: UserId) -> Result<Option<Session>, StoreError>;

    /// Whether the user has any session starting on the given UTC date.
    async fn has_session_on_date(&self, user_id: UserId, date: NaiveDate)
        -> Result<bool, StoreError>;

    /// Completes the session at `end_time` if it is still active.
    ///
    /// Returns `None` when no active session has this ID, so a terminal
    /// session is never reopened or given a second end time.
    async fn complete(
        &self,
        id: SessionId,
        end_time: DateTime<Utc>,
    ) -> Result<Option<Session>, StoreError>;

    /// Completes the session at its stored scheduled end, provided it is still
    /// active and that end is at or before `now`. Returns `None` otherwise.
    async fn complete_scheduled(
        &self,
        id: SessionId,
        now: DateTime<Utc>,
    ) -> Result<Option<Session>, StoreError>;

    /// Replaces only the scheduled end; status and end time are untouched.
    async fn set_scheduled_end(
        &self,
        id: SessionId,
        scheduled_end: Option<DateTime<Utc>>,
    ) -> Result<Session, StoreError>;

    /// Active sessions whose scheduled end is at or before `now`.
    async fn list_due_scheduled(&self, now: DateTime<Utc>) -> Result<Vec<Session>, StoreError>;

    /// A page of the user's sessions plus the total number matching the filters.
    async fn list_by_user(
        &self,
        user_id: UserId,
        filters: &SessionListFilters,
    ) -> Result<(Vec<Session>, i64), StoreError>;
}

/// Postgres-backed session store.
#[derive(Debug, Clone)]
pub struct SessionRepository {
    pool: PgPool,
}

impl SessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn push_list_filters<'a>(
    builder: &mut QueryBuilder<'a, Postgres>,
    user_id: UserId,
    filters: &SessionListFilters,
) {
    let mut has_clause = false;
    push_clause(builder, &mut has_clause);
    builder.push("user_id = ").push_bind(user_id);

    if let Some(status) = filters.status {
        push_clause(builder, &mut has_clause);
        builder.push("status = ").push_bind(status.as_str());
    }
    if let Some(from) = filters.from_date {
        let (start, _) = utc_day_bounds(from);
        push_clause(builder, &mut has_clause);
        builder.push("start_time >= ").push_bind(start);
    }
    // A date with no representable next day has no upper bound to apply.
    if let Some(end) = filters.to_date.and_then(|to| utc_day_bounds(to).1) {
        push_clause(builder, &mut has_clause);
        builder.push("start_time < ").push_bind(end);
    }
}

#[async_trait]
impl SessionRepositoryTrait for SessionRepository {
    async fn create(&self, session: &Session) -> Result<Session, StoreError> {
        let query = format!(
            "INSERT INTO time_sessions \
             (id, user_id, start_time, end_time, scheduled_end, status, device_id, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {}",
            SELECT_COLUMNS
        );
        let row = sqlx::query_as::<_, Session>(&query)
            .bind(session.id)
            .bind(session.user_id)
            .bind(session.start_time)
            .bind(session.end_time)
            .bind(session.scheduled_end)
            .bind(session.status.as_str())
            .bind(session.device_id.as_deref())
            .bind(session.created_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn get_by_id(&self, id: SessionId) -> Result<Option<Session>, StoreError> {
        let query = format!("SELECT {} FROM time_sessions WHERE id = $1", SELECT_COLUMNS);
        let row = sqlx::query_as::<_, Session>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn get_active_for_user(&self, user_id: UserId) -> Result<Option<Session>, StoreError> {
        let query = format!(
            "SELECT {} FROM time_sessions WHERE user_id = $1 AND status = $2 \
             ORDER BY created_at DESC LIMIT 1",
            SELECT_COLUMNS
        );
        let row = sqlx::query_as::<_, Session>(&query)
            .bind(user_id)
            .bind(SessionStatus::Active.as_str())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn has_session_on_date(
        &self,
        user_id: UserId,
        date: NaiveDate,
    ) -> Result<bool, StoreError> {
        let (start, end) = utc_day_bounds(date);
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM time_sessions \
             WHERE user_id = $1 AND start_time >= $2 \
             AND ($3::timestamptz IS NULL OR start_time < $3))",
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn complete(
        &self,
        id: SessionId,
        end_time: DateTime<Utc>,
    ) -> Result<Option<Session>, StoreError> {
        let query = format!(
            "UPDATE time_sessions SET end_time = $2, status = $3 \
             WHERE id = $1 AND status = $4 RETURNING {}",
            SELECT_COLUMNS
        );
        let row = sqlx::query_as::<_, Session>(&query)
            .bind(id)
            .bind(end_time)
            .bind(SessionStatus::Completed.as_str())
            .bind(SessionStatus::Active.as_str())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn complete_scheduled(
        &self,
        id: SessionId,
        now: DateTime<Utc>,
    ) -> Result<Option<Session>, StoreError> {
        let query = format!(
            "UPDATE time_sessions SET end_time = scheduled_end, status = $2 \
             WHERE id = $1 AND status = $3 \
             AND scheduled_end IS NOT NULL AND scheduled_end <= $4 RETURNING {}",
            SELECT_COLUMNS
        );
        let row = sqlx::query_as::<_, Session>(&query)
            .bind(id)
            .bind(SessionStatus::Completed.as_str())
            .bind(SessionStatus::Active.as_str())
            .bind(now)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn set_scheduled_end(
        &self,
        id: SessionId,
        scheduled_end: Option<DateTime<Utc>>,
    ) -> Result<Session, StoreError> {
        let query = format!(
            "UPDATE time_sessions SET scheduled_end = $2 WHERE id = $1 RETURNING {}",
            SELECT_COLUMNS
        );
        sqlx::query_as::<_, Session>(&query)
            .bind(id)
            .bind(scheduled_end)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn list_due_scheduled(&self, now: DateTime<Utc>) -> Result<Vec<Session>, StoreError> {
        let query = format!(
            "SELECT {} FROM time_sessions \
             WHERE status = $1 AND scheduled_end IS NOT NULL AND scheduled_end <= $2 \
             ORDER BY scheduled_end",
            SELECT_COLUMNS
        );
        let rows = sqlx::query_as::<_, Session>(&query)
            .bind(SessionStatus::Active.as_str())
            .bind(now)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn list_by_user(
        &self,
        user_id: UserId,
        filters: &SessionListFilters,
    ) -> Result<(Vec<Session>, i64), StoreError> {
        let mut count_builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM time_sessions");
        push_list_filters(&mut count_builder, user_id, filters);
        let total: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM time_sessions", SELECT_COLUMNS));
        push_list_filters(&mut builder, user_id, filters);
        builder
            .push(" ORDER BY start_time DESC LIMIT ")
            .push_bind(filters.limit())
            .push(" OFFSET ")
            .push_bind(filters.offset());

        let rows = builder
            .build_query_as::<Session>()
            .fetch_all(&self.pool)
            .await?;
        Ok((rows, total))
    }
}
