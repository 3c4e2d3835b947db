//! In-memory stores used by unit tests. They enforce the same uniqueness
//! guarantees as the Postgres indexes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::models::session::{Session, SessionListFilters, SessionStatus};
use crate::repositories::error::StoreError;
use crate::repositories::session::SessionRepositoryTrait;
use crate::repositories::user::UserDirectory;
use crate::types::{SessionId, UserId};
use crate::utils::time::utc_date;

#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: Mutex<Vec<Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a row bypassing every guard, for arranging fixtures.
    pub fn seed(&self, session: Session) {
        self.sessions.lock().unwrap().push(session);
    }

    pub fn all(&self) -> Vec<Session> {
        self.sessions.lock().unwrap().clone()
    }
}

#[async_trait]
impl SessionRepositoryTrait for InMemorySessionStore {
    async fn create(&self, session: &Session) -> Result<Session, StoreError> {
        let mut sessions = self.sessions.lock().unwrap();
        let same_user = sessions.iter().filter(|s| s.user_id == session.user_id);
        for existing in same_user {
            if session.is_active() && existing.is_active() {
                return Err(StoreError::ActiveSessionConflict);
            }
            if existing.start_date() == session.start_date() {
                return Err(StoreError::DateConflict);
            }
        }
        sessions.push(session.clone());
        Ok(session.clone())
    }

    async fn get_by_id(&self, id: SessionId) -> Result<Option<Session>, StoreError> {
        let sessions = self.sessions.lock().unwrap();
        Ok(sessions.iter().find(|s| s.id == id).cloned())
    }

    async fn get_active_for_user(&self, user_id: UserId) -> Result<Option<Session>, StoreError> {
        let sessions = self.sessions.lock().unwrap();
        Ok(sessions
            .iter()
            .find(|s| s.user_id == user_id && s.is_active())
            .cloned())
    }

    async fn has_session_on_date(
        &self,
        user_id: UserId,
        date: NaiveDate,
    ) -> Result<bool, StoreError> {
        let sessions = self.sessions.lock().unwrap();
        Ok(sessions
            .iter()
            .any(|s| s.user_id == user_id && utc_date(s.start_time) == date))
    }

    async fn complete(
        &self,
        id: SessionId,
        end_time: DateTime<Utc>,
    ) -> Result<Option<Session>, StoreError> {
        let mut sessions = self.sessions.lock().unwrap();
        Ok(sessions
            .iter_mut()
            .find(|s| s.id == id && s.is_active())
            .map(|stored| {
                stored.complete_at(end_time);
                stored.clone()
            }))
    }

    async fn complete_scheduled(
        &self,
        id: SessionId,
        now: DateTime<Utc>,
    ) -> Result<Option<Session>, StoreError> {
        let mut sessions = self.sessions.lock().unwrap();
        let Some(stored) = sessions.iter_mut().find(|s| s.id == id && s.is_active()) else {
            return Ok(None);
        };
        match stored.scheduled_end {
            Some(end) if end <= now => {
                stored.complete_at(end);
                Ok(Some(stored.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn set_scheduled_end(
        &self,
        id: SessionId,
        scheduled_end: Option<DateTime<Utc>>,
    ) -> Result<Session, StoreError> {
        let mut sessions = self.sessions.lock().unwrap();
        let stored = sessions
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(StoreError::NotFound)?;
        stored.scheduled_end = scheduled_end;
        Ok(stored.clone())
    }

    async fn list_due_scheduled(&self, now: DateTime<Utc>) -> Result<Vec<Session>, StoreError> {
        let sessions = self.sessions.lock().unwrap();
        let mut due: Vec<Session> = sessions
            .iter()
            .filter(|s| s.status == SessionStatus::Active)
            .filter(|s| s.scheduled_end.is_some_and(|end| end <= now))
            .cloned()
            .collect();
        due.sort_by_key(|s| s.scheduled_end);
        Ok(due)
    }

    async fn list_by_user(
        &self,
        user_id: UserId,
        filters: &SessionListFilters,
    ) -> Result<(Vec<Session>, i64), StoreError> {
        let sessions = self.sessions.lock().unwrap();
        let mut matching: Vec<Session> = sessions
            .iter()
            .filter(|s| s.user_id == user_id)
            .filter(|s| filters.status.map_or(true, |status| s.status == status))
            .filter(|s| filters.from_date.map_or(true, |from| s.start_date() >= from))
            .filter(|s| filters.to_date.map_or(true, |to| s.start_date() <= to))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.start_time.cmp(&a.start_time));

        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(filters.offset() as usize)
            .take(filters.limit() as usize)
            .collect();
        Ok((page, total))
    }
}

/// Wraps a store so that every `get_by_id` is followed by a sweep of that
/// session at `sweep_at`, as if the auto-stop pass ran between a caller's
/// read and its write.
pub struct SweepAfterRead {
    inner: Arc<InMemorySessionStore>,
    sweep_at: DateTime<Utc>,
}

impl SweepAfterRead {
    pub fn new(inner: Arc<InMemorySessionStore>, sweep_at: DateTime<Utc>) -> Self {
        Self { inner, sweep_at }
    }
}

#[async_trait]
impl SessionRepositoryTrait for SweepAfterRead {
    async fn create(&self, session: &Session) -> Result<Session, StoreError> {
        self.inner.create(session).await
    }

    async fn get_by_id(&self, id: SessionId) -> Result<Option<Session>, StoreError> {
        let snapshot = self.inner.get_by_id(id).await?;
        self.inner.complete_scheduled(id, self.sweep_at).await?;
        Ok(snapshot)
    }

    async fn get_active_for_user(&self, user_id: UserId) -> Result<Option<Session>, StoreError> {
        self.inner.get_active_for_user(user_id).await
    }

    async fn has_session_on_date(
        &self,
        user_id: UserId,
        date: NaiveDate,
    ) -> Result<bool, StoreError> {
        self.inner.has_session_on_date(user_id, date).await
    }

    async fn complete(
        &self,
        id: SessionId,
        end_time: DateTime<Utc>,
    ) -> Result<Option<Session>, StoreError> {
        self.inner.complete(id, end_time).await
    }

    async fn complete_scheduled(
        &self,
        id: SessionId,
        now: DateTime<Utc>,
    ) -> Result<Option<Session>, StoreError> {
        self.inner.complete_scheduled(id, now).await
    }

    async fn set_scheduled_end(
        &self,
        id: SessionId,
        scheduled_end: Option<DateTime<Utc>>,
    ) -> Result<Session, StoreError> {
        self.inner.set_scheduled_end(id, scheduled_end).await
    }

    async fn list_due_scheduled(&self, now: DateTime<Utc>) -> Result<Vec<Session>, StoreError> {
        self.inner.list_due_scheduled(now).await
    }

    async fn list_by_user(
        &self,
        user_id: UserId,
        filters: &SessionListFilters,
    ) -> Result<(Vec<Session>, i64), StoreError> {
        self.inner.list_by_user(user_id, filters).await
    }
}

#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    users: Mutex<HashMap<String, UserId>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an identity up front and returns its user ID.
    pub fn register(&self, external_id: &str) -> UserId {
        let mut users = self.users.lock().unwrap();
        *users
            .entry(external_id.to_string())
            .or_insert_with(UserId::new)
    }

    pub fn len(&self) -> usize {
        self.users.lock().unwrap().len()
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn resolve_or_create_user(&self, external_id: &str) -> Result<UserId, StoreError> {
        Ok(self.register(external_id))
    }

    async fn resolve_user(&self, external_id: &str) -> Result<Option<UserId>, StoreError> {
        Ok(self.users.lock().unwrap().get(external_id).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[tokio::test]
    async fn memory_store_rejects_second_active_session() {
        let store = InMemorySessionStore::new();
        let user = UserId::new();
        let monday = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        store
            .create(&Session::new_active(user, monday, None))
            .await
            .unwrap();

        let err = store
            .create(&Session::new_active(user, monday + Duration::days(1), None))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ActiveSessionConflict));
    }

    #[tokio::test]
    async fn memory_store_rejects_same_day_session() {
        let store = InMemorySessionStore::new();
        let user = UserId::new();
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 1, 0, 0).unwrap();
        store
            .create(&Session::new_completed(user, start, start + Duration::hours(5), None, start))
            .await
            .unwrap();

        let later = start + Duration::hours(20);
        let err = store
            .create(&Session::new_completed(user, later, later + Duration::hours(2), None, later))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DateConflict));
    }

    #[tokio::test]
    async fn terminal_session_is_never_completed_again() {
        let store = InMemorySessionStore::new();
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        let mut session = Session::new_active(UserId::new(), start, None);
        session.scheduled_end = Some(start + Duration::hours(5));
        store.seed(session.clone());

        let swept = store
            .complete_scheduled(session.id, start + Duration::hours(6))
            .await
            .unwrap()
            .expect("due session completes");
        assert_eq!(swept.end_time, session.scheduled_end);

        assert!(store
            .complete(session.id, start + Duration::hours(7))
            .await
            .unwrap()
            .is_none());
        let cleared = store.set_scheduled_end(session.id, None).await.unwrap();
        assert_eq!(cleared.status, SessionStatus::Completed);
        assert_eq!(cleared.end_time, session.scheduled_end);
    }
}
