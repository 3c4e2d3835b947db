//! Time-tracking sessions and the request/response payloads built around them.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::{fmt, str::FromStr};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::types::{SessionId, UserId};

/// Shortest span a completed session may cover.
pub const MIN_SESSION_HOURS: i64 = 4;
/// Longest span a manually entered session may cover.
pub const MAX_MANUAL_SESSION_HOURS: i64 = 24;

pub fn min_session_duration() -> Duration {
    Duration::hours(MIN_SESSION_HOURS)
}

pub fn max_manual_session_duration() -> Duration {
    Duration::hours(MAX_MANUAL_SESSION_HOURS)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
/// Database representation of a tracked work interval.
pub struct Session {
    /// Unique identifier for the session.
    #[schema(value_type = String)]
    pub id: SessionId,
    /// Owning user.
    #[schema(value_type = String)]
    pub user_id: UserId,
    /// Instant the session started. Never changes after creation.
    pub start_time: DateTime<Utc>,
    /// Instant the session ended; absent while active.
    pub end_time: Option<DateTime<Utc>>,
    /// Requested auto-stop instant, honored only while active.
    pub scheduled_end: Option<DateTime<Utc>>,
    /// Lifecycle state.
    #[sqlx(try_from = "String")]
    pub status: SessionStatus,
    /// Free-text tag of the originating client.
    pub device_id: Option<String>,
    /// Creation timestamp for auditing.
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
/// Lifecycle state of a session. `Active` is the only non-terminal state.
pub enum SessionStatus {
    Active,
    Completed,
    /// Declared for compatibility; no operation produces it yet.
    Cancelled,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown session status: {0}")]
pub struct UnknownSessionStatus(pub String);

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::Completed => "completed",
            SessionStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        match self {
            SessionStatus::Active => false,
            SessionStatus::Completed | SessionStatus::Cancelled => true,
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = UnknownSessionStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(SessionStatus::Active),
            "completed" => Ok(SessionStatus::Completed),
            "cancelled" => Ok(SessionStatus::Cancelled),
            other => Err(UnknownSessionStatus(other.to_string())),
        }
    }
}

impl TryFrom<String> for SessionStatus {
    type Error = UnknownSessionStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl Session {
    /// A live clock-in starting at `now`.
    pub fn new_active(user_id: UserId, now: DateTime<Utc>, device_id: Option<String>) -> Self {
        Self {
            id: SessionId::new(),
            user_id,
            start_time: now,
            end_time: None,
            scheduled_end: None,
            status: SessionStatus::Active,
            device_id,
            created_at: now,
        }
    }

    /// A backfilled entry that never passes through `Active`.
    pub fn new_completed(
        user_id: UserId,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        device_id: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: SessionId::new(),
            user_id,
            start_time,
            end_time: Some(end_time),
            scheduled_end: None,
            status: SessionStatus::Completed,
            device_id,
            created_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }

    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }

    /// Closes the session at `end_time`.
    pub fn complete_at(&mut self, end_time: DateTime<Utc>) {
        self.end_time = Some(end_time);
        self.status = SessionStatus::Completed;
    }

    pub fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        self.end_time.unwrap_or(now) - self.start_time
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_time.date_naive()
    }
}

/// Normalizes an optional device tag: blank tags are treated as absent.
pub fn normalize_device_id(device_id: Option<String>) -> Option<String> {
    device_id
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[derive(Debug, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct StartSessionInput {
    #[validate(custom(function = "crate::validation::rules::validate_device_id"))]
    pub device_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StopSessionInput {
    #[schema(value_type = String)]
    pub session_id: SessionId,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ScheduleInput {
    #[schema(value_type = String)]
    pub session_id: SessionId,
    pub scheduled_end: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct ManualSessionInput {
    /// RFC 3339 timestamp.
    pub start_time: String,
    /// RFC 3339 timestamp.
    pub end_time: String,
    #[validate(custom(function = "crate::validation::rules::validate_device_id"))]
    pub device_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
/// Read-only view of a session's auto-stop schedule.
pub struct ScheduleResponse {
    #[schema(value_type = String)]
    pub session_id: SessionId,
    pub status: SessionStatus,
    pub start_time: DateTime<Utc>,
    pub scheduled_end: Option<DateTime<Utc>>,
}

impl From<Session> for ScheduleResponse {
    fn from(session: Session) -> Self {
        Self {
            session_id: session.id,
            status: session.status,
            start_time: session.start_time,
            scheduled_end: session.scheduled_end,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
/// Query parameters for the session history endpoint.
pub struct SessionListQuery {
    /// Restrict to one status (`active`, `completed`, `cancelled`).
    pub status: Option<String>,
    /// Page number starting at 1 (default: 1).
    pub page: Option<i64>,
    /// Page size (default: 20, max: 100).
    pub per_page: Option<i64>,
    /// Earliest start date, `YYYY-MM-DD`, inclusive.
    pub from_date: Option<String>,
    /// Latest start date, `YYYY-MM-DD`, inclusive.
    pub to_date: Option<String>,
}

pub const DEFAULT_PER_PAGE: i64 = 20;
pub const MAX_PER_PAGE: i64 = 100;
/// Highest page number honored; larger requests read as this page.
pub const MAX_PAGE: i64 = 1_000_000;

/// Normalized filters handed to the session store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionListFilters {
    pub status: Option<SessionStatus>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub page: i64,
    pub per_page: i64,
}

impl Default for SessionListFilters {
    fn default() -> Self {
        Self {
            status: None,
            from_date: None,
            to_date: None,
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl SessionListFilters {
    pub fn limit(&self) -> i64 {
        self.per_page
    }

    pub fn offset(&self) -> i64 {
        (self.page.max(1) - 1).saturating_mul(self.per_page)
    }
}

impl TryFrom<SessionListQuery> for SessionListFilters {
    type Error = UnknownSessionStatus;

    /// Unparsable dates are dropped rather than rejected, as are dates outside
    /// four-digit years.
    fn try_from(query: SessionListQuery) -> Result<Self, Self::Error> {
        let status = match query.status.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(raw.parse()?),
        };
        let parse_date = |raw: Option<String>| {
            raw.and_then(|value| NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok())
                .filter(|date| (1..=9999).contains(&date.year()))
        };

        Ok(Self {
            status,
            from_date: parse_date(query.from_date),
            to_date: parse_date(query.to_date),
            page: query.page.unwrap_or(1).clamp(1, MAX_PAGE),
            per_page: query
                .per_page
                .unwrap_or(DEFAULT_PER_PAGE)
                .clamp(1, MAX_PER_PAGE),
        })
    }
}
