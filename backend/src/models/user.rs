//! Local user records mirroring identities owned by the external provider.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::types::UserId;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
/// Database representation of a user known to this service.
pub struct User {
    /// Internal identifier referenced by sessions.
    #[schema(value_type = String)]
    pub id: UserId,
    /// Opaque identity issued by the external provider (token `sub`).
    pub external_id: String,
    /// Contact address; a placeholder until the provider syncs it.
    pub email: String,
    pub name: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Placeholder record created the first time an identity is seen.
    pub fn placeholder(external_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: UserId::new(),
            external_id: external_id.to_string(),
            email: placeholder_email(external_id),
            name: None,
            role: "user".to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

pub fn placeholder_email(external_id: &str) -> String {
    format!("{}@placeholder.local", external_id)
}

/// Identity of the authenticated caller, injected by the auth middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthIdentity {
    pub external_id: String,
}
