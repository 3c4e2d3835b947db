//! User directory: maps external identities to internal user IDs.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

use crate::models::user::User;
use crate::repositories::error::StoreError;
use crate::types::UserId;

/// Resolves the caller's external identity to a local user.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Returns the user bound to `external_id`, creating a placeholder record
    /// the first time the identity is seen.
    async fn resolve_or_create_user(&self, external_id: &str) -> Result<UserId, StoreError>;

    /// Returns the user bound to `external_id` without creating one.
    async fn resolve_user(&self, external_id: &str) -> Result<Option<UserId>, StoreError>;
}

/// Postgres-backed user directory.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_external_id(&self, external_id: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, external_id, email, name, role, created_at, updated_at \
             FROM users WHERE external_id = $1",
        )
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }
}

#[async_trait]
impl UserDirectory for UserRepository {
    async fn resolve_or_create_user(&self, external_id: &str) -> Result<UserId, StoreError> {
        if let Some(id) = self.resolve_user(external_id).await? {
            return Ok(id);
        }

        let user = User::placeholder(external_id, Utc::now());
        let inserted: Option<UserId> = sqlx::query_scalar(
            "INSERT INTO users (id, external_id, email, name, role, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (external_id) DO NOTHING \
             RETURNING id",
        )
        .bind(user.id)
        .bind(&user.external_id)
        .bind(&user.email)
        .bind(user.name.as_deref())
        .bind(&user.role)
        .bind(user.created_at)
        .bind(user.updated_at)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(id) = inserted {
            tracing::info!(user_id = %id, external_id, "Created placeholder user");
            return Ok(id);
        }

        // Another request created the record between the lookup and the insert.
        self.resolve_user(external_id)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn resolve_user(&self, external_id: &str) -> Result<Option<UserId>, StoreError> {
        let id = sqlx::query_scalar::<_, UserId>("SELECT id FROM users WHERE external_id = $1")
            .bind(external_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(id)
    }
}
