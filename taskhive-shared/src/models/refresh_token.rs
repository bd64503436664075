/// Refresh token store
///
/// Rows hold SHA-256 digests of opaque refresh tokens (see
/// [`crate::auth::refresh`]). A token is single-use: `rotate` deletes the old
/// row and inserts the replacement, and logout deletes the row outright.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Stored refresh token
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RefreshToken {
    /// Unique row ID
    pub id: Uuid,

    /// Owning user
    pub user_id: Uuid,

    /// SHA-256 hex digest of the opaque token
    pub token_hash: String,

    /// When the token stops being accepted
    pub expires_at: DateTime<Utc>,

    /// When the token was issued
    pub created_at: DateTime<Utc>,
}

impl RefreshToken {
    /// Stores a new refresh token hash valid for `ttl_days`
    pub async fn create(
        pool: &PgPool,
        user_id: Uuid,
        token_hash: &str,
        ttl_days: i64,
    ) -> Result<Self, sqlx::Error> {
        let expires_at = Utc::now() + Duration::days(ttl_days);

        sqlx::query_as::<_, RefreshToken>(
            r#"
            INSERT INTO refresh_tokens (user_id, token_hash, expires_at)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, token_hash, expires_at, created_at
            "#,
        )
        .bind(user_id)
        .bind(token_hash)
        .bind(expires_at)
        .fetch_one(pool)
        .await
    }

    /// Finds an unexpired token by its hash
    pub async fn find_valid(pool: &PgPool, token_hash: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, RefreshToken>(
            "SELECT id, user_id, token_hash, expires_at, created_at \
             FROM refresh_tokens WHERE token_hash = $1 AND expires_at > NOW()",
        )
        .bind(token_hash)
        .fetch_optional(pool)
        .await
    }

    /// Deletes a token by its hash (logout, or rotation cleanup)
    pub async fn delete_by_hash(pool: &PgPool, token_hash: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE token_hash = $1")
            .bind(token_hash)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Replaces a used token with a fresh one (single-use rotation)
    pub async fn rotate(
        pool: &PgPool,
        old_hash: &str,
        user_id: Uuid,
        new_hash: &str,
        ttl_days: i64,
    ) -> Result<Self, sqlx::Error> {
        Self::delete_by_hash(pool, old_hash).await?;
        Self::create(pool, user_id, new_hash, ttl_days).await
    }
}
