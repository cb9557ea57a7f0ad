//! Refresh token model and database operations
//!
//! Rows hold the SHA-256 digest of the token, never the token itself. A token
//! is usable iff it is neither revoked nor expired.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE refresh_tokens (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
//!     token_hash CHAR(64) NOT NULL UNIQUE,
//!     expires_at TIMESTAMPTZ NOT NULL,
//!     revoked BOOLEAN NOT NULL DEFAULT FALSE,
//!     revoked_at TIMESTAMPTZ,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

const TOKEN_COLUMNS: &str = "id, user_id, token_hash, expires_at, revoked, revoked_at, created_at";

/// Stored refresh token
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RefreshToken {
    /// Unique token row ID
    pub id: Uuid,

    /// Owning user
    pub user_id: Uuid,

    /// SHA-256 hex digest of the plaintext token
    pub token_hash: String,

    /// Hard expiry
    pub expires_at: DateTime<Utc>,

    /// Whether the token has been revoked
    pub revoked: bool,

    /// When the token was revoked (if applicable)
    pub revoked_at: Option<DateTime<Utc>>,

    /// When the token was issued
    pub created_at: DateTime<Utc>,
}

/// Input for storing a newly issued refresh token
#[derive(Debug, Clone)]
pub struct CreateRefreshToken {
    pub user_id: Uuid,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}

impl RefreshToken {
    /// Whether the token is past its expiry
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }

    /// Usable iff not revoked and not expired
    pub fn is_valid(&self) -> bool {
        !self.revoked && !self.is_expired()
    }

    /// Stores a newly issued refresh token
    pub async fn create(pool: &PgPool, data: CreateRefreshToken) -> Result<Self, sqlx::Error> {
        let token = sqlx::query_as::<_, RefreshToken>(&format!(
            r#"
            INSERT INTO refresh_tokens (user_id, token_hash, expires_at)
            VALUES ($1, $2, $3)
            RETURNING {}
            "#,
            TOKEN_COLUMNS
        ))
        .bind(data.user_id)
        .bind(data.token_hash)
        .bind(data.expires_at)
        .fetch_one(pool)
        .await?;

        Ok(token)
    }

    /// Looks a token up by its digest (indexed)
    pub async fn find_by_hash(pool: &PgPool, token_hash: &str) -> Result<Option<Self>, sqlx::Error> {
        let token = sqlx::query_as::<_, RefreshToken>(&format!(
            "SELECT {} FROM refresh_tokens WHERE token_hash = $1",
            TOKEN_COLUMNS
        ))
        .bind(token_hash)
        .fetch_optional(pool)
        .await?;

        Ok(token)
    }

    /// Revokes a single token
    ///
    /// # Returns
    ///
    /// True if the token was active and is now revoked; false if it was
    /// already revoked or does not exist.
    pub async fn revoke(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked = TRUE, revoked_at = NOW()
            WHERE id = $1 AND revoked = FALSE
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Revokes every active token of a user
    ///
    /// # Returns
    ///
    /// Number of tokens revoked
    pub async fn revoke_all_for_user(pool: &PgPool, user_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked = TRUE, revoked_at = NOW()
            WHERE user_id = $1 AND revoked = FALSE
            "#,
        )
        .bind(user_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn token(expires_in: Duration, revoked: bool) -> RefreshToken {
        RefreshToken {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            token_hash: "0".repeat(64),
            expires_at: Utc::now() + expires_in,
            revoked,
            revoked_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_is_valid() {
        assert!(token(Duration::days(30), false).is_valid());
        assert!(!token(Duration::days(30), true).is_valid());
        assert!(!token(Duration::seconds(-1), false).is_valid());
        assert!(!token(Duration::seconds(-1), true).is_valid());
    }

    #[test]
    fn test_is_expired() {
        assert!(token(Duration::seconds(-10), false).is_expired());
        assert!(!token(Duration::minutes(1), false).is_expired());
    }
}
