//! User model and database operations
//!
//! Users are never hard-deleted. Deactivation clears `is_active` and stamps
//! `deleted_at`; such users can no longer authenticate.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE users (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     email VARCHAR(255) NOT NULL,            -- unique on LOWER(email)
//!     password_hash VARCHAR(255) NOT NULL,
//!     name VARCHAR(100) NOT NULL,
//!     phone VARCHAR(32),
//!     is_active BOOLEAN NOT NULL DEFAULT TRUE,
//!     deleted_at TIMESTAMPTZ,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     last_login_at TIMESTAMPTZ
//! );
//! ```
//!
//! # Example
//!
//! ```no_run
//! use motopay_shared::models::user::{User, CreateUser};
//! use motopay_shared::db::pool::{create_pool, DatabaseConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = create_pool(DatabaseConfig::default()).await?;
//!
//! let user = User::create(&pool, CreateUser {
//!     email: "a@x.com".to_string(),
//!     password_hash: "$argon2id$...".to_string(),
//!     name: "Ana".to_string(),
//! }).await?;
//!
//! let found = User::find_by_email(&pool, "A@X.com").await?;
//! assert_eq!(found.map(|u| u.id), Some(user.id));
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, email, password_hash, name, phone, is_active, deleted_at, \
                            created_at, updated_at, last_login_at";

/// User model representing a driver account
///
/// Passwords are stored as Argon2id hashes, never in plaintext. This type is
/// never serialized to clients; use [`UserProfile`] for that.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Email address, stored lowercased
    pub email: String,

    /// Argon2id password hash (PHC string)
    pub password_hash: String,

    /// Display name
    pub name: String,

    /// Optional phone number
    pub phone: Option<String>,

    /// Whether the account may authenticate
    pub is_active: bool,

    /// Soft-delete timestamp
    pub deleted_at: Option<DateTime<Utc>>,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,

    /// When the user last logged in (None if never logged in)
    pub last_login_at: Option<DateTime<Utc>>,
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    /// Email address (normalized by the caller)
    pub email: String,

    /// Argon2id password hash (NOT plaintext password!)
    pub password_hash: String,

    /// Display name
    pub name: String,
}

/// Public view of a user, safe to return from the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            phone: user.phone.clone(),
            created_at: user.created_at,
            last_login_at: user.last_login_at,
        }
    }
}

impl User {
    /// Whether the user has been soft-deleted
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// A user can authenticate iff active and not soft-deleted
    pub fn can_authenticate(&self) -> bool {
        self.is_active && !self.is_deleted()
    }

    /// Creates a new user in the database
    ///
    /// # Errors
    ///
    /// Returns an error if the email already exists (unique violation on
    /// `users_email_key`) or the database is unreachable.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (email, password_hash, name) VALUES ($1, $2, $3) RETURNING {}",
            USER_COLUMNS
        ))
        .bind(data.email)
        .bind(data.password_hash)
        .bind(data.name)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID, including deactivated users
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by email address (case-insensitive)
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE LOWER(email) = LOWER($1)",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Persists the mutable fields of a user
    ///
    /// Writes name, phone, password hash, active flag and soft-delete
    /// timestamp. `updated_at` is set to the current time.
    ///
    /// # Returns
    ///
    /// The stored user, or `None` if it no longer exists
    pub async fn save(pool: &PgPool, user: &User) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET name = $2, phone = $3, password_hash = $4, is_active = $5,
                deleted_at = $6, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.phone)
        .bind(&user.password_hash)
        .bind(user.is_active)
        .bind(user.deleted_at)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Updates the last login timestamp for a user
    ///
    /// # Returns
    ///
    /// True if user was found and updated, false otherwise
    pub async fn update_last_login(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            email: "a@x.com".to_string(),
            password_hash: "hash".to_string(),
            name: "Ana".to_string(),
            phone: None,
            is_active: true,
            deleted_at: None,
            created_at: now,
            updated_at: now,
            last_login_at: None,
        }
    }

    #[test]
    fn test_can_authenticate() {
        let mut user = sample_user();
        assert!(user.can_authenticate());

        user.is_active = false;
        assert!(!user.can_authenticate());

        user.is_active = true;
        user.deleted_at = Some(Utc::now());
        assert!(user.is_deleted());
        assert!(!user.can_authenticate());
    }

    #[test]
    fn test_profile_hides_password_hash() {
        let user = sample_user();
        let profile = UserProfile::from(&user);

        assert_eq!(profile.id, user.id);
        assert_eq!(profile.email, user.email);
        assert!(!format!("{:?}", profile).contains("password"));
    }
}
