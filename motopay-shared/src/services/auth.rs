//! Credential and session service
//!
//! Owns the whole session lifecycle:
//!
//! - `signup` / `login` issue a token pair (JWT access token plus opaque
//!   refresh token)
//! - `refresh` trades a live refresh token for a new access token, rotating
//!   the refresh token only when [`AuthSettings::rotate_refresh_tokens`] is set
//! - `logout` revokes a refresh token and is idempotent
//! - password change and deactivation revoke every refresh token of the user
//!
//! Login failures are indistinguishable: unknown email, disabled account and
//! wrong password all yield the same message, and an unknown email still pays
//! for one password verification.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{normalize_email, optional_text, required_text, ServiceError, ServiceResult, MAX_NAME_LENGTH};
use crate::auth::jwt::{create_token, Claims, DEFAULT_ACCESS_TOKEN_TTL_MINUTES};
use crate::auth::password::{
    hash_password, validate_password_policy, verify_dummy_password, verify_password,
};
use crate::auth::refresh_token::{
    generate_refresh_token, hash_refresh_token, validate_refresh_token_format,
    DEFAULT_REFRESH_TOKEN_TTL_DAYS,
};
use crate::models::refresh_token::CreateRefreshToken;
use crate::models::user::{CreateUser, User, UserProfile};
use crate::store::{RefreshTokenStore, StoreError, UserStore};

/// Message for every failed login
pub const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Message for every rejected refresh token
pub const INVALID_REFRESH_TOKEN: &str = "Invalid or expired refresh token";

const INACTIVE_ACCOUNT: &str = "Account is not active";

/// Maximum length of a phone number
const MAX_PHONE_LENGTH: usize = 32;

/// Token type reported to clients
pub const TOKEN_TYPE: &str = "Bearer";

/// Session settings
#[derive(Debug, Clone)]
pub struct AuthSettings {
    /// HMAC secret for access tokens
    pub jwt_secret: String,

    pub access_token_ttl: Duration,

    pub refresh_token_ttl: Duration,

    /// Revoke the presented refresh token and issue a new one on every refresh
    pub rotate_refresh_tokens: bool,
}

impl AuthSettings {
    /// Settings with default lifetimes (15 minutes / 30 days, no rotation)
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            access_token_ttl: Duration::minutes(DEFAULT_ACCESS_TOKEN_TTL_MINUTES),
            refresh_token_ttl: Duration::days(DEFAULT_REFRESH_TOKEN_TTL_DAYS),
            rotate_refresh_tokens: false,
        }
    }
}

/// Freshly issued access and refresh tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

/// Result of signup and login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub user: UserProfile,
    #[serde(flatten)]
    pub tokens: TokenPair,
}

/// Result of a refresh
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshedAccess {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    /// Only present when refresh tokens are rotated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

/// Signup input
#[derive(Debug, Clone)]
pub struct Signup {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// Profile changes; `None` leaves a field untouched, a blank phone clears it
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
}

/// Credential and session service
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    refresh_tokens: Arc<dyn RefreshTokenStore>,
    settings: AuthSettings,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        refresh_tokens: Arc<dyn RefreshTokenStore>,
        settings: AuthSettings,
    ) -> Self {
        Self {
            users,
            refresh_tokens,
            settings,
        }
    }

    pub fn settings(&self) -> &AuthSettings {
        &self.settings
    }

    /// Registers a new account and opens a session for it
    ///
    /// # Errors
    ///
    /// - `Validation` for a malformed email, weak password or bad name
    /// - `Conflict` if the email is already registered (any case)
    pub async fn signup(&self, input: Signup) -> ServiceResult<Session> {
        let email = normalize_email(&input.email)?;
        validate_password_policy(&input.password)
            .map_err(|message| ServiceError::validation("password", message))?;
        let name = required_text("name", &input.name, MAX_NAME_LENGTH)?;

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(email_taken());
        }

        let password_hash = hash_password(&input.password)?;

        let user = self
            .users
            .create(CreateUser {
                email,
                password_hash,
                name,
            })
            .await
            .map_err(|e| match e {
                StoreError::UniqueViolation(_) => email_taken(),
                other => other.into(),
            })?;

        info!(user_id = %user.id, "User registered");

        let tokens = self.issue_tokens(&user).await?;
        Ok(Session {
            user: UserProfile::from(&user),
            tokens,
        })
    }

    /// Verifies credentials and opens a session
    ///
    /// # Errors
    ///
    /// `Unauthorized` with [`INVALID_CREDENTIALS`] for every kind of failure
    pub async fn login(&self, email: &str, password: &str) -> ServiceResult<Session> {
        let email = email.trim().to_lowercase();

        let user = match self.users.find_by_email(&email).await? {
            Some(user) if user.can_authenticate() => user,
            _ => {
                verify_dummy_password(password);
                debug!("Login rejected: no usable account");
                return Err(ServiceError::Unauthorized(INVALID_CREDENTIALS.to_string()));
            }
        };

        if !verify_password(password, &user.password_hash)? {
            debug!(user_id = %user.id, "Login rejected: wrong password");
            return Err(ServiceError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        self.users.update_last_login(user.id).await?;
        let mut user = user;
        user.last_login_at = Some(Utc::now());

        info!(user_id = %user.id, "User logged in");

        let tokens = self.issue_tokens(&user).await?;
        Ok(Session {
            user: UserProfile::from(&user),
            tokens,
        })
    }

    /// Exchanges a live refresh token for a new access token
    ///
    /// # Errors
    ///
    /// `Unauthorized` if the token is malformed, unknown, revoked, expired, or
    /// its owner can no longer authenticate
    pub async fn refresh(&self, presented: &str) -> ServiceResult<RefreshedAccess> {
        let rejected = || ServiceError::Unauthorized(INVALID_REFRESH_TOKEN.to_string());

        if !validate_refresh_token_format(presented) {
            return Err(rejected());
        }

        let stored = self
            .refresh_tokens
            .find_by_hash(&hash_refresh_token(presented))
            .await?
            .filter(|token| token.is_valid())
            .ok_or_else(rejected)?;

        let user = self
            .users
            .find_by_id(stored.user_id)
            .await?
            .filter(User::can_authenticate)
            .ok_or_else(rejected)?;

        let refresh_token = if self.settings.rotate_refresh_tokens {
            // Losing a race with a concurrent rotation counts as reuse
            if !self.refresh_tokens.revoke(stored.id).await? {
                warn!(user_id = %user.id, "Refresh token reused during rotation");
                return Err(rejected());
            }
            Some(self.store_refresh_token(user.id).await?)
        } else {
            None
        };

        debug!(user_id = %user.id, rotated = refresh_token.is_some(), "Access token refreshed");

        Ok(RefreshedAccess {
            access_token: self.access_token(&user)?,
            token_type: TOKEN_TYPE.to_string(),
            expires_in: self.settings.access_token_ttl.num_seconds(),
            refresh_token,
        })
    }

    /// Revokes a refresh token
    ///
    /// Unknown, malformed and already revoked tokens are accepted silently.
    pub async fn logout(&self, presented: &str) -> ServiceResult<()> {
        if !validate_refresh_token_format(presented) {
            return Ok(());
        }

        if let Some(token) = self
            .refresh_tokens
            .find_by_hash(&hash_refresh_token(presented))
            .await?
        {
            if self.refresh_tokens.revoke(token.id).await? {
                info!(user_id = %token.user_id, "User logged out");
            }
        }

        Ok(())
    }

    /// Loads a user that is still allowed to authenticate
    ///
    /// Used for every request carrying an access token, so a deactivated
    /// account is locked out before its access token expires.
    pub async fn authenticate(&self, user_id: Uuid) -> ServiceResult<User> {
        self.users
            .find_by_id(user_id)
            .await?
            .filter(User::can_authenticate)
            .ok_or_else(|| ServiceError::Unauthorized(INACTIVE_ACCOUNT.to_string()))
    }

    pub async fn me(&self, user_id: Uuid) -> ServiceResult<UserProfile> {
        let user = self.authenticate(user_id).await?;
        Ok(UserProfile::from(&user))
    }

    pub async fn update_profile(
        &self,
        user_id: Uuid,
        update: ProfileUpdate,
    ) -> ServiceResult<UserProfile> {
        let mut user = self.authenticate(user_id).await?;

        if let Some(name) = update.name.as_deref() {
            user.name = required_text("name", name, MAX_NAME_LENGTH)?;
        }
        if let Some(phone) = update.phone.as_deref() {
            user.phone = optional_text("phone", Some(phone), MAX_PHONE_LENGTH)?;
        }

        let user = self.save(&user).await?;
        Ok(UserProfile::from(&user))
    }

    /// Replaces the password and ends every session of the user
    ///
    /// # Errors
    ///
    /// - `Unauthorized` if `current` does not match
    /// - `Validation` if `new` violates the password policy
    pub async fn change_password(
        &self,
        user_id: Uuid,
        current: &str,
        new: &str,
    ) -> ServiceResult<()> {
        let mut user = self.authenticate(user_id).await?;

        if !verify_password(current, &user.password_hash)? {
            return Err(ServiceError::Unauthorized(
                "Current password is incorrect".to_string(),
            ));
        }
        validate_password_policy(new)
            .map_err(|message| ServiceError::validation("new_password", message))?;

        user.password_hash = hash_password(new)?;
        self.save(&user).await?;

        let revoked = self.refresh_tokens.revoke_all_for_user(user_id).await?;
        info!(user_id = %user_id, revoked, "Password changed");

        Ok(())
    }

    /// Disables the account and ends every session of the user
    pub async fn deactivate(&self, user_id: Uuid) -> ServiceResult<()> {
        let mut user = self.authenticate(user_id).await?;

        user.is_active = false;
        user.deleted_at = Some(Utc::now());
        self.save(&user).await?;

        let revoked = self.refresh_tokens.revoke_all_for_user(user_id).await?;
        info!(user_id = %user_id, revoked, "Account deactivated");

        Ok(())
    }

    async fn save(&self, user: &User) -> ServiceResult<User> {
        self.users
            .save(user)
            .await?
            .ok_or_else(|| ServiceError::Unauthorized(INACTIVE_ACCOUNT.to_string()))
    }

    fn access_token(&self, user: &User) -> ServiceResult<String> {
        let claims = Claims::with_expiration(user.id, user.email.clone(), self.settings.access_token_ttl);
        Ok(create_token(&claims, &self.settings.jwt_secret)?)
    }

    async fn store_refresh_token(&self, user_id: Uuid) -> ServiceResult<String> {
        let (token, token_hash) = generate_refresh_token();

        self.refresh_tokens
            .create(CreateRefreshToken {
                user_id,
                token_hash,
                expires_at: Utc::now() + self.settings.refresh_token_ttl,
            })
            .await?;

        Ok(token)
    }

    async fn issue_tokens(&self, user: &User) -> ServiceResult<TokenPair> {
        Ok(TokenPair {
            access_token: self.access_token(user)?,
            refresh_token: self.store_refresh_token(user.id).await?,
            token_type: TOKEN_TYPE.to_string(),
            expires_in: self.settings.access_token_ttl.num_seconds(),
        })
    }
}

fn email_taken() -> ServiceError {
    ServiceError::Conflict("Email already registered".to_string())
}
