//! Access token generation and validation
//!
//! Access tokens are short-lived HS256 JWTs carrying the user id and email.
//! Refresh tokens are not JWTs; see [`super::refresh_token`].
//!
//! # Security
//!
//! - **Algorithm**: HS256 (HMAC with SHA-256)
//! - **Expiration**: 15 minutes by default, configurable
//! - **Validation**: Signature, expiration, not-before and issuer checks
//! - **Secret Management**: Secrets should be at least 32 bytes
//!
//! # Example
//!
//! ```
//! use motopay_shared::auth::jwt::{create_token, validate_access_token, Claims};
//! use uuid::Uuid;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let user_id = Uuid::new_v4();
//! let claims = Claims::new(user_id, "a@x.com");
//! let token = create_token(&claims, "your-secret-key")?;
//!
//! let validated = validate_access_token(&token, "your-secret-key")?;
//! assert_eq!(validated.sub, user_id);
//! # Ok(())
//! # }
//! ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Issuer claim stamped on every access token
pub const ISSUER: &str = "motopay";

/// Default access token lifetime
pub const DEFAULT_ACCESS_TOKEN_TTL_MINUTES: i64 = 15;

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Failed to validate token
    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Invalid issuer
    #[error("Invalid issuer: expected {expected}")]
    InvalidIssuer { expected: String },
}

/// Access token claims
///
/// # Standard Claims
///
/// - `sub`: Subject (user ID)
/// - `iss`: Issuer (always "motopay")
/// - `iat`, `nbf`, `exp`: Unix timestamps
///
/// # Custom Claims
///
/// - `email`: Email of the user at issuance time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - User ID
    pub sub: Uuid,

    /// User email
    pub email: String,

    /// Issuer - Always "motopay"
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,
}

impl Claims {
    /// Creates claims with the default 15 minute lifetime
    pub fn new(user_id: Uuid, email: impl Into<String>) -> Self {
        Self::with_expiration(
            user_id,
            email,
            Duration::minutes(DEFAULT_ACCESS_TOKEN_TTL_MINUTES),
        )
    }

    /// Creates claims expiring `expires_in` from now
    ///
    /// # Example
    ///
    /// ```
    /// use motopay_shared::auth::jwt::Claims;
    /// use chrono::Duration;
    /// use uuid::Uuid;
    ///
    /// let claims = Claims::with_expiration(Uuid::new_v4(), "a@x.com", Duration::minutes(5));
    /// assert_eq!(claims.exp - claims.iat, 300);
    /// ```
    pub fn with_expiration(user_id: Uuid, email: impl Into<String>, expires_in: Duration) -> Self {
        let now = Utc::now();
        let expiration = now + expires_in;

        Self {
            sub: user_id,
            email: email.into(),
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            nbf: now.timestamp(),
        }
    }
}

/// Signs claims into an HS256 JWT
///
/// # Errors
///
/// Returns `JwtError::CreateError` if encoding fails
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Validates an access token and extracts its claims
///
/// Verifies signature, expiry, not-before and issuer.
///
/// # Errors
///
/// - `JwtError::Expired` for expired tokens
/// - `JwtError::InvalidIssuer` for tokens issued by someone else
/// - `JwtError::ValidationError` for anything else (bad signature, garbage input)
pub fn validate_access_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.set_required_spec_claims(&["exp", "iss", "sub"]);
    validation.validate_exp = true;
    validation.validate_nbf = true;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidIssuer => JwtError::InvalidIssuer {
            expected: ISSUER.to_string(),
        },
        _ => JwtError::ValidationError(format!("Token validation failed: {}", e)),
    })?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    #[test]
    fn test_claims_creation() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, "a@x.com");

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.email, "a@x.com");
        assert_eq!(claims.iss, ISSUER);
        assert_eq!(claims.exp - claims.iat, 15 * 60);
        assert_eq!(claims.nbf, claims.iat);
    }

    #[test]
    fn test_claims_with_custom_expiration() {
        let claims = Claims::with_expiration(Uuid::new_v4(), "a@x.com", Duration::hours(1));

        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_create_and_validate_token() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, "a@x.com");
        let token = create_token(&claims, SECRET).expect("Should create token");

        let validated = validate_access_token(&token, SECRET).expect("Should validate token");
        assert_eq!(validated.sub, user_id);
        assert_eq!(validated.email, "a@x.com");
        assert_eq!(validated.iss, ISSUER);
    }

    #[test]
    fn test_validate_with_wrong_secret() {
        let claims = Claims::new(Uuid::new_v4(), "a@x.com");
        let token = create_token(&claims, SECRET).unwrap();

        assert!(matches!(
            validate_access_token(&token, "another-secret-key-at-least-32-bytes"),
            Err(JwtError::ValidationError(_))
        ));
    }

    #[test]
    fn test_validate_expired_token() {
        let claims =
            Claims::with_expiration(Uuid::new_v4(), "a@x.com", Duration::seconds(-3600));

        let token = create_token(&claims, SECRET).unwrap();
        assert!(matches!(
            validate_access_token(&token, SECRET),
            Err(JwtError::Expired)
        ));
    }

    #[test]
    fn test_validate_foreign_issuer() {
        let mut claims = Claims::new(Uuid::new_v4(), "a@x.com");
        claims.iss = "someone-else".to_string();
        let token = create_token(&claims, SECRET).unwrap();

        assert!(matches!(
            validate_access_token(&token, SECRET),
            Err(JwtError::InvalidIssuer { .. })
        ));
    }

    #[test]
    fn test_validate_garbage() {
        assert!(validate_access_token("not-a-jwt", SECRET).is_err());
        assert!(validate_access_token("", SECRET).is_err());
    }
}
