//! Request authentication helpers for Axum
//!
//! Parses `Authorization: Bearer <token>` headers and validates access tokens.
//! After successful authentication the API inserts an [`AuthContext`] into the
//! request extensions, so handlers can take `Extension<AuthContext>`.
//!
//! # Example
//!
//! ```
//! use axum::Extension;
//! use motopay_shared::auth::middleware::AuthContext;
//!
//! async fn handler(Extension(auth): Extension<AuthContext>) -> String {
//!     format!("User: {}", auth.user_id)
//! }
//! ```

use axum::{
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::{validate_access_token, Claims, JwtError};

/// Authentication context added to request extensions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: Uuid,

    /// Email carried by the access token
    pub email: String,
}

impl AuthContext {
    /// Creates auth context from validated access token claims
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email.clone(),
        }
    }
}

/// Error type for request authentication
#[derive(Debug, PartialEq, Eq)]
pub enum AuthError {
    /// Missing authorization header
    MissingCredentials,

    /// Invalid authorization header format
    InvalidFormat(String),

    /// Token validation failed
    InvalidToken(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            AuthError::MissingCredentials => {
                (StatusCode::UNAUTHORIZED, "Missing credentials").into_response()
            }
            AuthError::InvalidFormat(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            AuthError::InvalidToken(msg) => (StatusCode::UNAUTHORIZED, msg).into_response(),
        }
    }
}

/// Extracts the bearer token from request headers
///
/// # Errors
///
/// - `AuthError::MissingCredentials` when there is no Authorization header
/// - `AuthError::InvalidFormat` when it is not a `Bearer` credential
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))?;

    if token.is_empty() {
        return Err(AuthError::MissingCredentials);
    }

    Ok(token)
}

/// Validates the bearer access token of a request
///
/// # Errors
///
/// Any header or token problem, see [`AuthError`]
pub fn authenticate_headers(headers: &HeaderMap, secret: &str) -> Result<AuthContext, AuthError> {
    let token = extract_bearer_token(headers)?;

    let claims = validate_access_token(token, secret).map_err(|e| match e {
        JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
        JwtError::InvalidIssuer { .. } => AuthError::InvalidToken("Invalid issuer".to_string()),
        _ => AuthError::InvalidToken("Invalid token".to_string()),
    })?;

    Ok(AuthContext::from_claims(&claims))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::create_token;
    use axum::http::HeaderValue;
    use chrono::Duration;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_auth_context_from_claims() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, "a@x.com");

        let context = AuthContext::from_claims(&claims);
        assert_eq!(context.user_id, user_id);
        assert_eq!(context.email, "a@x.com");
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(
            extract_bearer_token(&HeaderMap::new()),
            Err(AuthError::MissingCredentials)
        );
        assert!(matches!(
            extract_bearer_token(&headers_with("Basic abc")),
            Err(AuthError::InvalidFormat(_))
        ));
        assert_eq!(
            extract_bearer_token(&headers_with("Bearer  ")),
            Err(AuthError::MissingCredentials)
        );
        assert_eq!(extract_bearer_token(&headers_with("Bearer abc")), Ok("abc"));
    }

    #[test]
    fn test_authenticate_headers() {
        let user_id = Uuid::new_v4();
        let token = create_token(&Claims::new(user_id, "a@x.com"), SECRET).unwrap();

        let context = authenticate_headers(&headers_with(&format!("Bearer {}", token)), SECRET)
            .expect("valid token");
        assert_eq!(context.user_id, user_id);
    }

    #[test]
    fn test_authenticate_headers_expired() {
        let claims = Claims::with_expiration(Uuid::new_v4(), "a@x.com", Duration::hours(-2));
        let token = create_token(&claims, SECRET).unwrap();

        assert_eq!(
            authenticate_headers(&headers_with(&format!("Bearer {}", token)), SECRET),
            Err(AuthError::InvalidToken("Token expired".to_string()))
        );
    }

    #[test]
    fn test_auth_error_into_response() {
        assert_eq!(
            AuthError::MissingCredentials.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::InvalidFormat("test".to_string()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AuthError::InvalidToken("test".to_string()).into_response().status(),
            StatusCode::UNAUTHORIZED
        );
    }
}
