/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /auth/signup` - Register a new user and open a session
/// - `POST /auth/login` - Login and get tokens
/// - `POST /auth/refresh` - Exchange a refresh token for an access token
/// - `POST /auth/logout` - Revoke a refresh token
/// - `GET  /auth/me` - Current user profile (authenticated)
///
/// Login failures never reveal whether the email exists.

use super::{AppJson, Data};
use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, response::Response, Extension, Json};
use motopay_shared::{
    auth::middleware::AuthContext,
    models::user::UserProfile,
    services::auth::{RefreshedAccess, Session, Signup},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Signup request
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Strength is checked by the password policy
    pub password: String,

    #[validate(length(min = 1, max = 100, message = "Name must be 1 to 100 characters"))]
    pub name: String,
}

/// Login request
///
/// The email format is not checked here; every bad login gets the same 401.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Body of refresh and logout
#[derive(Debug, Deserialize, Validate)]
pub struct RefreshTokenRequest {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LogoutResponse {
    pub logged_out: bool,
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /auth/signup
/// Content-Type: application/json
///
/// {
///   "email": "driver@example.com",
///   "password": "SecureP@ss123",
///   "name": "Ana Souza"
/// }
/// ```
///
/// # Response (201)
///
/// ```json
/// {
///   "data": {
///     "user": { "id": "uuid", "email": "driver@example.com", "name": "Ana Souza", ... },
///     "access_token": "eyJ...",
///     "refresh_token": "mpr_...",
///     "token_type": "Bearer",
///     "expires_in": 900
///   }
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Malformed JSON
/// - `409 Conflict`: Email already registered
/// - `422 Unprocessable Entity`: Validation failed
pub async fn signup(
    State(state): State<AppState>,
    AppJson(req): AppJson<SignupRequest>,
) -> ApiResult<Response> {
    req.validate()?;

    let session = state
        .auth
        .signup(Signup {
            email: req.email,
            password: req.password,
            name: req.name,
        })
        .await?;

    Ok(Data::created(session))
}

/// Login with email and password
///
/// # Errors
///
/// - `401 Unauthorized`: Invalid email or password (same message for both)
pub async fn login(
    State(state): State<AppState>,
    AppJson(req): AppJson<LoginRequest>,
) -> ApiResult<Json<Data<Session>>> {
    req.validate()?;

    let session = state.auth.login(&req.email, &req.password).await?;

    Ok(Data::ok(session))
}

/// Exchange a refresh token for a new access token
///
/// The refresh token stays valid unless rotation is enabled, in which case
/// the response carries a replacement `refresh_token`.
///
/// # Errors
///
/// - `401 Unauthorized`: Unknown, revoked or expired refresh token
pub async fn refresh(
    State(state): State<AppState>,
    AppJson(req): AppJson<RefreshTokenRequest>,
) -> ApiResult<Json<Data<RefreshedAccess>>> {
    req.validate()?;

    let access = state.auth.refresh(&req.refresh_token).await?;

    Ok(Data::ok(access))
}

/// Revoke a refresh token
///
/// Idempotent: unknown or already revoked tokens still answer 200.
pub async fn logout(
    State(state): State<AppState>,
    AppJson(req): AppJson<RefreshTokenRequest>,
) -> ApiResult<Json<Data<LogoutResponse>>> {
    req.validate()?;

    state.auth.logout(&req.refresh_token).await?;

    Ok(Data::ok(LogoutResponse { logged_out: true }))
}

/// Current user profile
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Data<UserProfile>>> {
    let profile = state.auth.me(auth.user_id).await?;

    Ok(Data::ok(profile))
}
