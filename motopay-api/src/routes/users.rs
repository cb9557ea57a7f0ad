/// Account management for the authenticated user
///
/// # Endpoints
///
/// - `PATCH  /users/me` - Update name and phone
/// - `POST   /users/me/password` - Change password, ends every session
/// - `DELETE /users/me` - Deactivate the account, ends every session

use super::{AppJson, Data, Deleted};
use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Extension, Json};
use motopay_shared::{
    auth::middleware::AuthContext, models::user::UserProfile, services::auth::ProfileUpdate,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Profile changes; omitted fields are left untouched, a blank phone clears it
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(max = 100, message = "Name must be at most 100 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 32, message = "Phone must be at most 32 characters"))]
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,

    pub new_password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PasswordChanged {
    pub password_changed: bool,
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppJson(req): AppJson<UpdateProfileRequest>,
) -> ApiResult<Json<Data<UserProfile>>> {
    req.validate()?;

    let profile = state
        .auth
        .update_profile(
            auth.user_id,
            ProfileUpdate {
                name: req.name,
                phone: req.phone,
            },
        )
        .await?;

    Ok(Data::ok(profile))
}

/// Change password
///
/// # Errors
///
/// - `401 Unauthorized`: Current password is incorrect
/// - `422 Unprocessable Entity`: New password violates the policy
pub async fn change_password(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppJson(req): AppJson<ChangePasswordRequest>,
) -> ApiResult<Json<Data<PasswordChanged>>> {
    req.validate()?;

    state
        .auth
        .change_password(auth.user_id, &req.current_password, &req.new_password)
        .await?;

    Ok(Data::ok(PasswordChanged {
        password_changed: true,
    }))
}

/// Deactivate the account
///
/// Access tokens already issued stop working on the next request.
pub async fn deactivate(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Data<Deleted>>> {
    state.auth.deactivate(auth.user_id).await?;

    Ok(Deleted::response())
}
