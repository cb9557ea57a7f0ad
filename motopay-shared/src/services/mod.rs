//! Business services
//!
//! Services are plain structs holding `Arc<dyn ...Store>` ports handed in at
//! construction. They own every domain rule (validation, ownership, session
//! lifecycle) so the HTTP layer only translates requests and errors.
//!
//! - [`auth::AuthService`]: signup, login, refresh, logout and profile changes
//! - [`companies::CompanyService`], [`vehicles::VehicleService`],
//!   [`transactions::TransactionService`]: owned-record CRUD
//! - [`reports::ReportService`]: in-memory reductions over transactions

use validator::ValidateEmail;

use crate::auth::authorization::AuthzError;
use crate::auth::jwt::JwtError;
use crate::auth::password::PasswordError;
use crate::store::StoreError;

pub mod auth;
pub mod companies;
pub mod reports;
pub mod transactions;
pub mod vehicles;

pub use auth::{AuthService, AuthSettings};
pub use companies::CompanyService;
pub use reports::ReportService;
pub use transactions::TransactionService;
pub use vehicles::VehicleService;

/// Maximum length of names (users, companies, vehicles)
pub const MAX_NAME_LENGTH: usize = 100;

/// Maximum length of a transaction category
pub const MAX_CATEGORY_LENGTH: usize = 50;

/// Maximum length of free-text descriptions
pub const MAX_DESCRIPTION_LENGTH: usize = 500;

/// Maximum length of an email address
pub const MAX_EMAIL_LENGTH: usize = 255;

/// Service error types
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// A single input field failed validation
    #[error("{field}: {message}")]
    Validation { field: &'static str, message: String },

    /// Credentials or session are not acceptable
    #[error("{0}")]
    Unauthorized(String),

    /// Caller may not touch this record
    #[error("{0}")]
    Forbidden(String),

    /// Record is missing or soft-deleted
    #[error("{0}")]
    NotFound(String),

    /// Write collides with existing data
    #[error("{0}")]
    Conflict(String),

    /// Storage or crypto failure; details are for logs only
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        ServiceError::Validation {
            field,
            message: message.into(),
        }
    }
}

/// Service result type alias
pub type ServiceResult<T> = Result<T, ServiceError>;

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation(_) => ServiceError::Conflict("Resource already exists".to_string()),
            StoreError::Database(e) => ServiceError::Internal(e.to_string()),
        }
    }
}

impl From<PasswordError> for ServiceError {
    fn from(err: PasswordError) -> Self {
        ServiceError::Internal(err.to_string())
    }
}

impl From<JwtError> for ServiceError {
    fn from(err: JwtError) -> Self {
        ServiceError::Internal(err.to_string())
    }
}

impl From<AuthzError> for ServiceError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::NotFound(_) => ServiceError::NotFound(err.to_string()),
            AuthzError::NotOwner(_) | AuthzError::NotMember(_) => {
                ServiceError::Forbidden(err.to_string())
            }
        }
    }
}

/// Trims a required text field and checks its length in characters
pub(crate) fn required_text(
    field: &'static str,
    value: &str,
    max: usize,
) -> ServiceResult<String> {
    let value = value.trim();
    let length = value.chars().count();

    if length == 0 {
        return Err(ServiceError::validation(field, "must not be empty"));
    }
    if length > max {
        return Err(ServiceError::validation(
            field,
            format!("must be at most {} characters", max),
        ));
    }

    Ok(value.to_string())
}

/// Trims an optional text field; blank input becomes `None`
pub(crate) fn optional_text(
    field: &'static str,
    value: Option<&str>,
    max: usize,
) -> ServiceResult<Option<String>> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) if v.chars().count() > max => Err(ServiceError::validation(
            field,
            format!("must be at most {} characters", max),
        )),
        Some(v) => Ok(Some(v.to_string())),
    }
}

/// Trims and lowercases an email, rejecting malformed addresses
///
/// Uses the same email rules as the HTTP request validation.
pub fn normalize_email(email: &str) -> ServiceResult<String> {
    let email = email.trim().to_lowercase();

    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ServiceError::validation(
            "email",
            format!("must be at most {} characters", MAX_EMAIL_LENGTH),
        ));
    }

    if !email.validate_email() {
        return Err(ServiceError::validation("email", "must be a valid email address"));
    }

    Ok(email)
}
