//! Client error types

use reqwest::StatusCode;
use thiserror::Error;

use crate::types::FieldError;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport, TLS or body decoding failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with an error body
    #[error("API error {status} ({code}): {message}")]
    Api {
        status: StatusCode,
        code: String,
        message: String,
        details: Vec<FieldError>,
    },

    /// No session is stored; call `login` or `signup` first
    #[error("Not authenticated")]
    NotAuthenticated,

    /// The refresh token was rejected; the stored session has been cleared
    #[error("Session expired")]
    SessionExpired,
}

impl ClientError {
    /// HTTP status of an API error
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Http(e) => e.status(),
            _ => None,
        }
    }

    /// True when the caller has to log in again
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            ClientError::NotAuthenticated | ClientError::SessionExpired
        ) || self.status() == Some(StatusCode::UNAUTHORIZED)
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn api(status: StatusCode) -> ClientError {
        ClientError::Api {
            status,
            code: "x".to_string(),
            message: "y".to_string(),
            details: Vec::new(),
        }
    }

    #[test]
    fn test_auth_errors() {
        assert!(ClientError::NotAuthenticated.is_auth_error());
        assert!(ClientError::SessionExpired.is_auth_error());
        assert!(api(StatusCode::UNAUTHORIZED).is_auth_error());
        assert!(!api(StatusCode::FORBIDDEN).is_auth_error());
    }

    #[test]
    fn test_status() {
        assert!(api(StatusCode::NOT_FOUND).is_not_found());
        assert_eq!(ClientError::SessionExpired.status(), None);
        assert_eq!(
            api(StatusCode::CONFLICT).to_string(),
            "API error 409 Conflict (x): y"
        );
    }
}
