//! Password hashing using Argon2id
//!
//! # Security
//!
//! - **Algorithm**: Argon2id
//! - **Memory**: 64 MB (65536 KB)
//! - **Iterations**: 3 passes
//! - **Parallelism**: 4 lanes
//! - **Output**: 32-byte hash, stored as a PHC string
//!
//! # Example
//!
//! ```
//! use motopay_shared::auth::password::{hash_password, verify_password};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let hash = hash_password("pw12345678")?;
//!
//! assert!(verify_password("pw12345678", &hash)?);
//! assert!(!verify_password("wrong_password", &hash)?);
//! # Ok(())
//! # }
//! ```

use std::sync::OnceLock;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, ParamsBuilder, Version,
};

/// Minimum accepted password length (characters)
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum accepted password length (characters)
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Error type for password hashing operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Failed to hash password
    #[error("Failed to hash password: {0}")]
    HashError(String),

    /// Failed to verify password
    #[error("Failed to verify password: {0}")]
    VerifyError(String),

    /// Invalid password hash format
    #[error("Invalid password hash format: {0}")]
    InvalidHash(String),
}

fn argon2_instance() -> Result<Argon2<'static>, PasswordError> {
    let params = ParamsBuilder::new()
        .m_cost(65536) // 64 MB
        .t_cost(3)
        .p_cost(4)
        .output_len(32)
        .build()
        .map_err(|e| PasswordError::HashError(format!("Invalid parameters: {}", e)))?;

    Ok(Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params))
}

/// Hashes a password using Argon2id with a fresh random salt
///
/// Returns the PHC string, e.g. `$argon2id$v=19$m=65536,t=3,p=4$<salt>$<hash>`.
///
/// # Errors
///
/// Returns `PasswordError::HashError` if hashing fails
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let password_hash = argon2_instance()?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashError(format!("Hash generation failed: {}", e)))?;

    Ok(password_hash.to_string())
}

/// Verifies a password against a stored PHC hash
///
/// Parameters are read from the hash itself, so hashes created with older
/// parameters keep verifying.
///
/// # Returns
///
/// `Ok(true)` on match, `Ok(false)` on mismatch
///
/// # Errors
///
/// Returns an error if the stored hash cannot be parsed
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| PasswordError::InvalidHash(format!("Failed to parse hash: {}", e)))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(_) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerifyError(format!("Verification failed: {}", e))),
    }
}

/// Burns the same amount of work as a real verification
///
/// Called on login when no usable account exists for the email, so the
/// response time does not reveal whether the account exists.
pub fn verify_dummy_password(password: &str) {
    static DUMMY_HASH: OnceLock<Option<String>> = OnceLock::new();

    let hash = DUMMY_HASH.get_or_init(|| hash_password("motopay-dummy-password").ok());
    if let Some(hash) = hash {
        let _ = verify_password(password, hash);
    }
}

/// Validates password policy
///
/// Passwords must be 8 to 128 characters and contain at least one letter and
/// one digit.
///
/// # Example
///
/// ```
/// use motopay_shared::auth::password::validate_password_policy;
///
/// assert!(validate_password_policy("pw12345678").is_ok());
/// assert!(validate_password_policy("short1").is_err());
/// assert!(validate_password_policy("onlyletters").is_err());
/// ```
pub fn validate_password_policy(password: &str) -> Result<(), String> {
    let length = password.chars().count();

    if length < MIN_PASSWORD_LENGTH {
        return Err(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        ));
    }

    if length > MAX_PASSWORD_LENGTH {
        return Err(format!(
            "Password must be at most {} characters long",
            MAX_PASSWORD_LENGTH
        ));
    }

    if !password.chars().any(|c| c.is_alphabetic()) {
        return Err("Password must contain at least one letter".to_string());
    }

    if !password.chars().any(|c| c.is_numeric()) {
        return Err("Password must contain at least one digit".to_string());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password() {
        let hash = hash_password("test_password_123").expect("Hash should succeed");

        assert!(hash.starts_with("$argon2id$"));
        assert!(hash.contains("v=19"));
        assert!(hash.contains("m=65536"));
        assert!(hash.contains("t=3"));
        assert!(hash.contains("p=4"));
    }

    #[test]
    fn test_hash_password_produces_different_salts() {
        let hash1 = hash_password("same_password1").expect("Hash 1 should succeed");
        let hash2 = hash_password("same_password1").expect("Hash 2 should succeed");

        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_verify_password() {
        let hash = hash_password("pw12345678").expect("Hash should succeed");

        assert!(verify_password("pw12345678", &hash).unwrap());
        assert!(!verify_password("pw12345679", &hash).unwrap());
        assert!(!verify_password("", &hash).unwrap());
    }

    #[test]
    fn test_verify_password_invalid_hash() {
        assert!(verify_password("password", "invalid_hash").is_err());
        assert!(verify_password("password", "$argon2id$invalid").is_err());
    }

    #[test]
    fn test_verify_dummy_password_does_not_panic() {
        verify_dummy_password("anything");
        verify_dummy_password("");
    }

    #[test]
    fn test_password_policy() {
        assert!(validate_password_policy("pw12345678").is_ok());
        assert!(validate_password_policy("S3cure password").is_ok());

        let err = validate_password_policy("pw1").unwrap_err();
        assert!(err.contains("at least 8"));

        let err = validate_password_policy("12345678").unwrap_err();
        assert!(err.contains("letter"));

        let err = validate_password_policy("abcdefgh").unwrap_err();
        assert!(err.contains("digit"));

        let long = format!("a1{}", "x".repeat(MAX_PASSWORD_LENGTH));
        assert!(validate_password_policy(&long).unwrap_err().contains("at most"));
    }
}
