//! Refresh token generation and digests
//!
//! Refresh tokens are opaque bearer credentials: `mpr_` followed by 32 random
//! bytes in hex. Only a SHA-256 digest of the token is persisted. Because the
//! token itself carries 256 bits of entropy, an unsalted digest is safe to
//! store and doubles as an indexed lookup key.
//!
//! # Example
//!
//! ```
//! use motopay_shared::auth::refresh_token::{generate_refresh_token, hash_refresh_token};
//!
//! let (token, hash) = generate_refresh_token();
//! assert!(token.starts_with("mpr_"));
//! assert_eq!(hash, hash_refresh_token(&token));
//! ```

use rand::RngCore;
use sha2::{Digest, Sha256};

/// Refresh token prefix
const TOKEN_PREFIX: &str = "mpr_";

/// Number of random bytes in a refresh token
const TOKEN_RANDOM_BYTES: usize = 32;

/// Total length of a refresh token (prefix + hex random part)
pub const REFRESH_TOKEN_LENGTH: usize = TOKEN_PREFIX.len() + TOKEN_RANDOM_BYTES * 2;

/// Default refresh token lifetime
pub const DEFAULT_REFRESH_TOKEN_TTL_DAYS: i64 = 30;

/// Generates a new refresh token
///
/// # Returns
///
/// Tuple of (plaintext_token, sha256_hash). The plaintext is handed to the
/// client once and never stored.
pub fn generate_refresh_token() -> (String, String) {
    let mut bytes = [0u8; TOKEN_RANDOM_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);

    let token = format!("{}{}", TOKEN_PREFIX, hex::encode(bytes));
    let hash = hash_refresh_token(&token);

    (token, hash)
}

/// Hashes a refresh token using SHA-256
///
/// Deterministic: the same token always yields the same hex digest.
pub fn hash_refresh_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Checks the shape of a presented refresh token
///
/// Cheap pre-check before touching storage; a malformed token can never match.
pub fn validate_refresh_token_format(token: &str) -> bool {
    token.len() == REFRESH_TOKEN_LENGTH
        && token.starts_with(TOKEN_PREFIX)
        && token[TOKEN_PREFIX.len()..]
            .chars()
            .all(|c| c.is_ascii_hexdigit())
}
