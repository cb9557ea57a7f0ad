//! Authentication and authorization utilities
//!
//! # Modules
//!
//! - [`password`]: Argon2id password hashing and policy
//! - [`jwt`]: Access token generation and validation
//! - [`refresh_token`]: Opaque refresh token generation and digests
//! - [`middleware`]: Bearer header parsing and [`middleware::AuthContext`]
//! - [`authorization`]: Record ownership checks
//!
//! # Example
//!
//! ```no_run
//! use motopay_shared::auth::password::{hash_password, verify_password};
//! use motopay_shared::auth::jwt::{create_token, validate_access_token, Claims};
//! use uuid::Uuid;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let hash = hash_password("pw12345678")?;
//! assert!(verify_password("pw12345678", &hash)?);
//!
//! let secret = "a-secret-that-is-at-least-32-chars!!";
//! let claims = Claims::new(Uuid::new_v4(), "a@x.com".to_string());
//! let token = create_token(&claims, secret)?;
//! let decoded = validate_access_token(&token, secret)?;
//! assert_eq!(decoded.sub, claims.sub);
//! # Ok(())
//! # }
//! ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod refresh_token;
