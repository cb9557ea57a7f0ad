//! # MotoPay Client
//!
//! Async REST client for the MotoPay API, used by the mobile app's sync layer
//! and by tooling.
//!
//! The client keeps the session (access and refresh token) in memory, sends
//! `Authorization: Bearer` on authenticated calls and transparently refreshes
//! the access token once when the server answers 401. Concurrent 401s share a
//! single refresh request.
//!
//! # Example
//!
//! ```no_run
//! use motopay_client::{MotoPayClient, types::CompanyInput};
//!
//! # async fn example() -> Result<(), motopay_client::ClientError> {
//! let client = MotoPayClient::new("http://localhost:8080")?;
//! client.login("driver@example.com", "pw12345678").await?;
//!
//! let company = client
//!     .create_company(&CompanyInput::named("iFood"))
//!     .await?;
//! println!("Created {}", company.id);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod session;
pub mod types;

pub use client::MotoPayClient;
pub use error::{ClientError, ClientResult};
pub use session::Tokens;
