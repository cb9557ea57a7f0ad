//! # MotoPay Shared Library
//!
//! Domain types, persistence and business logic shared by the MotoPay API
//! server and client.
//!
//! ## Module Organization
//!
//! - `auth`: Password hashing, access tokens, refresh token digests
//! - `db`: PostgreSQL pool and embedded migrations
//! - `models`: Database models and their SQL operations
//! - `store`: Storage ports plus PostgreSQL and in-memory adapters
//! - `services`: Session lifecycle, resource ownership and reports

pub mod auth;
pub mod db;
pub mod models;
pub mod services;
pub mod store;

/// Current version of the MotoPay shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
