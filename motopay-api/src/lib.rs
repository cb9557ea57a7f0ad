//! # MotoPay API Server Library
//!
//! HTTP surface of MotoPay: configuration, the axum router, error mapping and
//! route handlers. The binary in `main.rs` wires it to PostgreSQL; tests and
//! local tools can build the same router over in-memory stores.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration from environment variables
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Security headers
//! - `routes`: Route handlers, one module per resource

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
