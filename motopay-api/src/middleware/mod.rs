//! Middleware for the API server
//!
//! Authentication lives in `app::jwt_auth_layer` because it needs the
//! application state; this module holds the state-free layers.

pub mod security;
