//! API route handlers
//!
//! Handlers are organized by resource:
//!
//! - `health`: Health check endpoint
//! - `auth`: Signup, login, refresh, logout and the current user
//! - `users`: Profile, password change and account deactivation
//! - `companies`, `vehicles`, `transactions`: Owned resources
//! - `reports`: Aggregated earnings
//!
//! Every successful response is wrapped as `{ "data": ... }`. Request bodies,
//! query strings and path parameters go through the `AppJson`, `AppQuery` and
//! `AppPath` extractors so that malformed input produces the usual JSON
//! error body instead of a plain-text rejection.

use axum::{
    extract::{FromRequest, FromRequestParts},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

pub mod auth;
pub mod companies;
pub mod health;
pub mod reports;
pub mod transactions;
pub mod users;
pub mod vehicles;

/// Success envelope
#[derive(Debug, Serialize, Deserialize)]
pub struct Data<T> {
    pub data: T,
}

impl<T: Serialize> Data<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self { data })
    }

    /// `201 Created` with the envelope
    pub fn created(data: T) -> Response {
        (StatusCode::CREATED, Json(Self { data })).into_response()
    }
}

/// Acknowledgement returned by deletes
#[derive(Debug, Serialize, Deserialize)]
pub struct Deleted {
    pub deleted: bool,
}

impl Deleted {
    pub fn response() -> Json<Data<Self>> {
        Data::ok(Self { deleted: true })
    }
}

/// JSON body extractor with `ApiError` rejections
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct AppJson<T>(pub T);

/// Query string extractor with `ApiError` rejections
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct AppQuery<T>(pub T);

/// Path extractor with `ApiError` rejections
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct AppPath<T>(pub T);
