//! Request and response types
//!
//! Response payloads reuse the shared domain types; request bodies are
//! client-side structs that serialize to the JSON the API expects.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use motopay_shared::models::{
    company::Company,
    transaction::{Transaction, TransactionKind},
    user::UserProfile,
    vehicle::{Vehicle, VehicleKind},
};
pub use motopay_shared::services::auth::{RefreshedAccess, Session, TokenPair};
pub use motopay_shared::services::reports::{
    CategoryReport, CategoryTotal, DailyReport, DailyTotal, Summary, VehicleReport, VehicleTotal,
};

/// `{ "data": ... }` success envelope
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub data: T,
}

/// Error body returned by the API
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: String,
    pub message: String,
    #[serde(default)]
    pub details: Vec<FieldError>,
}

/// One failed field of a validation error
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct Credentials<'a> {
    pub email: &'a str,
    pub password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RefreshTokenBody<'a> {
    pub refresh_token: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct PasswordChange<'a> {
    pub current_password: &'a str,
    pub new_password: &'a str,
}

/// Profile changes; `None` leaves a field untouched
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// An empty string clears the phone
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Company creation body
#[derive(Debug, Clone, Serialize)]
pub struct CompanyInput {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CompanyInput {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }
}

/// Company changes; `None` leaves a field untouched
#[derive(Debug, Clone, Default, Serialize)]
pub struct CompanyChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Vehicle creation body
#[derive(Debug, Clone, Serialize)]
pub struct VehicleInput {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<VehicleKind>,
}

impl VehicleInput {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            plate: None,
            kind: None,
        }
    }
}

/// Vehicle changes; `None` leaves a field untouched
#[derive(Debug, Clone, Default, Serialize)]
pub struct VehicleChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<VehicleKind>,
}

/// Transaction creation body
#[derive(Debug, Clone, Serialize)]
pub struct TransactionInput {
    pub company_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_id: Option<Uuid>,
    pub kind: TransactionKind,
    pub category: String,
    pub amount_cents: i64,
    pub occurred_on: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Transaction changes; `None` leaves a field untouched
///
/// `vehicle_id: Some(None)` detaches the vehicle.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TransactionChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_id: Option<Option<Uuid>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<TransactionKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_cents: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occurred_on: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Query of `GET /transactions`
#[derive(Debug, Clone, Default, Serialize)]
pub struct TransactionFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<TransactionKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
}

/// Query of the report endpoints
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReportFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
}

/// Acknowledgement bodies
#[derive(Debug, Deserialize)]
pub(crate) struct Ack {}
