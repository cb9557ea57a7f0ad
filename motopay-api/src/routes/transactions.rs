/// Transaction endpoints
///
/// # Endpoints
///
/// - `POST   /transactions`
/// - `GET    /transactions?company_id=&vehicle_id=&kind=&start_date=&end_date=&limit=&offset=`
/// - `GET    /transactions/:id`
/// - `PUT    /transactions/:id`
/// - `DELETE /transactions/:id` (soft delete)
///
/// Lists are newest first. Amounts are integer cents.

use super::{AppJson, AppPath, AppQuery, Data, Deleted};
use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, response::Response, Extension, Json};
use chrono::NaiveDate;
use motopay_shared::{
    auth::middleware::AuthContext,
    models::transaction::{Transaction, TransactionKind},
    services::transactions::{NewTransaction, TransactionQuery, TransactionUpdate},
};
use serde::{Deserialize, Deserializer};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTransactionRequest {
    pub company_id: Uuid,

    pub vehicle_id: Option<Uuid>,

    pub kind: TransactionKind,

    #[validate(length(min = 1, max = 50, message = "Category must be 1 to 50 characters"))]
    pub category: String,

    #[validate(range(min = 1i64, max = 100_000_000_000i64, message = "Amount must be between 1 and 100000000000 cents"))]
    pub amount_cents: i64,

    /// `YYYY-MM-DD`
    pub occurred_on: NaiveDate,

    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,
}

/// Omitted fields are left untouched
///
/// `"vehicle_id": null` detaches the vehicle; a blank description clears it.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTransactionRequest {
    pub company_id: Option<Uuid>,

    #[serde(default, deserialize_with = "present")]
    pub vehicle_id: Option<Option<Uuid>>,

    pub kind: Option<TransactionKind>,

    #[validate(length(min = 1, max = 50, message = "Category must be 1 to 50 characters"))]
    pub category: Option<String>,

    #[validate(range(min = 1i64, max = 100_000_000_000i64, message = "Amount must be between 1 and 100000000000 cents"))]
    pub amount_cents: Option<i64>,

    pub occurred_on: Option<NaiveDate>,

    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,
}

/// Distinguishes an explicit `null` from an absent field
fn present<'de, D>(deserializer: D) -> Result<Option<Option<Uuid>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Uuid>::deserialize(deserializer).map(Some)
}

/// List filters
#[derive(Debug, Default, Deserialize)]
pub struct ListTransactionsParams {
    pub company_id: Option<Uuid>,
    pub vehicle_id: Option<Uuid>,
    pub kind: Option<TransactionKind>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// # Errors
///
/// - `404 Not Found`: Company or vehicle is missing or deleted
/// - `403 Forbidden`: Caller is not a member of the company or does not own the vehicle
/// - `422 Unprocessable Entity`: Validation failed
pub async fn create_transaction(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppJson(req): AppJson<CreateTransactionRequest>,
) -> ApiResult<Response> {
    req.validate()?;

    let transaction = state
        .transactions
        .create(
            auth.user_id,
            NewTransaction {
                company_id: req.company_id,
                vehicle_id: req.vehicle_id,
                kind: req.kind,
                category: req.category,
                amount_cents: req.amount_cents,
                occurred_on: req.occurred_on,
                description: req.description,
            },
        )
        .await?;

    Ok(Data::created(transaction))
}

/// # Errors
///
/// - `422 Unprocessable Entity`: `start_date` after `end_date`, or limit/offset out of range
pub async fn list_transactions(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppQuery(params): AppQuery<ListTransactionsParams>,
) -> ApiResult<Json<Data<Vec<Transaction>>>> {
    let transactions = state
        .transactions
        .list(
            auth.user_id,
            TransactionQuery {
                company_id: params.company_id,
                vehicle_id: params.vehicle_id,
                kind: params.kind,
                start_date: params.start_date,
                end_date: params.end_date,
                limit: params.limit,
                offset: params.offset,
            },
        )
        .await?;

    Ok(Data::ok(transactions))
}

pub async fn get_transaction(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(transaction_id): AppPath<Uuid>,
) -> ApiResult<Json<Data<Transaction>>> {
    let transaction = state.transactions.get(auth.user_id, transaction_id).await?;

    Ok(Data::ok(transaction))
}

pub async fn update_transaction(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(transaction_id): AppPath<Uuid>,
    AppJson(req): AppJson<UpdateTransactionRequest>,
) -> ApiResult<Json<Data<Transaction>>> {
    req.validate()?;

    let transaction = state
        .transactions
        .update(
            auth.user_id,
            transaction_id,
            TransactionUpdate {
                company_id: req.company_id,
                vehicle_id: req.vehicle_id,
                kind: req.kind,
                category: req.category,
                amount_cents: req.amount_cents,
                occurred_on: req.occurred_on,
                description: req.description,
            },
        )
        .await?;

    Ok(Data::ok(transaction))
}

pub async fn delete_transaction(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(transaction_id): AppPath<Uuid>,
) -> ApiResult<Json<Data<Deleted>>> {
    state.transactions.delete(auth.user_id, transaction_id).await?;

    Ok(Deleted::response())
}
