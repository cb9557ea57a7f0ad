/// Company endpoints
///
/// A company is a delivery platform or employer. Creating one makes the
/// caller a member; every member may read, update and delete it.
///
/// # Endpoints
///
/// - `POST   /companies`
/// - `GET    /companies`
/// - `GET    /companies/:id`
/// - `PUT    /companies/:id`
/// - `DELETE /companies/:id` (soft delete, transactions are kept)

use super::{AppJson, AppPath, Data, Deleted};
use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, response::Response, Extension, Json};
use motopay_shared::{
    auth::middleware::AuthContext,
    models::company::Company,
    services::companies::{CompanyUpdate, NewCompany},
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCompanyRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1 to 100 characters"))]
    pub name: String,

    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,
}

/// Omitted fields are left untouched, a blank description clears it
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCompanyRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1 to 100 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,
}

pub async fn create_company(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppJson(req): AppJson<CreateCompanyRequest>,
) -> ApiResult<Response> {
    req.validate()?;

    let company = state
        .companies
        .create(
            auth.user_id,
            NewCompany {
                name: req.name,
                description: req.description,
            },
        )
        .await?;

    Ok(Data::created(company))
}

pub async fn list_companies(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Data<Vec<Company>>>> {
    let companies = state.companies.list(auth.user_id).await?;

    Ok(Data::ok(companies))
}

/// # Errors
///
/// - `404 Not Found`: Missing or deleted company
/// - `403 Forbidden`: Caller is not a member
pub async fn get_company(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(company_id): AppPath<Uuid>,
) -> ApiResult<Json<Data<Company>>> {
    let company = state.companies.get(auth.user_id, company_id).await?;

    Ok(Data::ok(company))
}

pub async fn update_company(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(company_id): AppPath<Uuid>,
    AppJson(req): AppJson<UpdateCompanyRequest>,
) -> ApiResult<Json<Data<Company>>> {
    req.validate()?;

    let company = state
        .companies
        .update(
            auth.user_id,
            company_id,
            CompanyUpdate {
                name: req.name,
                description: req.description,
            },
        )
        .await?;

    Ok(Data::ok(company))
}

pub async fn delete_company(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(company_id): AppPath<Uuid>,
) -> ApiResult<Json<Data<Deleted>>> {
    state.companies.delete(auth.user_id, company_id).await?;

    Ok(Deleted::response())
}
