/// Earnings reports
///
/// All reports take `?company_id=&start_date=&end_date=` (dates inclusive).
/// A company the caller cannot use falls back to their oldest membership; a
/// caller without companies gets an empty report with `company_id: null`.
///
/// # Endpoints
///
/// - `GET /reports/summary` - Income, expense, net and count
/// - `GET /reports/daily` - Per-day totals, oldest first
/// - `GET /reports/categories` - Totals per kind and category
/// - `GET /reports/vehicles` - Totals per vehicle, including deleted ones

use super::{AppQuery, Data};
use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Extension, Json};
use chrono::NaiveDate;
use motopay_shared::{
    auth::middleware::AuthContext,
    services::reports::{CategoryReport, DailyReport, ReportQuery, Summary, VehicleReport},
};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize)]
pub struct ReportParams {
    pub company_id: Option<Uuid>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl From<ReportParams> for ReportQuery {
    fn from(params: ReportParams) -> Self {
        ReportQuery {
            company_id: params.company_id,
            start_date: params.start_date,
            end_date: params.end_date,
        }
    }
}

pub async fn summary(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppQuery(params): AppQuery<ReportParams>,
) -> ApiResult<Json<Data<Summary>>> {
    let report = state.reports.summary(auth.user_id, params.into()).await?;

    Ok(Data::ok(report))
}

pub async fn daily(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppQuery(params): AppQuery<ReportParams>,
) -> ApiResult<Json<Data<DailyReport>>> {
    let report = state.reports.daily(auth.user_id, params.into()).await?;

    Ok(Data::ok(report))
}

pub async fn categories(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppQuery(params): AppQuery<ReportParams>,
) -> ApiResult<Json<Data<CategoryReport>>> {
    let report = state.reports.categories(auth.user_id, params.into()).await?;

    Ok(Data::ok(report))
}

pub async fn vehicles(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppQuery(params): AppQuery<ReportParams>,
) -> ApiResult<Json<Data<VehicleReport>>> {
    let report = state.reports.vehicles(auth.user_id, params.into()).await?;

    Ok(Data::ok(report))
}
