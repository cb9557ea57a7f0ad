/// Vehicle endpoints
///
/// Vehicles belong to a single user. Plates are stored uppercased.
///
/// # Endpoints
///
/// - `POST   /vehicles`
/// - `GET    /vehicles`
/// - `GET    /vehicles/:id`
/// - `PUT    /vehicles/:id`
/// - `DELETE /vehicles/:id` (soft delete, transactions are kept)

use super::{AppJson, AppPath, Data, Deleted};
use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, response::Response, Extension, Json};
use motopay_shared::{
    auth::middleware::AuthContext,
    models::vehicle::{Vehicle, VehicleKind},
    services::vehicles::{NewVehicle, VehicleUpdate},
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateVehicleRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1 to 100 characters"))]
    pub name: String,

    #[validate(length(max = 16, message = "Plate must be at most 16 characters"))]
    pub plate: Option<String>,

    /// Defaults to `motorcycle`
    pub kind: Option<VehicleKind>,
}

/// Omitted fields are left untouched, a blank plate clears it
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateVehicleRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1 to 100 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 16, message = "Plate must be at most 16 characters"))]
    pub plate: Option<String>,

    pub kind: Option<VehicleKind>,
}

pub async fn create_vehicle(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppJson(req): AppJson<CreateVehicleRequest>,
) -> ApiResult<Response> {
    req.validate()?;

    let vehicle = state
        .vehicles
        .create(
            auth.user_id,
            NewVehicle {
                name: req.name,
                plate: req.plate,
                kind: req.kind,
            },
        )
        .await?;

    Ok(Data::created(vehicle))
}

pub async fn list_vehicles(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Data<Vec<Vehicle>>>> {
    let vehicles = state.vehicles.list(auth.user_id).await?;

    Ok(Data::ok(vehicles))
}

/// # Errors
///
/// - `404 Not Found`: Missing or deleted vehicle
/// - `403 Forbidden`: Vehicle belongs to another user
pub async fn get_vehicle(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(vehicle_id): AppPath<Uuid>,
) -> ApiResult<Json<Data<Vehicle>>> {
    let vehicle = state.vehicles.get(auth.user_id, vehicle_id).await?;

    Ok(Data::ok(vehicle))
}

pub async fn update_vehicle(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(vehicle_id): AppPath<Uuid>,
    AppJson(req): AppJson<UpdateVehicleRequest>,
) -> ApiResult<Json<Data<Vehicle>>> {
    req.validate()?;

    let vehicle = state
        .vehicles
        .update(
            auth.user_id,
            vehicle_id,
            VehicleUpdate {
                name: req.name,
                plate: req.plate,
                kind: req.kind,
            },
        )
        .await?;

    Ok(Data::ok(vehicle))
}

pub async fn delete_vehicle(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(vehicle_id): AppPath<Uuid>,
) -> ApiResult<Json<Data<Deleted>>> {
    state.vehicles.delete(auth.user_id, vehicle_id).await?;

    Ok(Deleted::response())
}
