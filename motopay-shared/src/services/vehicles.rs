//! Vehicle service

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use super::{optional_text, required_text, ServiceResult, MAX_NAME_LENGTH};
use crate::auth::authorization::{require_live, require_owned};
use crate::models::vehicle::{CreateVehicle, Vehicle, VehicleKind};
use crate::store::VehicleStore;

/// Maximum length of a license plate
const MAX_PLATE_LENGTH: usize = 16;

/// Vehicle creation input
#[derive(Debug, Clone)]
pub struct NewVehicle {
    pub name: String,
    pub plate: Option<String>,
    /// Defaults to motorcycle
    pub kind: Option<VehicleKind>,
}

/// Vehicle changes; `None` leaves a field untouched, a blank plate clears it
#[derive(Debug, Clone, Default)]
pub struct VehicleUpdate {
    pub name: Option<String>,
    pub plate: Option<String>,
    pub kind: Option<VehicleKind>,
}

fn normalize_plate(plate: Option<&str>) -> ServiceResult<Option<String>> {
    Ok(optional_text("plate", plate, MAX_PLATE_LENGTH)?.map(|p| p.to_uppercase()))
}

#[derive(Clone)]
pub struct VehicleService {
    vehicles: Arc<dyn VehicleStore>,
}

impl VehicleService {
    pub fn new(vehicles: Arc<dyn VehicleStore>) -> Self {
        Self { vehicles }
    }

    pub async fn create(&self, user_id: Uuid, input: NewVehicle) -> ServiceResult<Vehicle> {
        let vehicle = self
            .vehicles
            .create(CreateVehicle {
                user_id,
                name: required_text("name", &input.name, MAX_NAME_LENGTH)?,
                plate: normalize_plate(input.plate.as_deref())?,
                kind: input.kind.unwrap_or_default(),
            })
            .await?;

        info!(user_id = %user_id, vehicle_id = %vehicle.id, "Vehicle created");
        Ok(vehicle)
    }

    pub async fn list(&self, user_id: Uuid) -> ServiceResult<Vec<Vehicle>> {
        Ok(self.vehicles.list_by_user(user_id, false).await?)
    }

    /// # Errors
    ///
    /// - `NotFound` if the vehicle is missing or deleted
    /// - `Forbidden` if another user owns it
    pub async fn get(&self, user_id: Uuid, vehicle_id: Uuid) -> ServiceResult<Vehicle> {
        let vehicle = self.vehicles.find_by_id(vehicle_id).await?;
        Ok(require_owned(vehicle, user_id)?)
    }

    pub async fn update(
        &self,
        user_id: Uuid,
        vehicle_id: Uuid,
        update: VehicleUpdate,
    ) -> ServiceResult<Vehicle> {
        let mut vehicle = self.get(user_id, vehicle_id).await?;

        if let Some(name) = update.name.as_deref() {
            vehicle.name = required_text("name", name, MAX_NAME_LENGTH)?;
        }
        if let Some(plate) = update.plate.as_deref() {
            vehicle.plate = normalize_plate(Some(plate))?;
        }
        if let Some(kind) = update.kind {
            vehicle.kind = kind;
        }

        let saved = self.vehicles.save(&vehicle).await?;
        Ok(require_live(saved)?)
    }

    /// Soft-deletes the vehicle; its transactions are kept
    pub async fn delete(&self, user_id: Uuid, vehicle_id: Uuid) -> ServiceResult<()> {
        let vehicle = self.get(user_id, vehicle_id).await?;

        if self.vehicles.soft_delete(vehicle.id).await? {
            info!(user_id = %user_id, vehicle_id = %vehicle.id, "Vehicle deleted");
        }

        Ok(())
    }
}
