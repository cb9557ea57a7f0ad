//! Vehicle model and database operations
//!
//! # Schema
//!
//! ```sql
//! CREATE TYPE vehicle_kind AS ENUM ('motorcycle', 'car', 'bicycle', 'other');
//!
//! CREATE TABLE vehicles (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     user_id UUID NOT NULL REFERENCES users(id),
//!     name VARCHAR(100) NOT NULL,
//!     plate VARCHAR(16),
//!     kind vehicle_kind NOT NULL DEFAULT 'motorcycle',
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     deleted_at TIMESTAMPTZ
//! );
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

const VEHICLE_COLUMNS: &str = "id, user_id, name, plate, kind, created_at, updated_at, deleted_at";

/// Kind of vehicle used for deliveries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "vehicle_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum VehicleKind {
    Motorcycle,
    Car,
    Bicycle,
    Other,
}

impl Default for VehicleKind {
    fn default() -> Self {
        VehicleKind::Motorcycle
    }
}

/// Vehicle owned by a single user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Vehicle {
    pub id: Uuid,

    /// Owner
    pub user_id: Uuid,

    /// Display name (e.g. "CG 160")
    pub name: String,

    /// License plate, stored uppercased
    pub plate: Option<String>,

    pub kind: VehicleKind,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Input for creating a vehicle
#[derive(Debug, Clone)]
pub struct CreateVehicle {
    pub user_id: Uuid,
    pub name: String,
    pub plate: Option<String>,
    pub kind: VehicleKind,
}

impl Vehicle {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub async fn create(pool: &PgPool, data: CreateVehicle) -> Result<Self, sqlx::Error> {
        let vehicle = sqlx::query_as::<_, Vehicle>(&format!(
            "INSERT INTO vehicles (user_id, name, plate, kind) VALUES ($1, $2, $3, $4) RETURNING {}",
            VEHICLE_COLUMNS
        ))
        .bind(data.user_id)
        .bind(data.name)
        .bind(data.plate)
        .bind(data.kind)
        .fetch_one(pool)
        .await?;

        Ok(vehicle)
    }

    /// Finds a vehicle by ID, including soft-deleted vehicles
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let vehicle = sqlx::query_as::<_, Vehicle>(&format!(
            "SELECT {} FROM vehicles WHERE id = $1",
            VEHICLE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(vehicle)
    }

    /// Lists a user's vehicles by name
    ///
    /// Soft-deleted vehicles are only returned when `include_deleted` is set
    /// (reports still need their names).
    pub async fn list_by_user(
        pool: &PgPool,
        user_id: Uuid,
        include_deleted: bool,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let vehicles = sqlx::query_as::<_, Vehicle>(&format!(
            r#"
            SELECT {}
            FROM vehicles
            WHERE user_id = $1 AND ($2 OR deleted_at IS NULL)
            ORDER BY name ASC, created_at ASC
            "#,
            VEHICLE_COLUMNS
        ))
        .bind(user_id)
        .bind(include_deleted)
        .fetch_all(pool)
        .await?;

        Ok(vehicles)
    }

    /// Persists name, plate and kind
    pub async fn save(pool: &PgPool, vehicle: &Vehicle) -> Result<Option<Self>, sqlx::Error> {
        let vehicle = sqlx::query_as::<_, Vehicle>(&format!(
            r#"
            UPDATE vehicles
            SET name = $2, plate = $3, kind = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            VEHICLE_COLUMNS
        ))
        .bind(vehicle.id)
        .bind(&vehicle.name)
        .bind(&vehicle.plate)
        .bind(vehicle.kind)
        .fetch_optional(pool)
        .await?;

        Ok(vehicle)
    }

    /// Stamps `deleted_at`; returns false if already deleted or missing
    pub async fn soft_delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE vehicles SET deleted_at = NOW(), updated_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vehicle_kind_serde() {
        assert_eq!(
            serde_plain(VehicleKind::Motorcycle),
            "\"motorcycle\"".to_string()
        );
        assert_eq!(VehicleKind::default(), VehicleKind::Motorcycle);
    }

    fn serde_plain(kind: VehicleKind) -> String {
        serde_json::to_string(&kind).unwrap()
    }
}
