//! Database models for MotoPay
//!
//! Each model owns its SQL. Queries are checked at runtime (`query_as`), so
//! building the crate never needs a live database.
//!
//! # Models
//!
//! - `user`: Driver accounts
//! - `refresh_token`: Hashed refresh tokens
//! - `company`: Delivery companies and their memberships
//! - `vehicle`: Vehicles owned by a driver
//! - `transaction`: Income and expense records
//!
//! # Example
//!
//! ```no_run
//! use motopay_shared::models::vehicle::{CreateVehicle, Vehicle, VehicleKind};
//! use motopay_shared::db::pool::{create_pool, DatabaseConfig};
//! use uuid::Uuid;
//!
//! # async fn example(user_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
//! let pool = create_pool(DatabaseConfig::default()).await?;
//!
//! let vehicle = Vehicle::create(&pool, CreateVehicle {
//!     user_id,
//!     name: "CG 160".to_string(),
//!     plate: Some("ABC1D23".to_string()),
//!     kind: VehicleKind::Motorcycle,
//! }).await?;
//! # Ok(())
//! # }
//! ```

pub mod company;
pub mod refresh_token;
pub mod transaction;
pub mod user;
pub mod vehicle;
