/// Health check endpoint
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
///
/// # Response
///
/// ```json
/// {
///   "data": {
///     "status": "healthy",
///     "version": "0.1.0",
///     "storage": "postgres",
///     "database": "connected"
///   }
/// }
/// ```
///
/// The endpoint always answers 200; a broken database shows up as
/// `"status": "degraded"`.

use super::Data;
use crate::app::AppState;
use axum::{extract::State, Json};
use motopay_shared::db::pool::{pool_stats, PoolStats};
use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `healthy` or `degraded`
    pub status: String,

    /// Application version
    pub version: String,

    /// `postgres` or `memory`
    pub storage: String,

    /// `connected` or `disconnected`
    pub database: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool: Option<PoolHealth>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PoolHealth {
    pub active_connections: u32,
    pub idle_connections: u32,
}

impl From<PoolStats> for PoolHealth {
    fn from(stats: PoolStats) -> Self {
        Self {
            active_connections: stats.active_connections,
            idle_connections: stats.idle_connections,
        }
    }
}

pub async fn health_check(State(state): State<AppState>) -> Json<Data<HealthResponse>> {
    let connected = match state.stores.ping().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Health check could not reach storage");
            false
        }
    };

    let pool = state.stores.pool().map(|pool| PoolHealth::from(pool_stats(pool)));

    Data::ok(HealthResponse {
        status: if connected { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        storage: if pool.is_some() { "postgres" } else { "memory" }.to_string(),
        database: if connected { "connected" } else { "disconnected" }.to_string(),
        pool,
    })
}
