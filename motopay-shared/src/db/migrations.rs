//! Embedded schema migrations
//!
//! Files under `migrations/` are compiled into the binary. Each migration has
//! a `{version}_{name}.up.sql` and a matching `.down.sql`.

use sqlx::migrate::{MigrateError, Migrator};
use sqlx::postgres::PgPool;
use tracing::{error, info};

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Applies every pending migration
pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrateError> {
    info!(available = MIGRATOR.iter().count(), "Running database migrations");

    MIGRATOR.run(pool).await.map_err(|e| {
        error!(error = %e, "Migration failed");
        e
    })?;

    info!("Database schema is up to date");
    Ok(())
}

/// Versions of the embedded migrations, oldest first
pub fn embedded_versions() -> Vec<i64> {
    MIGRATOR.iter().map(|m| m.version).collect()
}

/// Number of migrations successfully applied to the database
pub async fn applied_count(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM _sqlx_migrations WHERE success = TRUE",
    )
    .fetch_one(pool)
    .await
}
