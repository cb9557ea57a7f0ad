//! Database layer
//!
//! - `pool`: PostgreSQL connection pool with health checks
//! - `migrations`: Embedded schema migrations
//!
//! # Example
//!
//! ```no_run
//! use motopay_shared::db::pool::{create_pool, DatabaseConfig};
//! use motopay_shared::db::migrations::run_migrations;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = create_pool(DatabaseConfig::new(std::env::var("DATABASE_URL")?)).await?;
//!     run_migrations(&pool).await?;
//!     Ok(())
//! }
//! ```

pub mod migrations;
pub mod pool;
