//! # MotoPay API Server
//!
//! REST backend for delivery drivers tracking earnings and expenses per
//! company and vehicle.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgres://localhost/motopay JWT_SECRET=$(openssl rand -hex 32) \
//!     cargo run -p motopay-api
//! ```

use motopay_api::{
    app::{build_router, AppState},
    config::{Config, LogFormat},
};
use motopay_shared::{
    db::{
        migrations::run_migrations,
        pool::{close_pool, create_pool, DatabaseConfig as PoolConfig},
    },
    store::Stores,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str = "motopay_api=debug,motopay_shared=info,tower_http=debug";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    init_tracing(config.log_format);

    tracing::info!(
        "MotoPay API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let pool = create_pool(PoolConfig {
        max_connections: config.database.max_connections,
        ..PoolConfig::new(config.database.url.clone())
    })
    .await?;

    if config.database.run_migrations {
        run_migrations(&pool).await?;
        tracing::info!("Database migrations applied");
    }

    let bind_address = config.bind_address();
    let state = AppState::new(Stores::postgres(pool.clone()), config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    close_pool(&pool).await;
    tracing::info!("Server stopped");

    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, draining connections...");
}
