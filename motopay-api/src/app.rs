/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use motopay_api::{app::{build_router, AppState}, config::Config};
/// use motopay_shared::{db::pool::{create_pool, DatabaseConfig}, store::Stores};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = create_pool(DatabaseConfig::new(config.database.url.clone())).await?;
/// let state = AppState::new(Stores::postgres(pool), config);
/// let app = build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError, middleware::security::SecurityHeadersLayer};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, post},
    Router,
};
use motopay_shared::{
    auth::middleware::authenticate_headers,
    services::{AuthService, CompanyService, ReportService, TransactionService, VehicleService},
    store::Stores,
};
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor. Services
/// hold `Arc`ed storage ports, so cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub companies: CompanyService,
    pub vehicles: VehicleService,
    pub transactions: TransactionService,
    pub reports: ReportService,

    /// Storage ports, kept for health checks
    pub stores: Stores,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Wires every service to the given stores
    pub fn new(stores: Stores, config: Config) -> Self {
        let auth = AuthService::new(
            stores.users.clone(),
            stores.refresh_tokens.clone(),
            config.auth_settings(),
        );
        let companies = CompanyService::new(stores.companies.clone());
        let vehicles = VehicleService::new(stores.vehicles.clone());
        let transactions = TransactionService::new(
            stores.transactions.clone(),
            stores.companies.clone(),
            stores.vehicles.clone(),
        );
        let reports = ReportService::new(
            stores.transactions.clone(),
            stores.companies.clone(),
            stores.vehicles.clone(),
        );

        Self {
            auth,
            companies,
            vehicles,
            transactions,
            reports,
            stores,
            config: Arc::new(config),
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET /health                        # public
/// ├── /auth/
/// │   ├── POST /signup, /login, /refresh, /logout   # public
/// │   └── GET  /me                       # authenticated
/// ├── /users/me                          # PATCH, DELETE; POST /password
/// ├── /companies                         # POST, GET; GET|PUT|DELETE /:id
/// ├── /vehicles                          # POST, GET; GET|PUT|DELETE /:id
/// ├── /transactions                      # POST, GET; GET|PUT|DELETE /:id
/// └── /reports/                          # GET summary|daily|categories|vehicles
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Security headers
/// 2. CORS (tower-http CorsLayer)
/// 3. Logging (tower-http TraceLayer)
/// 4. Authentication (authenticated routes only)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let public_routes = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/auth/signup", post(routes::auth::signup))
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/refresh", post(routes::auth::refresh))
        .route("/auth/logout", post(routes::auth::logout));

    let protected_routes = Router::new()
        .route("/auth/me", get(routes::auth::me))
        .route(
            "/users/me",
            axum::routing::patch(routes::users::update_profile).delete(routes::users::deactivate),
        )
        .route("/users/me/password", post(routes::users::change_password))
        .route(
            "/companies",
            post(routes::companies::create_company).get(routes::companies::list_companies),
        )
        .route(
            "/companies/:id",
            get(routes::companies::get_company)
                .put(routes::companies::update_company)
                .delete(routes::companies::delete_company),
        )
        .route(
            "/vehicles",
            post(routes::vehicles::create_vehicle).get(routes::vehicles::list_vehicles),
        )
        .route(
            "/vehicles/:id",
            get(routes::vehicles::get_vehicle)
                .put(routes::vehicles::update_vehicle)
                .delete(routes::vehicles::delete_vehicle),
        )
        .route(
            "/transactions",
            post(routes::transactions::create_transaction)
                .get(routes::transactions::list_transactions),
        )
        .route(
            "/transactions/:id",
            get(routes::transactions::get_transaction)
                .put(routes::transactions::update_transaction)
                .delete(routes::transactions::delete_transaction),
        )
        .route("/reports/summary", get(routes::reports::summary))
        .route("/reports/daily", get(routes::reports::daily))
        .route("/reports/categories", get(routes::reports::categories))
        .route("/reports/vehicles", get(routes::reports::vehicles))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let cors = if state.config.allows_any_origin() {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    let production = state.config.api.production;

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(production))
        .with_state(state)
}

/// Access token authentication middleware
///
/// Validates the bearer token, checks that the account may still
/// authenticate, then inserts an `AuthContext` into request extensions.
pub async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let context = authenticate_headers(req.headers(), &state.auth.settings().jwt_secret)?;

    state.auth.authenticate(context.user_id).await?;

    req.extensions_mut().insert(context);

    Ok(next.run(req).await)
}
