/// Configuration management for the API server
///
/// This module loads configuration from environment variables and provides
/// a type-safe configuration struct.
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8080)
/// - `CORS_ORIGINS`: Comma separated allowed origins (default: `*`)
/// - `PRODUCTION`: Enables HSTS (default: false)
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `RUN_MIGRATIONS`: Apply embedded migrations at startup (default: true)
/// - `JWT_SECRET`: Secret key for access token signing (required, >= 32 chars)
/// - `ACCESS_TOKEN_TTL_MINUTES`: 1 to 1440 (default: 15)
/// - `REFRESH_TOKEN_TTL_DAYS`: 1 to 90 (default: 30)
/// - `ROTATE_REFRESH_TOKENS`: Issue a new refresh token on every refresh (default: false)
/// - `LOG_FORMAT`: `pretty` or `json` (default: pretty)
///
/// # Example
///
/// ```no_run
/// use motopay_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use std::env;

use motopay_shared::auth::jwt::DEFAULT_ACCESS_TOKEN_TTL_MINUTES;
use motopay_shared::auth::refresh_token::DEFAULT_REFRESH_TOKEN_TTL_DAYS;
use motopay_shared::services::AuthSettings;
use serde::{Deserialize, Serialize};

/// Minimum accepted length of `JWT_SECRET`
pub const MIN_JWT_SECRET_LENGTH: usize = 32;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Token configuration
    pub auth: AuthConfig,

    /// Log output format
    pub log_format: LogFormat,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins, `*` means any
    pub cors_origins: Vec<String>,

    /// Production mode (HSTS on)
    pub production: bool,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,

    /// Apply embedded migrations before serving
    pub run_migrations: bool,
}

/// Access and refresh token configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Secret key for access token signing
    ///
    /// Generate with: `openssl rand -hex 32`
    pub jwt_secret: String,

    pub access_token_ttl_minutes: i64,

    pub refresh_token_ttl_days: i64,

    pub rotate_refresh_tokens: bool,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// Reads `.env` first when present (development).
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing
    /// - Environment variables have invalid values
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let api_host = var("API_HOST", "0.0.0.0");
        let api_port = var("API_PORT", "8080")
            .parse::<u16>()
            .map_err(|e| anyhow::anyhow!("API_PORT is invalid: {}", e))?;

        let cors_origins: Vec<String> = var("CORS_ORIGINS", "*")
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(String::from)
            .collect();

        let production = parse_bool("PRODUCTION", &var("PRODUCTION", "false"))?;

        let database_url = lookup("DATABASE_URL")
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let max_connections = var("DATABASE_MAX_CONNECTIONS", "10")
            .parse::<u32>()
            .map_err(|e| anyhow::anyhow!("DATABASE_MAX_CONNECTIONS is invalid: {}", e))?;

        let run_migrations = parse_bool("RUN_MIGRATIONS", &var("RUN_MIGRATIONS", "true"))?;

        let jwt_secret = lookup("JWT_SECRET")
            .ok_or_else(|| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if jwt_secret.len() < MIN_JWT_SECRET_LENGTH {
            anyhow::bail!(
                "JWT_SECRET must be at least {} characters long",
                MIN_JWT_SECRET_LENGTH
            );
        }

        let access_token_ttl_minutes = parse_ranged(
            "ACCESS_TOKEN_TTL_MINUTES",
            &var(
                "ACCESS_TOKEN_TTL_MINUTES",
                &DEFAULT_ACCESS_TOKEN_TTL_MINUTES.to_string(),
            ),
            1..=1440,
        )?;

        let refresh_token_ttl_days = parse_ranged(
            "REFRESH_TOKEN_TTL_DAYS",
            &var(
                "REFRESH_TOKEN_TTL_DAYS",
                &DEFAULT_REFRESH_TOKEN_TTL_DAYS.to_string(),
            ),
            1..=90,
        )?;

        let rotate_refresh_tokens =
            parse_bool("ROTATE_REFRESH_TOKENS", &var("ROTATE_REFRESH_TOKENS", "false"))?;

        let log_format = match var("LOG_FORMAT", "pretty").to_ascii_lowercase().as_str() {
            "pretty" => LogFormat::Pretty,
            "json" => LogFormat::Json,
            other => anyhow::bail!("LOG_FORMAT must be 'pretty' or 'json', got '{}'", other),
        };

        Ok(Self {
            api: ApiConfig {
                host: api_host,
                port: api_port,
                cors_origins,
                production,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
                run_migrations,
            },
            auth: AuthConfig {
                jwt_secret,
                access_token_ttl_minutes,
                refresh_token_ttl_days,
                rotate_refresh_tokens,
            },
            log_format,
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// Token settings for the auth service
    pub fn auth_settings(&self) -> AuthSettings {
        AuthSettings {
            jwt_secret: self.auth.jwt_secret.clone(),
            access_token_ttl: chrono::Duration::minutes(self.auth.access_token_ttl_minutes),
            refresh_token_ttl: chrono::Duration::days(self.auth.refresh_token_ttl_days),
            rotate_refresh_tokens: self.auth.rotate_refresh_tokens,
        }
    }

    pub fn allows_any_origin(&self) -> bool {
        self.api.cors_origins.iter().any(|origin| origin == "*")
    }
}

fn parse_bool(key: &str, value: &str) -> anyhow::Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => anyhow::bail!("{} must be a boolean, got '{}'", key, value),
    }
}

fn parse_ranged(
    key: &str,
    value: &str,
    range: std::ops::RangeInclusive<i64>,
) -> anyhow::Result<i64> {
    let parsed = value
        .trim()
        .parse::<i64>()
        .map_err(|e| anyhow::anyhow!("{} is invalid: {}", key, e))?;

    if !range.contains(&parsed) {
        anyhow::bail!(
            "{} must be between {} and {}, got {}",
            key,
            range.start(),
            range.end(),
            parsed
        );
    }

    Ok(parsed)
}
