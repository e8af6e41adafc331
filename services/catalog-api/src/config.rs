//! Configuration for the Catalog API service.

use std::time::Duration;

use reelgate_sessions::SessionConfig;

/// Catalog API configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub http_port: u16,
    /// Database URL
    pub database_url: String,
    /// Database pool connection cap
    pub database_max_connections: u32,
    /// Redis URL for the session store
    pub redis_url: String,
    /// HMAC secret for bearer tokens (at least 32 bytes)
    pub token_secret: String,
    /// Session registry tuning
    pub sessions: SessionConfig,
    /// Cadence of the expiry-notice scan
    pub expiry_scan_interval: Duration,
    /// Request timeout
    pub request_timeout: Duration,
    /// Metrics enabled
    pub metrics_enabled: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url =
            std::env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        let redis_url = std::env::var("REDIS_URL")
            .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());

        let token_secret =
            std::env::var("TOKEN_SECRET").map_err(|_| ConfigError::Missing("TOKEN_SECRET"))?;
        if token_secret.len() < 32 {
            return Err(ConfigError::Invalid("TOKEN_SECRET"));
        }

        let database_max_connections: u32 = std::env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("DATABASE_MAX_CONNECTIONS"))?;

        let http_port = std::env::var("HTTP_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("HTTP_PORT"))?;

        let session_ttl_secs: u64 = std::env::var("SESSION_TTL_SECS")
            .unwrap_or_else(|_| "3600".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("SESSION_TTL_SECS"))?;

        let staleness_secs: u64 = std::env::var("SESSION_STALENESS_SECS")
            .unwrap_or_else(|_| "120".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("SESSION_STALENESS_SECS"))?;

        let sweep_secs: u64 = std::env::var("SESSION_SWEEP_SECS")
            .unwrap_or_else(|_| "300".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("SESSION_SWEEP_SECS"))?;

        let expiry_scan_secs: u64 = std::env::var("EXPIRY_SCAN_SECS")
            .unwrap_or_else(|_| "3600".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("EXPIRY_SCAN_SECS"))?;

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("REQUEST_TIMEOUT_SECS"))?;

        let metrics_enabled = std::env::var("METRICS_ENABLED")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .unwrap_or(true);

        Ok(Self {
            http_port,
            database_url,
            database_max_connections,
            redis_url,
            token_secret,
            sessions: SessionConfig {
                session_ttl: Duration::from_secs(session_ttl_secs),
                staleness_window: Duration::from_secs(staleness_secs),
                sweep_interval: Duration::from_secs(sweep_secs),
            },
            expiry_scan_interval: Duration::from_secs(expiry_scan_secs),
            request_timeout: Duration::from_secs(request_timeout_secs),
            metrics_enabled,
        })
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
