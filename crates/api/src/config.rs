use std::time::Duration;

use tdy_notify::RetryPolicy;

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Notification load retry attempts (default: `3`).
    pub load_retry_attempts: u32,
    /// Fixed delay between load retries in milliseconds (default: `2000`).
    pub load_retry_delay_ms: u64,
    /// JWT token configuration (secret, expiry duration).
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default                   |
    /// |--------------------------|---------------------------|
    /// | `HOST`                   | `0.0.0.0`                 |
    /// | `PORT`                   | `3000`                    |
    /// | `CORS_ORIGINS`           | `http://localhost:5173`   |
    /// | `REQUEST_TIMEOUT_SECS`   | `30`                      |
    /// | `NOTIFY_LOAD_RETRIES`    | `3`                       |
    /// | `NOTIFY_LOAD_RETRY_DELAY_MS` | `2000`                |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let load_retry_attempts: u32 = std::env::var("NOTIFY_LOAD_RETRIES")
            .unwrap_or_else(|_| "3".into())
            .parse()
            .expect("NOTIFY_LOAD_RETRIES must be a valid u32");

        let load_retry_delay_ms: u64 = std::env::var("NOTIFY_LOAD_RETRY_DELAY_MS")
            .unwrap_or_else(|_| "2000".into())
            .parse()
            .expect("NOTIFY_LOAD_RETRY_DELAY_MS must be a valid u64");

        let jwt = JwtConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            load_retry_attempts,
            load_retry_delay_ms,
            jwt,
        }
    }

    /// Retry policy for the per-session notification load.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.load_retry_attempts,
            Duration::from_millis(self.load_retry_delay_ms),
        )
    }
}
