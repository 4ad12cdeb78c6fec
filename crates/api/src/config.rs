//! Application configuration loaded from environment variables.

use auth::TokenConfig;

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `3000`)
/// - `DATABASE_URL` — PostgreSQL URL; absent means the in-memory store
/// - `ACCESS_TOKEN_SECRET` / `REFRESH_TOKEN_SECRET` — JWT signing keys
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: Option<String>,
    pub access_token_secret: String,
    pub refresh_token_secret: String,
    pub log_level: String,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            database_url: std::env::var("DATABASE_URL").ok(),
            access_token_secret: std::env::var("ACCESS_TOKEN_SECRET")
                .unwrap_or_else(|_| "dev-access-secret".to_string()),
            refresh_token_secret: std::env::var("REFRESH_TOKEN_SECRET")
                .unwrap_or_else(|_| "dev-refresh-secret".to_string()),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the JWT signing configuration with standard expiries.
    pub fn token_config(&self) -> TokenConfig {
        TokenConfig::new(&self.access_token_secret, &self.refresh_token_secret)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            database_url: None,
            access_token_secret: "dev-access-secret".to_string(),
            refresh_token_secret: "dev-refresh-secret".to_string(),
            log_level: "info".to_string(),
        }
    }
}
