//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `OPSWATCH` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use opswatch_sync::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Streaming from {}", config.server.base_url);
//! ```

mod connection;
mod error;
mod http;
mod server;
mod session;
mod store;

pub use connection::ConnectionConfig;
pub use error::{ConfigError, ValidationError};
pub use http::HttpConfig;
pub use server::{LogFormat, ServerConfig};
pub use session::SessionConfig;
pub use store::StoreConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Every section has defaults, so an empty environment yields a config
/// pointing at `http://localhost:8080` with no session token.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Dashboard origin and logging
    #[serde(default)]
    pub server: ServerConfig,

    /// Connection lifecycle (retry delay, timeouts, buffers)
    #[serde(default)]
    pub connection: ConnectionConfig,

    /// Snapshot store
    #[serde(default)]
    pub store: StoreConfig,

    /// Session credentials for the binary
    #[serde(default)]
    pub session: SessionConfig,

    /// Initial snapshot REST endpoints
    #[serde(default)]
    pub http: HttpConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `OPSWATCH` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `OPSWATCH__SERVER__BASE_URL=https://ops.example.com` -> `server.base_url`
    /// - `OPSWATCH__CONNECTION__RECONNECT_DELAY_MS=5000` -> `connection.reconnect_delay_ms`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("OPSWATCH")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.connection.validate()?;
        self.store.validate()?;
        self.http.validate()?;
        Ok(())
    }
}
