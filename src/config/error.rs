//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("Path for {0} must start with '/'")]
    InvalidPath(&'static str),

    #[error("Unknown log format: {0}")]
    InvalidLogFormat(String),

    #[error("Reconnect delay must be between 1 and 300000 ms")]
    InvalidReconnectDelay,

    #[error("Invalid timeout for {0}")]
    InvalidTimeout(&'static str),

    #[error("Channel capacity must be between 1 and 65536")]
    InvalidChannelCapacity,

    #[error("Event log capacity must be between 1 and 10000")]
    InvalidEventLogCapacity,
}
