//! Server (dashboard origin) configuration

use serde::Deserialize;
use url::Url;

use super::error::ValidationError;
use crate::domain::connection::StreamEndpoint;

/// Where the dashboard backend lives and how to log
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Page origin the stream and REST endpoints hang off
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Streaming endpoint path
    #[serde(default = "default_ws_path")]
    pub ws_path: String,

    /// Rust log filter directive
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log output format
    #[serde(default)]
    pub log_format: LogFormat,
}

/// Log output format
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl ServerConfig {
    /// Derive the streaming endpoint from the page origin
    pub fn stream_endpoint(&self) -> Result<StreamEndpoint, ValidationError> {
        StreamEndpoint::from_page_origin(&self.base_url, &self.ws_path)
            .map_err(|e| ValidationError::InvalidBaseUrl(e.to_string()))
    }

    /// Validate server configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.base_url.is_empty() {
            return Err(ValidationError::MissingRequired("SERVER__BASE_URL"));
        }
        let url = Url::parse(&self.base_url)
            .map_err(|e| ValidationError::InvalidBaseUrl(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ValidationError::InvalidBaseUrl(format!(
                "unsupported scheme '{}'",
                url.scheme()
            )));
        }
        if url.host_str().is_none() {
            return Err(ValidationError::InvalidBaseUrl("missing host".to_string()));
        }
        if !self.ws_path.starts_with('/') {
            return Err(ValidationError::InvalidPath("ws_path"));
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            ws_path: default_ws_path(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_ws_path() -> String {
    "/ws".to_string()
}

fn default_log_level() -> String {
    "info,opswatch_sync=debug".to_string()
}
