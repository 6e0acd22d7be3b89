//! REST snapshot endpoint configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Initial snapshot queries
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Node list endpoint path
    #[serde(default = "default_nodes_path")]
    pub nodes_path: String,

    /// Alert count endpoint path
    #[serde(default = "default_alerts_path")]
    pub alerts_path: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl HttpConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate REST configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.nodes_path.starts_with('/') {
            return Err(ValidationError::InvalidPath("nodes_path"));
        }
        if !self.alerts_path.starts_with('/') {
            return Err(ValidationError::InvalidPath("alerts_path"));
        }
        if self.timeout_secs == 0 || self.timeout_secs > 300 {
            return Err(ValidationError::InvalidTimeout("http.timeout_secs"));
        }
        Ok(())
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            nodes_path: default_nodes_path(),
            alerts_path: default_alerts_path(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_nodes_path() -> String {
    "/api/nodes".to_string()
}

fn default_alerts_path() -> String {
    "/api/alerts/count".to_string()
}

fn default_timeout() -> u64 {
    15
}
