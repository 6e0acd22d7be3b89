//! SnapshotLoader port - the read-only HTTP queries used on mount.
//!
//! The stream only pushes deltas and periodic refreshes, so a freshly
//! mounted dashboard seeds its node list and alert counts over HTTP.

use async_trait::async_trait;
use secrecy::SecretString;

use crate::domain::monitoring::{AlertCounts, Node};

/// Errors from the initial snapshot queries.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoaderError {
    #[error("Request unauthorized")]
    Unauthorized,

    #[error("Unexpected HTTP status {0}")]
    Status(u16),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Response could not be decoded: {0}")]
    Decode(String),
}

/// Loads the initial snapshot pieces.
#[async_trait]
pub trait SnapshotLoader: Send + Sync {
    /// Fetches the full node list.
    async fn load_nodes(&self, token: &SecretString) -> Result<Vec<Node>, LoaderError>;

    /// Fetches the current alert counts.
    async fn load_alert_counts(&self, token: &SecretString) -> Result<AlertCounts, LoaderError>;
}
