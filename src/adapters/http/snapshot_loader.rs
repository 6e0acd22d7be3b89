//! `SnapshotLoader` over the dashboard's REST endpoints.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use crate::config::{HttpConfig, ServerConfig};
use crate::domain::monitoring::{AlertCounts, Node};
use crate::ports::{LoaderError, SnapshotLoader};

/// Node list bodies come either bare or wrapped.
#[derive(Deserialize)]
#[serde(untagged)]
enum NodeListBody {
    Bare(Vec<Node>),
    Wrapped {
        #[serde(alias = "Nodes")]
        nodes: Vec<Node>,
    },
}

impl NodeListBody {
    fn into_nodes(self) -> Vec<Node> {
        match self {
            NodeListBody::Bare(nodes) | NodeListBody::Wrapped { nodes } => nodes,
        }
    }
}

/// Scheme, host and port of `base_url`, without a trailing slash.
///
/// Falls back to the trimmed input when it does not parse as a URL with
/// a host; config validation rejects such values before they get here.
fn origin_of(base_url: &str) -> String {
    match Url::parse(base_url) {
        Ok(url) if url.has_host() => url.origin().ascii_serialization(),
        _ => base_url.trim_end_matches('/').to_string(),
    }
}

/// Loads nodes and alert counts with reqwest.
#[derive(Debug, Clone)]
pub struct HttpSnapshotLoader {
    client: Client,
    nodes_url: String,
    alerts_url: String,
    timeout: Duration,
}

impl HttpSnapshotLoader {
    /// Creates a loader against the origin of `base_url`.
    ///
    /// Any path on `base_url` is ignored, so REST calls land on the same
    /// origin as the streaming endpoint.
    pub fn new(base_url: &str, nodes_path: &str, alerts_path: &str, timeout: Duration) -> Self {
        let base = origin_of(base_url);
        Self {
            client: Client::new(),
            nodes_url: format!("{}{}", base, nodes_path),
            alerts_url: format!("{}{}", base, alerts_path),
            timeout,
        }
    }

    /// Creates a loader from the application config sections.
    pub fn from_config(server: &ServerConfig, http: &HttpConfig) -> Self {
        Self::new(
            &server.base_url,
            &http.nodes_path,
            &http.alerts_path,
            http.timeout(),
        )
    }

    pub fn nodes_url(&self) -> &str {
        &self.nodes_url
    }

    pub fn alerts_url(&self) -> &str {
        &self.alerts_url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        token: &SecretString,
    ) -> Result<T, LoaderError> {
        let response = self
            .client
            .get(url)
            .bearer_auth(token.expose_secret())
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LoaderError::Network(format!("Timed out after {:?}", self.timeout))
                } else {
                    LoaderError::Network(e.to_string())
                }
            })?;

        let response = check_status(response)?;

        response
            .json::<T>()
            .await
            .map_err(|e| LoaderError::Decode(e.to_string()))
    }
}

fn check_status(response: Response) -> Result<Response, LoaderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    match status.as_u16() {
        401 | 403 => Err(LoaderError::Unauthorized),
        code => Err(LoaderError::Status(code)),
    }
}

#[async_trait]
impl SnapshotLoader for HttpSnapshotLoader {
    async fn load_nodes(&self, token: &SecretString) -> Result<Vec<Node>, LoaderError> {
        let body: NodeListBody = self.get_json(&self.nodes_url, token).await?;
        let nodes = body.into_nodes();
        tracing::debug!(count = nodes.len(), "Loaded node list");
        Ok(nodes)
    }

    async fn load_alert_counts(&self, token: &SecretString) -> Result<AlertCounts, LoaderError> {
        let counts: AlertCounts = self.get_json(&self.alerts_url, token).await?;
        tracing::debug!(total = counts.total, "Loaded alert counts");
        Ok(counts)
    }
}
