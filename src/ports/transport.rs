//! Transport port - the streaming connection underneath the sync layer.
//!
//! A transport opens one connection per call and hands back a pair of
//! channels. The connection manager drives its state machine purely
//! from what arrives on `events`, so a fake transport can exercise the
//! whole lifecycle without a network.
//!
//! # Contract
//!
//! - `events` yields inbound text frames in delivery order.
//! - A transport-level failure is reported as `TransportEvent::Error`,
//!   a close (either side) as `TransportEvent::Closed`; the channel
//!   ending without either counts as a close.
//! - Dropping the `TransportConnection` closes the connection.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::connection::StreamTarget;

/// Notification from an open transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// One inbound text frame.
    Message(String),
    /// The transport failed; the connection is unusable.
    Error(String),
    /// The connection closed.
    Closed { code: Option<u16>, reason: String },
}

/// An open connection: send text frames in, receive notifications out.
#[derive(Debug)]
pub struct TransportConnection {
    pub outbound: mpsc::Sender<String>,
    pub events: mpsc::Receiver<TransportEvent>,
}

/// Errors that end an open attempt.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Remote refused or was unreachable.
    #[error("Connection failed: {0}")]
    ConnectFailed(String),

    /// The server answered the upgrade with an HTTP error.
    #[error("Handshake rejected with HTTP {status}")]
    HandshakeRejected { status: u16 },

    /// The attempt did not finish in time.
    #[error("Connection attempt timed out after {0:?}")]
    Timeout(Duration),
}

/// Opens streaming connections.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Opens a connection to `target`.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` when the connection cannot be established.
    async fn open(&self, target: &StreamTarget) -> Result<TransportConnection, TransportError>;
}
