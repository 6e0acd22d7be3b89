//! ConnectionManager - owns the one streaming connection and its retries.
//!
//! # Lifecycle
//!
//! ```text
//! connect() ──► Connecting ──open──► Open ──close/error──► Closed
//!                   │                                        │
//!                   └───────open failed / timed out──────────┤
//!                                                            ▼
//!                          still authenticated? ── yes ──► retry timer ──► Connecting
//!                                   │
//!                                   no ──► Idle
//! ```
//!
//! All bookkeeping (the link task, the retry timer and a generation
//! counter) sits behind one async mutex. Every attempt bumps the
//! generation; notifications carrying an older generation are ignored,
//! so a late close from a superseded link can never schedule a retry or
//! flip the state of its successor.
//!
//! Inbound frames are applied to the [`StateStore`] by the link task one
//! at a time, in transport order.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::SecretString;
use thiserror::Error;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;

use crate::adapters::websocket::FrameCodec;
use crate::config::ConnectionConfig;
use crate::domain::connection::{ConnectionState, StreamEndpoint, StreamTarget};
use crate::domain::foundation::{ConnectionId, StateMachine};
use crate::domain::frames::{OutboundFrame, SendOutcome};
use crate::ports::{
    FrameSink, SessionProvider, Transport, TransportConnection, TransportError, TransportEvent,
};

use super::StateStore;

/// Why `connect()` did not start an attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    #[error("Session is not authenticated")]
    NotAuthenticated,

    #[error("Session has no usable token")]
    MissingToken,

    #[error("A connection is already connecting or open")]
    AlreadyActive,
}

/// Timing knobs for the connection lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionSettings {
    pub reconnect_delay: Duration,
    pub connect_timeout: Duration,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self::from(&ConnectionConfig::default())
    }
}

impl From<&ConnectionConfig> for ConnectionSettings {
    fn from(config: &ConnectionConfig) -> Self {
        Self {
            reconnect_delay: config.reconnect_delay(),
            connect_timeout: config.connect_timeout(),
        }
    }
}

struct Link {
    id: ConnectionId,
    task: JoinHandle<()>,
    /// Set once the transport is open.
    outbound: Option<mpsc::Sender<String>>,
}

struct PendingRetry {
    generation: u64,
    task: JoinHandle<()>,
}

#[derive(Default)]
struct Inner {
    generation: u64,
    link: Option<Link>,
    retry: Option<PendingRetry>,
}

/// Drives the connection state machine.
///
/// Used behind an `Arc`: the link and retry tasks hold a clone.
pub struct ConnectionManager {
    transport: Arc<dyn Transport>,
    session: Arc<dyn SessionProvider>,
    store: Arc<StateStore>,
    endpoint: StreamEndpoint,
    settings: ConnectionSettings,
    state: watch::Sender<ConnectionState>,
    inner: Mutex<Inner>,
    reconnect_attempts: AtomicU64,
}

impl ConnectionManager {
    pub fn new(
        transport: Arc<dyn Transport>,
        session: Arc<dyn SessionProvider>,
        store: Arc<StateStore>,
        endpoint: StreamEndpoint,
        settings: ConnectionSettings,
    ) -> Self {
        let (state, _) = watch::channel(ConnectionState::Idle);
        Self {
            transport,
            session,
            store,
            endpoint,
            settings,
            state,
            inner: Mutex::new(Inner::default()),
            reconnect_attempts: AtomicU64::new(0),
        }
    }

    // === Read model ===

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Subscribes to state transitions.
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// True while the connection is open.
    pub fn is_connected(&self) -> bool {
        self.state().is_open()
    }

    /// Number of retries fired by the reconnect timer so far.
    pub fn reconnect_attempts(&self) -> u64 {
        self.reconnect_attempts.load(Ordering::Relaxed)
    }

    /// Id of the link currently connecting or open, if any.
    pub async fn current_connection(&self) -> Option<ConnectionId> {
        self.inner.lock().await.link.as_ref().map(|l| l.id)
    }

    // === Commands ===

    /// Starts a connection attempt.
    ///
    /// Cancels a pending retry, if any.
    ///
    /// # Errors
    ///
    /// - `NotAuthenticated` / `MissingToken` when the session cannot be used
    /// - `AlreadyActive` while another attempt is connecting or open
    pub async fn connect(self: &Arc<Self>) -> Result<ConnectionId, ConnectError> {
        let session = self.session.current();
        if !session.authenticated {
            return Err(ConnectError::NotAuthenticated);
        }
        let token = session
            .usable_token()
            .cloned()
            .ok_or(ConnectError::MissingToken)?;

        let mut inner = self.inner.lock().await;
        if inner.link.is_some() || self.state().is_live() {
            return Err(ConnectError::AlreadyActive);
        }
        Ok(self.start_link(&mut inner, &token))
    }

    /// Closes the connection, cancels any pending retry and returns to Idle.
    ///
    /// Idempotent.
    pub async fn disconnect(&self) {
        let mut inner = self.inner.lock().await;
        let retry = inner.retry.take();
        let link = inner.link.take();
        if retry.is_none() && link.is_none() && self.state() == ConnectionState::Idle {
            return;
        }

        inner.generation += 1;
        if let Some(retry) = retry {
            retry.task.abort();
            tracing::debug!(generation = retry.generation, "Pending reconnect cancelled");
        }
        if let Some(link) = link {
            // Dropping the task drops the transport connection with it.
            link.task.abort();
            tracing::info!(connection_id = %link.id, "Connection closed by client");
        }
        self.set_state(ConnectionState::Idle);
    }

    // === Internals ===

    fn start_link(self: &Arc<Self>, inner: &mut Inner, token: &SecretString) -> ConnectionId {
        if let Some(retry) = inner.retry.take() {
            retry.task.abort();
        }

        inner.generation += 1;
        let generation = inner.generation;
        let id = ConnectionId::new();
        let target = self.endpoint.target(token);

        self.set_state(ConnectionState::Connecting);
        tracing::debug!(connection_id = %id, generation, target = %target, "Connecting");

        let task = tokio::spawn(Arc::clone(self).run_link(generation, id, target));
        inner.link = Some(Link {
            id,
            task,
            outbound: None,
        });
        id
    }

    async fn run_link(self: Arc<Self>, generation: u64, id: ConnectionId, target: StreamTarget) {
        let opened =
            match tokio::time::timeout(self.settings.connect_timeout, self.transport.open(&target))
                .await
            {
                Ok(result) => result,
                Err(_) => Err(TransportError::Timeout(self.settings.connect_timeout)),
            };

        let TransportConnection {
            outbound,
            mut events,
        } = match opened {
            Ok(connection) => connection,
            Err(e) => {
                tracing::warn!(connection_id = %id, error = %e, "Connection attempt failed");
                self.on_link_lost(generation).await;
                return;
            }
        };

        {
            let mut inner = self.inner.lock().await;
            if inner.generation != generation {
                return;
            }
            if let Some(link) = inner.link.as_mut() {
                link.outbound = Some(outbound);
            }
            self.set_state(ConnectionState::Open);
        }
        tracing::info!(connection_id = %id, "Connection open");

        while let Some(event) = events.recv().await {
            match event {
                TransportEvent::Message(text) => {
                    self.store.apply_text(&text);
                }
                TransportEvent::Error(reason) => {
                    tracing::warn!(connection_id = %id, error = %reason, "Transport error");
                    break;
                }
                TransportEvent::Closed { code, reason } => {
                    tracing::info!(connection_id = %id, ?code, reason = %reason, "Connection closed by server");
                    break;
                }
            }
        }

        self.on_link_lost(generation).await;
    }

    async fn on_link_lost(self: &Arc<Self>, generation: u64) {
        let mut inner = self.inner.lock().await;
        if inner.generation != generation {
            tracing::debug!(generation, "Ignoring loss of superseded connection");
            return;
        }

        // Detach rather than abort: this runs inside the link task.
        inner.link = None;
        self.set_state(ConnectionState::Closed);

        if self.session.current().usable_token().is_none() {
            self.set_state(ConnectionState::Idle);
            return;
        }

        let delay = self.settings.reconnect_delay;
        let manager = Arc::clone(self);
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            manager.fire_retry(generation).await;
        });
        inner.retry = Some(PendingRetry { generation, task });
        tracing::info!(?delay, generation, "Reconnect scheduled");
    }

    async fn fire_retry(self: &Arc<Self>, generation: u64) {
        let mut inner = self.inner.lock().await;
        match inner.retry.take() {
            Some(retry) if retry.generation == generation => {}
            other => {
                inner.retry = other;
                return;
            }
        }

        if inner.link.is_some() || self.state() != ConnectionState::Closed {
            tracing::debug!(state = %self.state(), "Reconnect skipped; connection already active");
            return;
        }

        let Some(token) = self.session.current().usable_token().cloned() else {
            tracing::debug!("Reconnect skipped; session no longer authenticated");
            self.set_state(ConnectionState::Idle);
            return;
        };

        self.reconnect_attempts.fetch_add(1, Ordering::Relaxed);
        self.start_link(&mut inner, &token);
    }

    fn set_state(&self, next: ConnectionState) {
        self.state.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            match current.transition_to(next) {
                Ok(next) => {
                    tracing::debug!(from = %current, to = %next, "Connection state changed");
                    *current = next;
                    true
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Ignoring invalid connection state transition");
                    false
                }
            }
        });
    }
}

#[async_trait]
impl FrameSink for ConnectionManager {
    async fn send_frame(&self, frame: OutboundFrame) -> SendOutcome {
        let sender = {
            let inner = self.inner.lock().await;
            if !self.state().is_open() {
                return SendOutcome::NotOpen;
            }
            match inner.link.as_ref().and_then(|l| l.outbound.clone()) {
                Some(sender) => sender,
                None => return SendOutcome::NotOpen,
            }
        };

        let text = match FrameCodec::encode(&frame) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(kind = frame.kind(), error = %e, "Failed to encode frame");
                return SendOutcome::Failed;
            }
        };

        match sender.send(text).await {
            Ok(()) => SendOutcome::Sent,
            Err(_) => SendOutcome::Failed,
        }
    }
}

#[cfg(test)]
#[path = "connection_manager_test.rs"]
mod connection_manager_test;
