//! Mock transport for testing.
//!
//! Stands in for the network so the connection lifecycle can be driven
//! deterministically: script whether each open attempt is accepted,
//! refused or left hanging, then play the server side through the
//! returned [`MockPeer`].
//!
//! # Panics
//!
//! Uses `.expect()` on its internal mutex. Intended for tests only.
//!
//! # Example
//!
//! ```ignore
//! let transport = MockTransport::new()
//!     .with_outcome(MockOutcome::Refuse(TransportError::ConnectFailed("down".into())));
//!
//! // ... first attempt is refused, the retry is accepted ...
//! let peer = transport.last_peer().unwrap();
//! peer.push(r#"{"Type":"system_stats","Data":{"running_processes":3}}"#).await;
//! assert_eq!(peer.received(), vec![r#"{"Type":"subscribe_node","Data":"web-1"}"#]);
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::connection::StreamTarget;
use crate::ports::{Transport, TransportConnection, TransportError, TransportEvent};

/// How the next open attempt behaves.
#[derive(Debug, Clone)]
pub enum MockOutcome {
    /// Connection opens.
    Accept,
    /// Open fails with the given error.
    Refuse(TransportError),
    /// Open never completes.
    Hang,
}

#[derive(Default)]
struct MockState {
    script: VecDeque<MockOutcome>,
    attempts: Vec<StreamTarget>,
    peers: Vec<MockPeer>,
}

/// Scriptable in-process transport.
///
/// Unscripted attempts are accepted.
#[derive(Clone)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
    channel_capacity: usize,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState::default())),
            channel_capacity: 512,
        }
    }

    /// Queues the outcome of a future open attempt (builder style).
    pub fn with_outcome(self, outcome: MockOutcome) -> Self {
        self.push_outcome(outcome);
        self
    }

    /// Queues the outcome of a future open attempt.
    pub fn push_outcome(&self, outcome: MockOutcome) {
        self.lock().script.push_back(outcome);
    }

    /// Every target an open was attempted against, in order.
    pub fn attempts(&self) -> Vec<StreamTarget> {
        self.lock().attempts.clone()
    }

    pub fn attempt_count(&self) -> usize {
        self.lock().attempts.len()
    }

    /// Server side of the `index`-th accepted connection.
    pub fn peer(&self, index: usize) -> Option<MockPeer> {
        self.lock().peers.get(index).cloned()
    }

    /// Server side of the most recently accepted connection.
    pub fn last_peer(&self) -> Option<MockPeer> {
        self.lock().peers.last().cloned()
    }

    pub fn peer_count(&self) -> usize {
        self.lock().peers.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().expect("MockTransport: state lock poisoned")
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn open(&self, target: &StreamTarget) -> Result<TransportConnection, TransportError> {
        let outcome = {
            let mut state = self.lock();
            state.attempts.push(target.clone());
            state.script.pop_front().unwrap_or(MockOutcome::Accept)
        };

        match outcome {
            MockOutcome::Accept => {
                let (outbound_tx, outbound_rx) = mpsc::channel(self.channel_capacity);
                let (events_tx, events_rx) = mpsc::channel(self.channel_capacity);
                self.lock().peers.push(MockPeer {
                    target: target.clone(),
                    events: events_tx,
                    outbound: Arc::new(Mutex::new(outbound_rx)),
                });
                Ok(TransportConnection {
                    outbound: outbound_tx,
                    events: events_rx,
                })
            }
            MockOutcome::Refuse(err) => Err(err),
            MockOutcome::Hang => futures::future::pending().await,
        }
    }
}

/// Server end of one mock connection.
#[derive(Clone)]
pub struct MockPeer {
    target: StreamTarget,
    events: mpsc::Sender<TransportEvent>,
    outbound: Arc<Mutex<mpsc::Receiver<String>>>,
}

impl MockPeer {
    /// The target this connection was opened against.
    pub fn target(&self) -> &StreamTarget {
        &self.target
    }

    /// Delivers one inbound text frame. Returns false if the client is gone.
    pub async fn push(&self, text: impl Into<String>) -> bool {
        self.events
            .send(TransportEvent::Message(text.into()))
            .await
            .is_ok()
    }

    /// Closes the connection from the server side.
    pub async fn close(&self) {
        let _ = self
            .events
            .send(TransportEvent::Closed {
                code: Some(1006),
                reason: "server went away".to_string(),
            })
            .await;
    }

    /// Fails the connection with a transport error.
    pub async fn fail(&self, reason: impl Into<String>) {
        let _ = self.events.send(TransportEvent::Error(reason.into())).await;
    }

    /// Drains the frames the client has sent so far.
    pub fn received(&self) -> Vec<String> {
        let mut rx = self
            .outbound
            .lock()
            .expect("MockPeer: outbound lock poisoned");
        let mut frames = Vec::new();
        while let Ok(frame) = rx.try_recv() {
            frames.push(frame);
        }
        frames
    }

    /// True once the client has dropped its end of the connection.
    pub fn is_closed_by_client(&self) -> bool {
        self.events.is_closed()
    }
}
