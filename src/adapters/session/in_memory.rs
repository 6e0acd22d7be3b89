//! In-memory session backed by a `watch` channel.
//!
//! The binary signs in once with the configured token; tests flip the
//! signal with `login`/`logout` to drive the connection supervisor.

use secrecy::SecretString;
use tokio::sync::watch;

use crate::ports::{SessionProvider, SessionState};

/// Session whose state lives in process memory.
#[derive(Debug)]
pub struct InMemorySession {
    state: watch::Sender<SessionState>,
}

impl Default for InMemorySession {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemorySession {
    /// Creates a signed-out session.
    pub fn new() -> Self {
        let (state, _) = watch::channel(SessionState::anonymous());
        Self { state }
    }

    /// Creates a session already signed in with `token`.
    pub fn authenticated(token: SecretString) -> Self {
        let (state, _) = watch::channel(SessionState::authenticated(token));
        Self { state }
    }

    /// Signs in, replacing any previous token.
    pub fn login(&self, token: SecretString) {
        tracing::debug!("Session authenticated");
        self.state.send_replace(SessionState::authenticated(token));
    }

    /// Signs out and drops the token.
    pub fn logout(&self) {
        tracing::debug!("Session signed out");
        self.state.send_replace(SessionState::anonymous());
    }
}

impl SessionProvider for InMemorySession {
    fn current(&self) -> SessionState {
        self.state.borrow().clone()
    }

    fn changes(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }
}
