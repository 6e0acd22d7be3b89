//! Session port - the authentication context that gates connections.
//!
//! The sync layer never authenticates anyone itself. It asks the session
//! whether a user is signed in and for the bearer token, and watches for
//! the signal to flip.

use secrecy::{ExposeSecret, SecretString};
use tokio::sync::watch;

/// Point-in-time view of the session.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub authenticated: bool,
    pub token: Option<SecretString>,
}

impl SessionState {
    /// A signed-in session holding `token`.
    pub fn authenticated(token: SecretString) -> Self {
        Self {
            authenticated: true,
            token: Some(token),
        }
    }

    /// A signed-out session.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// The token, only if authenticated and non-empty.
    pub fn usable_token(&self) -> Option<&SecretString> {
        if !self.authenticated {
            return None;
        }
        self.token
            .as_ref()
            .filter(|t| !t.expose_secret().is_empty())
    }
}

/// Supplies the authentication signal and token.
///
/// # Contract
///
/// - `current()` is cheap and never blocks.
/// - `changes()` returns a receiver that observes every later update.
pub trait SessionProvider: Send + Sync {
    /// The session as of now.
    fn current(&self) -> SessionState;

    /// Subscribes to session changes.
    fn changes(&self) -> watch::Receiver<SessionState>;

    /// Shorthand for `current().authenticated`.
    fn is_authenticated(&self) -> bool {
        self.current().authenticated
    }
}
