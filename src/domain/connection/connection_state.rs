//! Lifecycle state of the single streaming connection.
//!
//! ```text
//! Idle --connect()--> Connecting --open--> Open
//!                     Connecting --error/close--> Closed
//!                     Open --error/close--> Closed
//!                     Closed --retry timer--> Connecting
//!                     Closed | Open | Connecting --disconnect()--> Idle
//! ```

use serde::Serialize;
use std::fmt;

use crate::domain::foundation::StateMachine;

/// Where the connection manager currently is in its lifecycle.
///
/// Exactly one value exists per connection manager; every other
/// activity in the sync layer is driven from its transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// No connection and no retry pending.
    #[default]
    Idle,
    /// A transport open is in flight.
    Connecting,
    /// The transport is open and frames flow.
    Open,
    /// The transport was lost; a retry may be pending.
    Closed,
}

impl ConnectionState {
    /// Returns true if frames can be sent.
    pub fn is_open(&self) -> bool {
        matches!(self, ConnectionState::Open)
    }

    /// Returns true if a transport exists or is being established.
    pub fn is_live(&self) -> bool {
        matches!(self, ConnectionState::Connecting | ConnectionState::Open)
    }
}

impl StateMachine for ConnectionState {
    fn valid_transitions(&self) -> Vec<Self> {
        use ConnectionState::*;
        match self {
            Idle => vec![Connecting],
            Connecting => vec![Open, Closed, Idle],
            Open => vec![Closed, Idle],
            Closed => vec![Connecting, Idle],
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionState::Idle => "idle",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Open => "open",
            ConnectionState::Closed => "closed",
        };
        write!(f, "{}", s)
    }
}
