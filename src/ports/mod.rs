//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the sync core and the outside world. Adapters implement these ports.
//!
//! - `Transport` - Opens the streaming connection
//! - `SessionProvider` - Authentication signal and bearer token
//! - `FrameSink` - Outbound control frames, gated on connection state
//! - `SnapshotLoader` - Initial node list and alert counts over HTTP

mod frame_sink;
mod session_provider;
mod snapshot_loader;
mod transport;

pub use frame_sink::FrameSink;
pub use session_provider::{SessionProvider, SessionState};
pub use snapshot_loader::{LoaderError, SnapshotLoader};
pub use transport::{Transport, TransportConnection, TransportError, TransportEvent};
