//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the sync layer to external systems:
//! - `websocket` - Frame codec and streaming transports (tungstenite, mock)
//! - `session` - In-memory session provider
//! - `http` - Initial snapshot loader over HTTP

pub mod http;
pub mod session;
pub mod websocket;

pub use http::HttpSnapshotLoader;
pub use session::InMemorySession;
pub use websocket::{FrameCodec, MockTransport, TungsteniteTransport};
