//! WebSocket adapters for the dashboard stream.
//!
//! # Components
//!
//! - [`messages`] - Wire envelopes (`{"Type": ..., "Data": ...}`)
//! - [`codec`] - `FrameCodec`, envelope ↔ typed frame translation
//! - [`tungstenite_transport`] - Real `Transport` over `tokio-tungstenite`
//! - [`mock_transport`] - Scriptable `Transport` for tests

pub mod codec;
pub mod messages;
pub mod mock_transport;
pub mod tungstenite_transport;

pub use codec::{CodecError, FrameCodec};
pub use messages::{InboundEnvelope, OutboundEnvelope};
pub use mock_transport::{MockOutcome, MockPeer, MockTransport};
pub use tungstenite_transport::TungsteniteTransport;
