//! Typed frames exchanged with the monitoring backend.
//!
//! Inbound frames are a closed sum type with an explicit `Unknown`
//! variant, so adding a frame kind is a compile-time decision. Wire
//! encoding lives in the websocket adapter.

mod inbound;
mod outbound;

pub use inbound::InboundFrame;
pub use outbound::{OutboundFrame, SendOutcome};
