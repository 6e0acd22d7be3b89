//! FrameSink port - where outbound control frames go.
//!
//! Implemented by the connection manager; consumed by the subscription
//! manager, which never sees the connection itself.

use async_trait::async_trait;

use crate::domain::frames::{OutboundFrame, SendOutcome};

/// Accepts outbound frames, fire-and-forget.
///
/// # Contract
///
/// Implementations must return `SendOutcome::NotOpen` without sending
/// anything unless the connection is currently open.
#[async_trait]
pub trait FrameSink: Send + Sync {
    async fn send_frame(&self, frame: OutboundFrame) -> SendOutcome;
}
