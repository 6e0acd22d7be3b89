//! FrameCodec - translates between wire text and typed frames.
//!
//! Decoding is two-stage: the envelope is parsed first, then the payload
//! is deserialized according to the discriminant. Unknown discriminants
//! decode successfully into `InboundFrame::Unknown`. Payload fields are
//! read leniently, so only malformed JSON or a payload whose outer shape
//! does not fit its kind is an error: a `nodes_update` that is not an
//! array, a `process_update` without a node name, or a non-object
//! payload for the object-shaped kinds.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::domain::frames::{InboundFrame, OutboundFrame};

use super::messages::{InboundEnvelope, OutboundEnvelope};

/// Errors raised while translating frames.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("Frame is not a valid envelope: {0}")]
    Malformed(String),

    #[error("Payload of '{kind}' frame is invalid: {reason}")]
    InvalidPayload { kind: String, reason: String },

    #[error("Frame could not be encoded: {0}")]
    Encode(String),
}

/// Stateless encoder/decoder for dashboard frames.
pub struct FrameCodec;

impl FrameCodec {
    /// Decodes one inbound text frame.
    ///
    /// # Errors
    ///
    /// Returns `CodecError::Malformed` for text that is not a JSON envelope
    /// and `CodecError::InvalidPayload` when a known kind carries a payload
    /// whose outer shape is wrong.
    pub fn decode(raw: &str) -> Result<InboundFrame, CodecError> {
        let envelope: InboundEnvelope =
            serde_json::from_str(raw).map_err(|e| CodecError::Malformed(e.to_string()))?;
        let InboundEnvelope { kind, data } = envelope;

        let frame = match kind.as_str() {
            InboundFrame::NODES_UPDATE => InboundFrame::NodesUpdate(payload(&kind, data)?),
            InboundFrame::PROCESS_UPDATE => InboundFrame::ProcessUpdate(payload(&kind, data)?),
            InboundFrame::PROCESS_STATUS_CHANGE => {
                InboundFrame::ProcessStatusChange(payload(&kind, data)?)
            }
            InboundFrame::SYSTEM_STATS => InboundFrame::SystemStats(payload(&kind, data)?),
            InboundFrame::ACTIVITY_LOG => InboundFrame::ActivityLog(payload(&kind, data)?),
            _ => InboundFrame::Unknown { kind },
        };

        Ok(frame)
    }

    /// Encodes one outbound control frame.
    pub fn encode(frame: &OutboundFrame) -> Result<String, CodecError> {
        serde_json::to_string(&OutboundEnvelope {
            kind: frame.kind(),
            data: frame.node_name(),
        })
        .map_err(|e| CodecError::Encode(e.to_string()))
    }
}

fn payload<T: DeserializeOwned>(kind: &str, data: Value) -> Result<T, CodecError> {
    serde_json::from_value(data).map_err(|e| CodecError::InvalidPayload {
        kind: kind.to_string(),
        reason: e.to_string(),
    })
}
