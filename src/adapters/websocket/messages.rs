//! Wire envelopes for the dashboard stream.
//!
//! Every frame, in both directions, is a JSON object with a string
//! discriminant and a payload:
//!
//! ```text
//! {"Type": "system_stats", "Data": {"running_processes": 12}}
//! {"Type": "subscribe_node", "Data": "web-1"}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================
// Server → Client
// ============================================

/// Envelope of an inbound frame before dispatch on `kind`.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundEnvelope {
    #[serde(rename = "Type", alias = "type")]
    pub kind: String,

    #[serde(rename = "Data", alias = "data", default)]
    pub data: Value,
}

// ============================================
// Client → Server
// ============================================

/// Envelope of an outbound control frame.
#[derive(Debug, Clone, Serialize)]
pub struct OutboundEnvelope<'a> {
    #[serde(rename = "Type")]
    pub kind: &'a str,

    #[serde(rename = "Data")]
    pub data: &'a str,
}
