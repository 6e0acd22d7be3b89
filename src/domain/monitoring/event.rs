//! Event log entries synthesized from status-change and activity frames.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::domain::foundation::{EventId, Timestamp};

use super::node::{lookup_str, ProcessStatusChange};

/// Which frame kind produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    ProcessStatusChange,
    ActivityLog,
}

/// One immutable entry in the bounded event log.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: EventId,
    pub kind: EventKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub process_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Payload fields copied verbatim from the frame.
    pub fields: Map<String, Value>,
    pub timestamp: Timestamp,
}

/// An event before the snapshot has assigned it an id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    pub kind: EventKind,
    pub node_name: Option<String>,
    pub process_name: Option<String>,
    pub status: Option<String>,
    pub fields: Map<String, Value>,
    pub timestamp: Timestamp,
}

impl NewEvent {
    /// Builds a status-change event.
    ///
    /// Uses the backend's timestamp when it parses as RFC 3339,
    /// otherwise `received_at`.
    pub fn from_status_change(change: ProcessStatusChange, received_at: Timestamp) -> Self {
        let timestamp = change
            .timestamp
            .as_deref()
            .and_then(Timestamp::parse_rfc3339)
            .unwrap_or(received_at);

        let mut fields = change.extra;
        if let Some(raw) = &change.timestamp {
            fields.insert("Timestamp".to_string(), Value::String(raw.clone()));
        }

        Self {
            kind: EventKind::ProcessStatusChange,
            node_name: change.node_name,
            process_name: change.process_name,
            status: change.status,
            fields,
            timestamp,
        }
    }

    /// Builds an activity event carrying the whole payload.
    pub fn from_activity(fields: Map<String, Value>, received_at: Timestamp) -> Self {
        let node_name = lookup_str(&fields, &["node_name", "nodeName", "NodeName"]).map(String::from);
        let process_name =
            lookup_str(&fields, &["process_name", "processName", "ProcessName"]).map(String::from);
        let status = lookup_str(&fields, &["status", "Status", "level", "Level"]).map(String::from);
        let timestamp = lookup_str(&fields, &["timestamp", "Timestamp"])
            .and_then(Timestamp::parse_rfc3339)
            .unwrap_or(received_at);

        Self {
            kind: EventKind::ActivityLog,
            node_name,
            process_name,
            status,
            fields,
            timestamp,
        }
    }

    /// Stamps the event with its id.
    pub fn into_event(self, id: EventId) -> Event {
        Event {
            id,
            kind: self.kind,
            node_name: self.node_name,
            process_name: self.process_name,
            status: self.status,
            fields: self.fields,
            timestamp: self.timestamp,
        }
    }
}

impl Event {
    /// Free-text message of an activity entry, if any.
    pub fn message(&self) -> Option<&str> {
        lookup_str(&self.fields, &["message", "Message"])
    }
}
