//! Node and process records as delivered by the monitoring backend.
//!
//! The backend mixes casing conventions between frame kinds and is loose
//! about field types, so node and process records keep the payload value
//! exactly as received and read fields through accessors. A record
//! serializes back to the JSON it came from.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::lenient;

/// A monitored host, identified by its unique name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Node(Value);

impl Node {
    /// Creates a node record carrying only a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self(json!({ "name": name.into() }))
    }

    /// The node's name, if the record carries one as a string.
    pub fn name(&self) -> Option<&str> {
        lookup_value_str(&self.0, &["name", "Name"])
    }

    /// Host address, if the backend reported one.
    pub fn host(&self) -> Option<&str> {
        lookup_value_str(&self.0, &["host", "Host"])
    }

    /// Whether the backend currently reaches this node.
    ///
    /// Missing or non-boolean values read as disconnected.
    pub fn is_connected(&self) -> bool {
        ["is_connected", "isConnected", "IsConnected"]
            .iter()
            .find_map(|k| self.attribute(k))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Any field of the record, by its wire name.
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.0.as_object().and_then(|m| m.get(key))
    }
}

/// Status record for one process on a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessInfo(Value);

impl ProcessInfo {
    /// Creates a process record carrying only a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self(json!({ "name": name.into() }))
    }

    pub fn name(&self) -> Option<&str> {
        lookup_value_str(&self.0, &["name", "Name"])
    }

    /// Human-readable state name (e.g. `RUNNING`).
    pub fn state(&self) -> Option<&str> {
        lookup_value_str(
            &self.0,
            &["statename", "state_name", "StateName", "state", "State"],
        )
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.0.as_object().and_then(|m| m.get(key))
    }
}

/// Payload of a `process_update` frame: the full process list of one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessUpdate {
    #[serde(
        rename = "nodeName",
        alias = "NodeName",
        alias = "node_name",
        deserialize_with = "lenient::name"
    )]
    pub node_name: String,

    #[serde(default, alias = "Processes", deserialize_with = "lenient::list")]
    pub processes: Vec<ProcessInfo>,
}

/// Payload of a `process_status_change` frame.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProcessStatusChange {
    #[serde(
        default,
        rename = "NodeName",
        alias = "nodeName",
        alias = "node_name",
        deserialize_with = "lenient::label"
    )]
    pub node_name: Option<String>,

    #[serde(
        default,
        rename = "ProcessName",
        alias = "processName",
        alias = "process_name",
        deserialize_with = "lenient::label"
    )]
    pub process_name: Option<String>,

    #[serde(
        default,
        rename = "Status",
        alias = "status",
        deserialize_with = "lenient::label"
    )]
    pub status: Option<String>,

    /// Raw timestamp as sent; parsed leniently when the event is built.
    #[serde(
        default,
        rename = "Timestamp",
        alias = "timestamp",
        deserialize_with = "lenient::label"
    )]
    pub timestamp: Option<String>,

    /// Everything else in the payload.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

pub(super) fn lookup_str<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|k| map.get(*k)).and_then(Value::as_str)
}

fn lookup_value_str<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a str> {
    value.as_object().and_then(|m| lookup_str(m, keys))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_keeps_unknown_fields() {
        let node: Node = serde_json::from_value(json!({
            "name": "web-1",
            "host": "10.0.0.4",
            "port": 9001,
            "is_connected": true
        }))
        .unwrap();

        assert_eq!(node.name(), Some("web-1"));
        assert_eq!(node.host(), Some("10.0.0.4"));
        assert!(node.is_connected());
        assert_eq!(node.attribute("port"), Some(&json!(9001)));
    }

    #[test]
    fn node_accepts_pascal_case_name() {
        let node: Node = serde_json::from_value(json!({"Name": "db-2"})).unwrap();
        assert_eq!(node.name(), Some("db-2"));
        assert!(!node.is_connected());
    }

    #[test]
    fn node_with_odd_name_survives_unchanged() {
        let raw = json!({"name": 7, "host": null});
        let node: Node = serde_json::from_value(raw.clone()).unwrap();

        assert_eq!(node.name(), None);
        assert_eq!(node.host(), None);
        assert_eq!(serde_json::to_value(&node).unwrap(), raw);
    }

    #[test]
    fn process_state_prefers_statename() {
        let process: ProcessInfo = serde_json::from_value(json!({
            "name": "worker",
            "state": 20,
            "statename": "RUNNING"
        }))
        .unwrap();
        assert_eq!(process.state(), Some("RUNNING"));
        assert_eq!(process.attribute("state"), Some(&json!(20)));
    }

    #[test]
    fn process_update_reads_camel_case() {
        let update: ProcessUpdate = serde_json::from_value(json!({
            "nodeName": "web-1",
            "processes": [{"name": "nginx"}]
        }))
        .unwrap();
        assert_eq!(update.node_name, "web-1");
        assert_eq!(update.processes, vec![ProcessInfo::named("nginx")]);
    }

    #[test]
    fn process_update_tolerates_null_process_list() {
        let update: ProcessUpdate =
            serde_json::from_value(json!({"NodeName": 42, "Processes": null})).unwrap();
        assert_eq!(update.node_name, "42");
        assert!(update.processes.is_empty());
    }

    #[test]
    fn process_update_requires_node_name() {
        let missing: Result<ProcessUpdate, _> = serde_json::from_value(json!({"processes": []}));
        assert!(missing.is_err());

        let null: Result<ProcessUpdate, _> =
            serde_json::from_value(json!({"nodeName": null, "processes": []}));
        assert!(null.is_err());
    }

    #[test]
    fn status_change_reads_pascal_case() {
        let change: ProcessStatusChange = serde_json::from_value(json!({
            "NodeName": "web-1",
            "ProcessName": "nginx",
            "Status": "STOPPED",
            "Timestamp": "2024-05-01T08:00:00Z"
        }))
        .unwrap();
        assert_eq!(change.node_name.as_deref(), Some("web-1"));
        assert_eq!(change.process_name.as_deref(), Some("nginx"));
        assert_eq!(change.status.as_deref(), Some("STOPPED"));
        assert_eq!(change.timestamp.as_deref(), Some("2024-05-01T08:00:00Z"));
        assert!(change.extra.is_empty());
    }

    #[test]
    fn status_change_stringifies_numeric_status() {
        let change: ProcessStatusChange = serde_json::from_value(json!({
            "NodeName": "web-1",
            "Status": 20,
            "Timestamp": null,
            "exit_code": 1
        }))
        .unwrap();
        assert_eq!(change.status.as_deref(), Some("20"));
        assert_eq!(change.timestamp, None);
        assert_eq!(change.extra.get("exit_code"), Some(&json!(1)));
    }
}
