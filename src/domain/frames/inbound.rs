//! Server → client frames.

use serde_json::{Map, Value};

use crate::domain::monitoring::{Node, ProcessStatusChange, ProcessUpdate, SystemStats};

/// A decoded inbound frame. Immutable once decoded.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundFrame {
    /// `nodes_update`: the full node list.
    NodesUpdate(Vec<Node>),
    /// `process_update`: the process list of one node.
    ProcessUpdate(ProcessUpdate),
    /// `process_status_change`: one process changed state.
    ProcessStatusChange(ProcessStatusChange),
    /// `system_stats`: aggregate figures.
    SystemStats(SystemStats),
    /// `activity_log`: free-form activity entry.
    ActivityLog(Map<String, Value>),
    /// Any discriminant this client does not know.
    Unknown { kind: String },
}

impl InboundFrame {
    pub const NODES_UPDATE: &'static str = "nodes_update";
    pub const PROCESS_UPDATE: &'static str = "process_update";
    pub const PROCESS_STATUS_CHANGE: &'static str = "process_status_change";
    pub const SYSTEM_STATS: &'static str = "system_stats";
    pub const ACTIVITY_LOG: &'static str = "activity_log";

    /// The wire discriminant of this frame.
    pub fn kind(&self) -> &str {
        match self {
            InboundFrame::NodesUpdate(_) => Self::NODES_UPDATE,
            InboundFrame::ProcessUpdate(_) => Self::PROCESS_UPDATE,
            InboundFrame::ProcessStatusChange(_) => Self::PROCESS_STATUS_CHANGE,
            InboundFrame::SystemStats(_) => Self::SYSTEM_STATS,
            InboundFrame::ActivityLog(_) => Self::ACTIVITY_LOG,
            InboundFrame::Unknown { kind } => kind.as_str(),
        }
    }
}
