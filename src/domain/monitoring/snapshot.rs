//! The reconciled client-side view of the fleet.
//!
//! Every mutation is a total function of the current snapshot and one
//! payload. Entity list and stats are replaced wholesale; process lists
//! are upserted per node; events are prepended to a bounded log that
//! evicts its oldest entries first.

use std::collections::{BTreeMap, VecDeque};

use serde::Serialize;

use crate::domain::foundation::EventId;

use super::event::{Event, NewEvent};
use super::node::{Node, ProcessInfo, ProcessUpdate};
use super::stats::{AlertCounts, SystemStats};

/// Default bound on the event log.
pub const DEFAULT_EVENT_LOG_CAPACITY: usize = 100;

/// Reconciled snapshot of everything received so far.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    entities: Vec<Node>,
    detail_by_entity: BTreeMap<String, Vec<ProcessInfo>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stats: Option<SystemStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    alerts: Option<AlertCounts>,
    /// Newest first.
    event_log: VecDeque<Event>,
    #[serde(skip)]
    next_event_id: EventId,
    #[serde(skip)]
    event_log_capacity: usize,
}

impl Snapshot {
    /// Creates an empty snapshot whose event log holds at most `capacity` entries.
    ///
    /// A capacity of zero is raised to one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entities: Vec::new(),
            detail_by_entity: BTreeMap::new(),
            stats: None,
            alerts: None,
            event_log: VecDeque::with_capacity(capacity + 1),
            next_event_id: EventId::from_sequence(1),
            event_log_capacity: capacity,
        }
    }

    // === Reads ===

    pub fn entities(&self) -> &[Node] {
        &self.entities
    }

    /// Looks up a node by name.
    pub fn entity(&self, name: &str) -> Option<&Node> {
        self.entities.iter().find(|n| n.name() == Some(name))
    }

    pub fn detail_by_entity(&self) -> &BTreeMap<String, Vec<ProcessInfo>> {
        &self.detail_by_entity
    }

    /// Process list of one node, if any update has arrived for it.
    pub fn detail(&self, node_name: &str) -> Option<&[ProcessInfo]> {
        self.detail_by_entity.get(node_name).map(Vec::as_slice)
    }

    pub fn stats(&self) -> Option<&SystemStats> {
        self.stats.as_ref()
    }

    pub fn alerts(&self) -> Option<&AlertCounts> {
        self.alerts.as_ref()
    }

    /// Event log, newest first.
    pub fn event_log(&self) -> &VecDeque<Event> {
        &self.event_log
    }

    pub fn event_log_capacity(&self) -> usize {
        self.event_log_capacity
    }

    // === Merges ===

    /// Replaces the entity list wholesale.
    pub fn replace_entities(&mut self, nodes: Vec<Node>) {
        self.entities = nodes;
    }

    /// Upserts the process list of exactly one node.
    pub fn upsert_detail(&mut self, update: ProcessUpdate) {
        self.detail_by_entity
            .insert(update.node_name, update.processes);
    }

    /// Replaces the aggregate stats wholesale.
    pub fn replace_stats(&mut self, stats: SystemStats) {
        self.stats = Some(stats);
    }

    /// Replaces the alert counts wholesale.
    pub fn replace_alerts(&mut self, alerts: AlertCounts) {
        self.alerts = Some(alerts);
    }

    /// Prepends an event and evicts from the tail past capacity.
    ///
    /// Returns the id assigned to the new entry.
    pub fn append_event(&mut self, event: NewEvent) -> EventId {
        let id = self.next_event_id;
        self.next_event_id = id.next();

        self.event_log.push_front(event.into_event(id));
        while self.event_log.len() > self.event_log_capacity {
            self.event_log.pop_back();
        }
        id
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_EVENT_LOG_CAPACITY)
    }
}

#[cfg(test)]
#[path = "snapshot_test.rs"]
mod snapshot_test;
