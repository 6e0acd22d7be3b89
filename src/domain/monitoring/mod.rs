//! Monitoring domain - what the dashboard knows about the fleet.
//!
//! - [`Node`] / [`ProcessInfo`] - monitored hosts and their processes
//! - [`SystemStats`] / [`AlertCounts`] - aggregate figures
//! - [`Event`] - bounded activity/status log entries
//! - [`Snapshot`] - the reconciled client-side state and its merge rules

mod event;
mod lenient;
mod node;
mod snapshot;
mod stats;

pub use event::{Event, EventKind, NewEvent};
pub use node::{Node, ProcessInfo, ProcessStatusChange, ProcessUpdate};
pub use snapshot::{Snapshot, DEFAULT_EVENT_LOG_CAPACITY};
pub use stats::{AlertCounts, SystemStats};
