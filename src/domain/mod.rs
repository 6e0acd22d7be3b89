//! Domain layer containing the sync client's types and merge rules.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (timestamps, ids, state machine trait, errors)
//! - `connection` - Connection lifecycle state
//! - `monitoring` - Nodes, processes, stats, events and the reconciled snapshot
//! - `frames` - Typed inbound/outbound frames

pub mod connection;
pub mod foundation;
pub mod frames;
pub mod monitoring;
