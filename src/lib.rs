//! Opswatch Sync - real-time synchronization client for the Opswatch dashboard
//!
//! Maintains one live streaming connection to the monitoring backend,
//! reconciles inbound update frames into a consistent in-memory snapshot,
//! and exposes subscription controls that scope which nodes produce
//! updates.
//!
//! Start with [`application::SyncService`].

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
