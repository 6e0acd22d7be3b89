//! Application layer - the sync services built on the ports.
//!
//! - [`StateStore`] - applies decoded frames to the snapshot
//! - [`SubscriptionManager`] - subscription intents → control frames
//! - [`ConnectionManager`] - connection lifecycle and reconnection
//! - [`SyncService`] - session-scoped owner of the three above

mod connection_manager;
mod state_store;
mod subscription_manager;
mod sync_service;

pub use connection_manager::{ConnectError, ConnectionManager, ConnectionSettings};
pub use state_store::StateStore;
pub use subscription_manager::SubscriptionManager;
pub use sync_service::SyncService;
