//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, the state machine trait and
//! error types that form the vocabulary of the sync domain.

mod errors;
mod ids;
mod state_machine;
mod timestamp;

pub use errors::ValidationError;
pub use ids::{ConnectionId, EventId};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
