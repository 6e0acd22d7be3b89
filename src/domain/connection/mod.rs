//! Connection lifecycle vocabulary.

mod connection_state;
mod endpoint;

pub use connection_state::ConnectionState;
pub use endpoint::{StreamEndpoint, StreamTarget};
