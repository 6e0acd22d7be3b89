//! Stream connection configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

const MAX_RECONNECT_DELAY_MS: u64 = 300_000;
const MAX_CHANNEL_CAPACITY: usize = 65_536;

/// Connection lifecycle tuning
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionConfig {
    /// Fixed delay before a reconnect attempt, in milliseconds
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_ms: u64,

    /// Bound on a single open attempt, in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Inbound/outbound frame buffer per connection
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// Replay subscription intents after every (re)connect
    #[serde(default = "default_resubscribe")]
    pub resubscribe_on_reconnect: bool,
}

impl ConnectionConfig {
    /// Get reconnect delay as Duration
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    /// Get connect timeout as Duration
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Validate connection configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.reconnect_delay_ms == 0 || self.reconnect_delay_ms > MAX_RECONNECT_DELAY_MS {
            return Err(ValidationError::InvalidReconnectDelay);
        }
        if self.connect_timeout_secs == 0 || self.connect_timeout_secs > 300 {
            return Err(ValidationError::InvalidTimeout("connect_timeout_secs"));
        }
        if self.channel_capacity == 0 || self.channel_capacity > MAX_CHANNEL_CAPACITY {
            return Err(ValidationError::InvalidChannelCapacity);
        }
        Ok(())
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            reconnect_delay_ms: default_reconnect_delay(),
            connect_timeout_secs: default_connect_timeout(),
            channel_capacity: default_channel_capacity(),
            resubscribe_on_reconnect: default_resubscribe(),
        }
    }
}

fn default_reconnect_delay() -> u64 {
    3000
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_channel_capacity() -> usize {
    256
}

fn default_resubscribe() -> bool {
    true
}
