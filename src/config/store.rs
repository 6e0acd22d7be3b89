//! Snapshot store configuration

use serde::Deserialize;

use super::error::ValidationError;
use crate::domain::monitoring::DEFAULT_EVENT_LOG_CAPACITY;

/// Snapshot store tuning
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Maximum number of events kept in the log
    #[serde(default = "default_event_log_capacity")]
    pub event_log_capacity: usize,
}

impl StoreConfig {
    /// Validate store configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.event_log_capacity == 0 || self.event_log_capacity > 10_000 {
            return Err(ValidationError::InvalidEventLogCapacity);
        }
        Ok(())
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            event_log_capacity: default_event_log_capacity(),
        }
    }
}

fn default_event_log_capacity() -> usize {
    DEFAULT_EVENT_LOG_CAPACITY
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_capacity_is_one_hundred() {
        assert_eq!(StoreConfig::default().event_log_capacity, 100);
    }

    #[test]
    fn test_capacity_bounds() {
        for bad in [0, 10_001] {
            let config = StoreConfig {
                event_log_capacity: bad,
            };
            assert_eq!(config.validate(), Err(ValidationError::InvalidEventLogCapacity));
        }
        assert!(StoreConfig {
            event_log_capacity: 10_000
        }
        .validate()
        .is_ok());
    }
}
