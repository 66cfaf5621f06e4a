// src/config/model.rs

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{CoordinatorError, Result};

/// Top-level service configuration, deserialized from TOML.
///
/// Every field has a default, so an empty file is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct SystemConfig {
    #[serde(default)]
    pub coordinator: CoordinatorSection,
    #[serde(default)]
    pub monitor: MonitorSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CoordinatorSection {
    /// Capacity of the coordinator event channel.
    #[serde(default = "default_event_queue_length")]
    pub event_queue_length: usize,
    /// Capacity of the dispatched-builds channel to the executor.
    #[serde(default = "default_executor_queue_length")]
    pub executor_queue_length: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MonitorSection {
    /// Seconds between condition checks.
    #[serde(default = "default_check_interval_secs")]
    pub check_interval_secs: u64,
    /// Seconds before an unresolved watch times out.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_event_queue_length() -> usize {
    64
}

fn default_executor_queue_length() -> usize {
    32
}

fn default_check_interval_secs() -> u64 {
    1
}

fn default_timeout_secs() -> u64 {
    300
}

impl Default for CoordinatorSection {
    fn default() -> Self {
        Self {
            event_queue_length: default_event_queue_length(),
            executor_queue_length: default_executor_queue_length(),
        }
    }
}

impl Default for MonitorSection {
    fn default() -> Self {
        Self {
            check_interval_secs: default_check_interval_secs(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl MonitorSection {
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl SystemConfig {
    pub fn validate(&self) -> Result<()> {
        if self.coordinator.event_queue_length == 0 {
            return Err(CoordinatorError::ConfigError(
                "coordinator.event_queue_length must be at least 1".to_string(),
            ));
        }
        if self.coordinator.executor_queue_length == 0 {
            return Err(CoordinatorError::ConfigError(
                "coordinator.executor_queue_length must be at least 1".to_string(),
            ));
        }
        if self.monitor.check_interval_secs == 0 {
            return Err(CoordinatorError::ConfigError(
                "monitor.check_interval_secs must be at least 1".to_string(),
            ));
        }
        if self.monitor.check_interval_secs >= self.monitor.timeout_secs {
            return Err(CoordinatorError::ConfigError(format!(
                "monitor.check_interval_secs ({}) must be below monitor.timeout_secs ({})",
                self.monitor.check_interval_secs, self.monitor.timeout_secs
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = SystemConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.coordinator.event_queue_length, 64);
        assert_eq!(config.monitor.timeout_secs, 300);
    }

    #[test]
    fn interval_must_be_below_timeout() {
        let config = SystemConfig {
            monitor: MonitorSection {
                check_interval_secs: 300,
                timeout_secs: 300,
            },
            ..SystemConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(CoordinatorError::ConfigError(_))
        ));
    }

    #[test]
    fn zero_queue_length_is_rejected() {
        let config = SystemConfig {
            coordinator: CoordinatorSection {
                event_queue_length: 0,
                ..CoordinatorSection::default()
            },
            ..SystemConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
