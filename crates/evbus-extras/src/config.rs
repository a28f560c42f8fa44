//! Scheduler settings.

use evbus_core::{ConfigError, ConfigFile};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for [`EventScheduler`](crate::EventScheduler)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Name of the timer thread.
    pub thread_name: String,
    /// How long `shutdown` waits for pending one-shot events.
    pub shutdown_timeout_ms: u64,
}

impl SchedulerConfig {
    /// The shutdown grace period as a `Duration`
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            thread_name: "event-scheduler".to_string(),
            shutdown_timeout_ms: 5000,
        }
    }
}

impl ConfigFile for SchedulerConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.thread_name.trim().is_empty() {
            return Err(ConfigError::InvalidSetting {
                key: "thread_name".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SchedulerConfig::default();
        assert_eq!(config.thread_name, "event-scheduler");
        assert_eq!(config.shutdown_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_partial_toml() {
        let config =
            SchedulerConfig::from_toml_str("shutdown_timeout_ms = 250").expect("valid toml");
        assert_eq!(config.shutdown_timeout(), Duration::from_millis(250));
        assert_eq!(config.thread_name, "event-scheduler");

        assert!(SchedulerConfig::from_toml_str("thread_name = \"\"").is_err());
    }
}
