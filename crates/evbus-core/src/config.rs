//! Configuration for event bus instances.
//!
//! Settings are plain serde structs with sensible defaults, loadable from TOML
//! or JSON either as strings or from files (format picked by extension).

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;

/// Loading helpers shared by every configuration section.
pub trait ConfigFile: DeserializeOwned {
    /// Reject values that deserialize but make no sense.
    fn validate(&self) -> Result<(), ConfigError> {
        Ok(())
    }

    /// Parse and validate from a TOML string.
    fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate from a JSON string.
    fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.toml` or `.json` file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_str(&content),
            Some("json") => Self::from_json_str(&content),
            other => Err(ConfigError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }
}

/// Configuration for the event bus
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventBusConfig {
    /// Name attached to log records of this bus.
    pub name: String,
    /// Handlers running longer than this are reported with a warning.
    pub slow_handler_threshold_ms: Option<u64>,
}

impl EventBusConfig {
    /// The slow handler threshold as a `Duration`
    pub fn slow_handler_threshold(&self) -> Option<Duration> {
        self.slow_handler_threshold_ms.map(Duration::from_millis)
    }
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            slow_handler_threshold_ms: None,
        }
    }
}

impl ConfigFile for EventBusConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::InvalidSetting {
                key: "name".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if self.slow_handler_threshold_ms == Some(0) {
            return Err(ConfigError::InvalidSetting {
                key: "slow_handler_threshold_ms".to_string(),
                reason: "must be positive, omit it to disable".to_string(),
            });
        }
        Ok(())
    }
}
