//! Error handling for evbus
//!
//! Provides the error types raised by the core:
//! - Dispatch errors (a handler failed while an event was posted)
//! - Configuration errors (loading or validating bus settings)
//!
//! All error types use `thiserror` for ergonomic error handling.

use crate::event_bus::{ListenerId, OwnerId};
use thiserror::Error;

/// Dispatch error type
///
/// Returned by [`EventBus::post`](crate::EventBus::post) when a listener
/// fails. Listeners after the failing one did not run.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// A handler returned an error
    #[error("Listener {listener} for {kind} failed: {source}")]
    Handler {
        /// Type name of the posted event.
        kind: &'static str,
        /// The listener whose handler failed.
        listener: ListenerId,
        /// Owner the listener was registered for, if any.
        owner: Option<OwnerId>,
        /// The error raised by the handler.
        #[source]
        source: anyhow::Error,
    },
}

impl DispatchError {
    /// The listener that raised the error
    pub fn listener(&self) -> ListenerId {
        match self {
            DispatchError::Handler { listener, .. } => *listener,
        }
    }

    /// The error returned by the handler itself
    pub fn cause(&self) -> &anyhow::Error {
        match self {
            DispatchError::Handler { source, .. } => source,
        }
    }
}

/// Configuration error type
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A configuration value is invalid
    #[error("Invalid setting '{key}': {reason}")]
    InvalidSetting {
        /// The offending key.
        key: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// TOML deserialization error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The configuration file format is not supported
    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),

    /// I/O error while reading a configuration file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Main error type for evbus
///
/// A unified error type that can represent any error raised by the core.
#[derive(Error, Debug)]
pub enum Error {
    /// Dispatch error
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a dispatch error
    pub fn is_dispatch_error(&self) -> bool {
        matches!(self, Error::Dispatch(_))
    }

    /// Check if this is a configuration error
    pub fn is_config_error(&self) -> bool {
        matches!(self, Error::Config(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
