//! # evbus Core
//!
//! In-process event dispatch for evbus.
//! Provides the event contract, the listener registry with its sorted
//! snapshot cache, and the synchronous dispatcher.

pub mod config;
pub mod error;
pub mod event;
pub mod event_bus;
pub mod types;

pub use config::{ConfigFile, EventBusConfig};

pub use error::{ConfigError, DispatchError, Error, Result};

pub use event::{CancelFlag, Cancellable, Event, EventKind, Priority, StopFlag, Stoppable};

// Re-export event bus for convenience
pub use event_bus::{
    event_bus, init_event_bus, EventBus, Listener, ListenerHandle, ListenerId, OwnerId,
};

pub use types::HandlerResult;
