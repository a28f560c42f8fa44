//! # Event Bus Module
//!
//! In-process publish/subscribe with synchronous, priority-ordered dispatch.
//!
//! ## Overview
//!
//! - the registry holds the listeners of every event kind, plus an
//!   owner index for bulk removal
//! - the snapshot cache memoizes each kind's listeners sorted by priority and
//!   drops all of them whenever the registry changes
//! - [`EventBus::post`] walks one frozen snapshot on the calling thread,
//!   honouring cancellation and stop requests
//!
//! ## Usage
//!
//! ```rust
//! use evbus_core::{Event, EventBus, Priority};
//!
//! struct Saved {
//!     path: String,
//! }
//! impl Event for Saved {}
//!
//! let bus = EventBus::new();
//! let handle = bus.subscribe_with_priority(
//!     |event: &mut Saved| {
//!         println!("saved {}", event.path);
//!         Ok(())
//!     },
//!     Priority::HIGH,
//! );
//!
//! let event = bus.post(Saved { path: "notes.txt".into() }).expect("handlers succeed");
//! assert_eq!(event.path, "notes.txt");
//!
//! bus.unsubscribe(&handle);
//! ```

mod bus;
mod listener;
mod registry;
mod snapshot;

pub use bus::*;
pub use listener::{Listener, ListenerHandle, ListenerId, OwnerId};
