//! Declarative handler registration.
//!
//! A type lists its handlers once in [`Subscriber::register`]; [`register`]
//! binds them to a shared instance under one owner, and [`unregister`]
//! removes all of them again.
//!
//! ```rust
//! use std::sync::Arc;
//! use evbus_core::{Event, EventBus, HandlerResult, Priority};
//! use evbus_extras::{register, unregister, Registrar, Subscriber};
//!
//! struct Saved;
//! impl Event for Saved {}
//!
//! struct Indexer;
//!
//! impl Indexer {
//!     fn on_saved(&self, _event: &mut Saved) -> HandlerResult {
//!         Ok(())
//!     }
//! }
//!
//! impl Subscriber for Indexer {
//!     fn register(registrar: &mut Registrar<'_, Self>) {
//!         registrar.on("on_saved", Priority::HIGH, Self::on_saved);
//!     }
//! }
//!
//! let bus = EventBus::new();
//! let indexer = Arc::new(Indexer);
//! register(&bus, &indexer);
//! assert!(bus.has_listeners::<Saved>());
//!
//! unregister(&bus, &indexer);
//! assert!(!bus.has_listeners::<Saved>());
//! ```

use anyhow::Context;
use evbus_core::{Event, EventBus, HandlerResult, ListenerHandle, OwnerId};
use std::any::type_name;
use std::sync::Arc;

/// A type that declares its own event handlers
pub trait Subscriber: Send + Sync + Sized + 'static {
    /// Declare every handler of this type on `registrar`.
    fn register(registrar: &mut Registrar<'_, Self>);
}

/// Collects the handlers a [`Subscriber`] declares and binds them to the bus
pub struct Registrar<'a, S> {
    bus: &'a EventBus,
    target: &'a Arc<S>,
    owner: OwnerId,
    handles: Vec<ListenerHandle>,
}

impl<'a, S: Subscriber> Registrar<'a, S> {
    fn new(bus: &'a EventBus, target: &'a Arc<S>) -> Self {
        Self {
            bus,
            target,
            owner: OwnerId::of(target),
            handles: Vec::new(),
        }
    }

    /// Bind `handler` for events of type `E`
    ///
    /// `method` names the handler in error messages.
    pub fn on<E: Event>(
        &mut self,
        method: &'static str,
        priority: i32,
        handler: fn(&S, &mut E) -> HandlerResult,
    ) -> &mut Self {
        let target = self.target.clone();
        let handle = self.bus.subscribe_owned(
            move |event: &mut E| {
                handler(&target, event).with_context(|| {
                    format!(
                        "failed to invoke event handler {} in {}",
                        method,
                        type_name::<S>()
                    )
                })
            },
            priority,
            self.owner,
        );
        self.handles.push(handle);
        self
    }

    /// Owner the handlers are registered under
    pub fn owner(&self) -> OwnerId {
        self.owner
    }
}

/// Register every handler `subscriber` declares
///
/// Returns the owner under which they were registered, which is the identity
/// of `subscriber` itself.
pub fn register<S: Subscriber>(bus: &EventBus, subscriber: &Arc<S>) -> OwnerId {
    let mut registrar = Registrar::new(bus, subscriber);
    S::register(&mut registrar);
    tracing::debug!(
        subscriber = type_name::<S>(),
        owner = %registrar.owner,
        handlers = registrar.handles.len(),
        "Subscriber registered"
    );
    registrar.owner
}

/// Remove every handler registered for `subscriber`
///
/// Returns how many listeners were removed.
pub fn unregister<S: Subscriber>(bus: &EventBus, subscriber: &Arc<S>) -> usize {
    bus.unsubscribe_owner(&OwnerId::of(subscriber))
}
