//! Event Bus implementation.
//!
//! Provides the core EventBus struct and the global instance for
//! process-wide event distribution.

use std::sync::{Arc, OnceLock};
use std::time::Instant;

use super::listener::{Listener, ListenerHandle, OwnerId};
use super::registry::{Registry, Removal};
use super::snapshot::SnapshotCache;
use crate::config::EventBusConfig;
use crate::error::DispatchError;
use crate::event::{Event, EventKind, Priority};
use crate::types::HandlerResult;

/// Synchronous, priority-ordered event bus
///
/// Owns a listener registry and a snapshot cache. Instances share no state;
/// use [`event_bus()`] for the process-wide default.
pub struct EventBus {
    registry: Registry,
    cache: SnapshotCache,
    config: EventBusConfig,
}

impl EventBus {
    /// Create a new event bus with default configuration
    pub fn new() -> Self {
        Self::with_config(EventBusConfig::default())
    }

    /// Create a new event bus with custom configuration
    pub fn with_config(config: EventBusConfig) -> Self {
        Self {
            registry: Registry::new(),
            cache: SnapshotCache::new(),
            config,
        }
    }

    /// Subscribe a fallible handler at [`Priority::NORMAL`]
    pub fn subscribe<E, F>(&self, handler: F) -> ListenerHandle
    where
        E: Event,
        F: Fn(&mut E) -> HandlerResult + Send + Sync + 'static,
    {
        self.register(Listener::new(handler, Priority::NORMAL, None))
    }

    /// Subscribe a fallible handler with an explicit priority
    pub fn subscribe_with_priority<E, F>(&self, handler: F, priority: i32) -> ListenerHandle
    where
        E: Event,
        F: Fn(&mut E) -> HandlerResult + Send + Sync + 'static,
    {
        self.register(Listener::new(handler, priority, None))
    }

    /// Subscribe a fallible handler on behalf of `owner`
    ///
    /// Everything registered for one owner can be removed at once with
    /// [`unsubscribe_owner`](Self::unsubscribe_owner).
    pub fn subscribe_owned<E, F>(&self, handler: F, priority: i32, owner: OwnerId) -> ListenerHandle
    where
        E: Event,
        F: Fn(&mut E) -> HandlerResult + Send + Sync + 'static,
    {
        self.register(Listener::new(handler, priority, Some(owner)))
    }

    /// Subscribe an infallible handler at [`Priority::NORMAL`]
    pub fn on<E, F>(&self, handler: F) -> ListenerHandle
    where
        E: Event,
        F: Fn(&mut E) + Send + Sync + 'static,
    {
        self.subscribe(move |event: &mut E| {
            handler(event);
            Ok(())
        })
    }

    fn register(&self, listener: Listener) -> ListenerHandle {
        let listener = Arc::new(listener);
        self.registry.insert(listener.clone());
        self.cache.invalidate();
        tracing::debug!(
            bus = %self.config.name,
            listener = %listener.id(),
            kind = %listener.kind(),
            priority = listener.priority(),
            "Listener subscribed"
        );
        ListenerHandle(listener)
    }

    /// Unsubscribe a single listener
    ///
    /// Returns true if the listener was found and removed. The snapshot cache
    /// is invalidated whenever the listener's kind is still registered, even
    /// if this listener was already gone.
    pub fn unsubscribe(&self, handle: &ListenerHandle) -> bool {
        let removal = self.registry.remove(&handle.0);
        if removal != Removal::UnknownKind {
            self.cache.invalidate();
        }
        let removed = removal == Removal::Removed;
        if removed {
            tracing::debug!(bus = %self.config.name, listener = %handle.id(), "Listener removed");
        }
        removed
    }

    /// Unsubscribe every listener registered for `owner`
    ///
    /// Returns the number of listeners removed.
    pub fn unsubscribe_owner(&self, owner: &OwnerId) -> usize {
        let removed = self.registry.remove_owner(owner);
        if removed > 0 {
            self.cache.invalidate();
            tracing::debug!(bus = %self.config.name, %owner, removed, "Owner unsubscribed");
        }
        removed
    }

    /// Post an event to its listeners
    ///
    /// Listeners run on the calling thread, highest priority first. An event
    /// that is already cancelled reaches no listener. Cancelling it from a
    /// listener does not affect the rest of this post; stopping it does. The
    /// first handler error aborts the walk and is returned.
    pub fn post<E: Event>(&self, mut event: E) -> Result<E, DispatchError> {
        let kind = EventKind::of::<E>();
        let listeners = self.cache.sorted(kind, &self.registry);
        let cancelled = event
            .as_cancellable()
            .is_some_and(|cancellable| cancellable.is_cancelled());

        tracing::trace!(
            bus = %self.config.name,
            %kind,
            listeners = listeners.len(),
            cancelled,
            "Posting event"
        );

        for listener in listeners.iter() {
            // Captured once before the walk, never re-read
            if cancelled {
                break;
            }

            self.invoke(kind, listener, &mut event)?;

            if event
                .as_stoppable()
                .is_some_and(|stoppable| stoppable.is_stopped())
            {
                tracing::trace!(%kind, listener = %listener.id(), "Dispatch stopped");
                break;
            }
        }

        Ok(event)
    }

    fn invoke<E: Event>(
        &self,
        kind: EventKind,
        listener: &Listener,
        event: &mut E,
    ) -> Result<(), DispatchError> {
        let timing = self
            .config
            .slow_handler_threshold()
            .map(|threshold| (Instant::now(), threshold));

        let result = listener.invoke(event);

        if let Some((started, threshold)) = timing {
            let elapsed = started.elapsed();
            if elapsed > threshold {
                tracing::warn!(
                    bus = %self.config.name,
                    %kind,
                    listener = %listener.id(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Slow event handler"
                );
            }
        }

        result.map_err(|source| {
            tracing::debug!(%kind, listener = %listener.id(), error = %source, "Handler failed");
            DispatchError::Handler {
                kind: kind.name(),
                listener: listener.id(),
                owner: listener.owner(),
                source,
            }
        })
    }

    /// Check whether any listener is registered for `E`
    pub fn has_listeners<E: Event>(&self) -> bool {
        self.has_listeners_of(EventKind::of::<E>())
    }

    /// Check whether any listener is registered for `kind`
    pub fn has_listeners_of(&self, kind: EventKind) -> bool {
        self.registry.has_listeners(kind)
    }

    /// Get the number of registered listeners across all kinds
    pub fn listener_count(&self) -> usize {
        self.registry.len()
    }

    /// Get the event kinds that currently have listeners
    pub fn kinds(&self) -> Vec<EventKind> {
        self.registry.kinds()
    }

    /// Drop every registration and cached snapshot
    pub fn clear(&self) {
        self.registry.clear();
        self.cache.clear();
        tracing::debug!(bus = %self.config.name, "Event bus cleared");
    }

    /// Number of sorted snapshots built since the bus was created
    pub fn snapshot_rebuilds(&self) -> u64 {
        self.cache.rebuilds()
    }

    /// Get the current configuration
    pub fn config(&self) -> &EventBusConfig {
        &self.config
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listener_count())
            .field("owners", &self.registry.owner_count())
            .field("snapshot_rebuilds", &self.snapshot_rebuilds())
            .field("config", &self.config)
            .finish()
    }
}

/// Global event bus instance
static EVENT_BUS: OnceLock<EventBus> = OnceLock::new();

/// Get or initialize the global event bus
///
/// Initialized on first access, reset only through [`EventBus::clear`], never
/// torn down.
pub fn event_bus() -> &'static EventBus {
    EVENT_BUS.get_or_init(EventBus::new)
}

/// Initialize the global event bus with custom configuration
///
/// Must be called before any calls to `event_bus()`. Returns the rejected
/// configuration if the event bus has already been initialized.
pub fn init_event_bus(config: EventBusConfig) -> Result<(), EventBusConfig> {
    EVENT_BUS
        .set(EventBus::with_config(config))
        .map_err(|bus| bus.config.clone())
}

/// Convenience macro to post an event on the global event bus
#[macro_export]
macro_rules! emit {
    ($event:expr) => {
        $crate::event_bus::event_bus().post($event)
    };
}

/// Convenience macro to subscribe an infallible handler on the global event bus
#[macro_export]
macro_rules! on_event {
    ($handler:expr) => {
        $crate::event_bus::event_bus().on($handler)
    };
}
