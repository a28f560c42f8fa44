//! Scoped subscriptions.
//!
//! An [`EventScope`] remembers every listener registered through it and
//! releases all of them together when closed or dropped.

use evbus_core::{event_bus, Event, EventBus, HandlerResult, ListenerHandle, Priority};

use crate::error::{ScopeError, ScopeResult};

/// A group of subscriptions released together
///
/// ```rust
/// use evbus_core::{Event, EventBus};
/// use evbus_extras::EventScope;
///
/// struct Frame;
/// impl Event for Frame {}
///
/// let bus = EventBus::new();
/// {
///     let mut scope = EventScope::new(&bus);
///     scope.on(|_: &mut Frame| {}).expect("scope is open");
///     assert!(bus.has_listeners::<Frame>());
/// }
/// assert!(!bus.has_listeners::<Frame>());
/// ```
pub struct EventScope<'bus> {
    bus: &'bus EventBus,
    handles: Vec<ListenerHandle>,
    closed: bool,
}

impl<'bus> EventScope<'bus> {
    /// Create a scope over `bus`
    pub fn new(bus: &'bus EventBus) -> Self {
        Self {
            bus,
            handles: Vec::new(),
            closed: false,
        }
    }

    /// Subscribe a fallible handler at [`Priority::NORMAL`]
    pub fn subscribe<E, F>(&mut self, handler: F) -> ScopeResult<ListenerHandle>
    where
        E: Event,
        F: Fn(&mut E) -> HandlerResult + Send + Sync + 'static,
    {
        self.subscribe_with_priority(handler, Priority::NORMAL)
    }

    /// Subscribe a fallible handler with an explicit priority
    pub fn subscribe_with_priority<E, F>(
        &mut self,
        handler: F,
        priority: i32,
    ) -> ScopeResult<ListenerHandle>
    where
        E: Event,
        F: Fn(&mut E) -> HandlerResult + Send + Sync + 'static,
    {
        self.ensure_open()?;
        let handle = self.bus.subscribe_with_priority(handler, priority);
        self.handles.push(handle.clone());
        Ok(handle)
    }

    /// Subscribe an infallible handler at [`Priority::NORMAL`]
    pub fn on<E, F>(&mut self, handler: F) -> ScopeResult<ListenerHandle>
    where
        E: Event,
        F: Fn(&mut E) + Send + Sync + 'static,
    {
        self.subscribe(move |event: &mut E| {
            handler(event);
            Ok(())
        })
    }

    /// Release one listener early
    pub fn unsubscribe(&mut self, handle: &ListenerHandle) -> ScopeResult<bool> {
        self.ensure_open()?;
        self.handles.retain(|h| h != handle);
        Ok(self.bus.unsubscribe(handle))
    }

    /// Release every listener of this scope
    ///
    /// Idempotent. Returns how many listeners were removed by this call.
    pub fn close(&mut self) -> usize {
        if self.closed {
            return 0;
        }
        self.closed = true;
        let bus = self.bus;
        let released = self
            .handles
            .drain(..)
            .filter(|handle| bus.unsubscribe(handle))
            .count();
        tracing::debug!(released, "Event scope closed");
        released
    }

    /// Number of listeners currently held
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn ensure_open(&self) -> ScopeResult<()> {
        if self.closed {
            Err(ScopeError::Closed)
        } else {
            Ok(())
        }
    }
}

impl EventScope<'static> {
    /// Create a scope over the process-wide bus
    pub fn global() -> Self {
        Self::new(event_bus())
    }
}

impl Drop for EventScope<'_> {
    fn drop(&mut self) {
        self.close();
    }
}
