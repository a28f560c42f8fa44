//! Owned references to an event bus.
//!
//! Handlers and background tasks outlive the call that created them, so they
//! need a `'static` way to reach a bus: either the process-wide instance or a
//! shared one.

use evbus_core::{event_bus, EventBus};
use std::sync::{Arc, Weak};

/// A bus that can be moved into handlers and timer tasks
#[derive(Debug, Clone, Default)]
pub enum SharedBus {
    /// The process-wide bus returned by [`event_bus()`].
    #[default]
    Global,
    /// An explicitly constructed bus.
    Instance(Arc<EventBus>),
}

impl SharedBus {
    /// Borrow the underlying bus
    pub fn get(&self) -> &EventBus {
        match self {
            SharedBus::Global => event_bus(),
            SharedBus::Instance(bus) => bus,
        }
    }

    /// A reference that does not keep an explicit bus alive
    pub(crate) fn downgrade(&self) -> WeakBus {
        match self {
            SharedBus::Global => WeakBus::Global,
            SharedBus::Instance(bus) => WeakBus::Instance(Arc::downgrade(bus)),
        }
    }
}

impl From<Arc<EventBus>> for SharedBus {
    fn from(bus: Arc<EventBus>) -> Self {
        SharedBus::Instance(bus)
    }
}

impl From<&Arc<EventBus>> for SharedBus {
    fn from(bus: &Arc<EventBus>) -> Self {
        SharedBus::Instance(bus.clone())
    }
}

/// Non-owning counterpart of [`SharedBus`], stored inside listeners so a bus
/// never keeps itself alive.
#[derive(Debug, Clone)]
pub(crate) enum WeakBus {
    Global,
    Instance(Weak<EventBus>),
}

impl WeakBus {
    pub(crate) fn upgrade(&self) -> Option<SharedBus> {
        match self {
            WeakBus::Global => Some(SharedBus::Global),
            WeakBus::Instance(bus) => bus.upgrade().map(SharedBus::Instance),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_resolves_to_process_bus() {
        assert!(std::ptr::eq(SharedBus::Global.get(), event_bus()));
    }

    #[test]
    fn test_weak_reference_expires() {
        let bus = Arc::new(EventBus::new());
        let weak = SharedBus::from(&bus).downgrade();
        assert!(weak.upgrade().is_some());

        drop(bus);
        assert!(weak.upgrade().is_none());
        assert!(WeakBus::Global.upgrade().is_some());
    }
}
