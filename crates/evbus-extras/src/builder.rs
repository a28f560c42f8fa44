//! Ad-hoc events without a dedicated type.

use std::any::Any;
use std::fmt;

use evbus_core::{CancelFlag, Cancellable, Event, StopFlag, Stoppable};

/// Fluent constructor for [`DynamicEvent`]
///
/// ```rust
/// use evbus_core::{EventBus, Stoppable};
/// use evbus_extras::{DynamicEvent, EventBuilder};
///
/// let bus = EventBus::new();
/// bus.on(|event: &mut DynamicEvent| {
///     if event.data::<u32>() == Some(&7) {
///         event.stop();
///     }
/// });
///
/// let event = EventBuilder::new().stoppable().with_data(7u32).build();
/// assert!(bus.post(event).expect("post succeeds").is_stopped());
/// ```
#[derive(Default)]
pub struct EventBuilder {
    cancellable: bool,
    stoppable: bool,
    data: Option<Box<dyn Any + Send>>,
}

impl EventBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expose the cancelled flag to the dispatcher
    pub fn cancellable(mut self) -> Self {
        self.cancellable = true;
        self
    }

    /// Expose the stopped flag to the dispatcher
    pub fn stoppable(mut self) -> Self {
        self.stoppable = true;
        self
    }

    /// Attach a payload, replacing any earlier one
    pub fn with_data<T: Any + Send>(mut self, data: T) -> Self {
        self.data = Some(Box::new(data));
        self
    }

    pub fn build(self) -> DynamicEvent {
        DynamicEvent {
            data: self.data,
            cancellable: self.cancellable,
            stoppable: self.stoppable,
            cancel: CancelFlag::default(),
            stop: StopFlag::default(),
        }
    }
}

/// Event assembled at runtime by [`EventBuilder`]
///
/// All dynamic events share one event kind. Cancellation and stopping are
/// only honoured when opted in at build time; otherwise the flags stay unset.
pub struct DynamicEvent {
    data: Option<Box<dyn Any + Send>>,
    cancellable: bool,
    stoppable: bool,
    cancel: CancelFlag,
    stop: StopFlag,
}

impl DynamicEvent {
    /// Borrow the payload if it is a `T`
    pub fn data<T: Any>(&self) -> Option<&T> {
        self.data.as_ref()?.downcast_ref()
    }

    pub fn data_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.data.as_mut()?.downcast_mut()
    }

    /// Take the payload out if it is a `T`
    pub fn take_data<T: Any>(&mut self) -> Option<T> {
        match self.data.take()?.downcast::<T>() {
            Ok(data) => Some(*data),
            Err(other) => {
                self.data = Some(other);
                None
            }
        }
    }

    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }

    pub fn is_cancellable(&self) -> bool {
        self.cancellable
    }

    pub fn is_stoppable(&self) -> bool {
        self.stoppable
    }
}

impl Event for DynamicEvent {
    fn as_cancellable(&self) -> Option<&dyn Cancellable> {
        self.cancellable.then_some(self as &dyn Cancellable)
    }

    fn as_stoppable(&self) -> Option<&dyn Stoppable> {
        self.stoppable.then_some(self as &dyn Stoppable)
    }
}

impl Cancellable for DynamicEvent {
    fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    fn set_cancelled(&mut self, cancelled: bool) {
        self.cancel.set_cancelled(self.cancellable && cancelled);
    }
}

impl Stoppable for DynamicEvent {
    fn stop(&mut self) {
        if self.stoppable {
            self.stop.stop();
        }
    }

    fn is_stopped(&self) -> bool {
        self.stop.is_stopped()
    }
}

impl fmt::Debug for DynamicEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicEvent")
            .field("has_data", &self.has_data())
            .field("cancellable", &self.cancellable)
            .field("stoppable", &self.stoppable)
            .field("cancelled", &self.cancel.is_cancelled())
            .field("stopped", &self.stop.is_stopped())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evbus_core::EventBus;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_plain_event_has_no_capabilities() {
        let mut event = EventBuilder::new().build();
        assert!(event.as_cancellable().is_none());
        assert!(event.as_stoppable().is_none());

        event.cancel();
        event.stop();
        assert!(!event.is_cancelled());
        assert!(!event.is_stopped());
    }

    #[test]
    fn test_capabilities_are_independent() {
        let event = EventBuilder::new().cancellable().build();
        assert!(event.as_cancellable().is_some());
        assert!(event.as_stoppable().is_none());

        let event = EventBuilder::new().stoppable().build();
        assert!(event.as_cancellable().is_none());
        assert!(event.as_stoppable().is_some());

        let event = EventBuilder::new().cancellable().stoppable().build();
        assert!(event.is_cancellable() && event.is_stoppable());
    }

    #[test]
    fn test_data_access() {
        let mut event = EventBuilder::new().with_data(String::from("payload")).build();
        assert_eq!(event.data::<String>().map(String::as_str), Some("payload"));
        assert!(event.data::<u32>().is_none());

        event.data_mut::<String>().expect("string payload").push('!');
        assert!(event.take_data::<u32>().is_none());
        assert!(event.has_data());
        assert_eq!(event.take_data::<String>().as_deref(), Some("payload!"));
        assert!(!event.has_data());
    }

    #[test]
    fn test_pre_cancelled_dynamic_event_is_skipped() {
        let bus = EventBus::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        bus.on(move |_: &mut DynamicEvent| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        let mut event = EventBuilder::new().cancellable().build();
        event.cancel();
        bus.post(event).expect("post succeeds");
        bus.post(EventBuilder::new().build()).expect("post succeeds");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
