//! Lazy, single-use processing chains for one event.

use evbus_core::{DispatchError, Event, EventBus};

/// A chain of stages applied to one value when executed
///
/// Stages run in the order they were added, only once [`execute`] or
/// [`post`] is called. A failing filter ends the chain and every later
/// stage is skipped.
///
/// ```rust
/// use evbus_extras::EventPipeline;
///
/// let length = EventPipeline::of(String::from("saved"))
///     .filter(|s| !s.is_empty())
///     .map(|s| s.to_uppercase())
///     .transform(|s| s.len())
///     .execute();
/// assert_eq!(length, Some(5));
/// ```
///
/// [`execute`]: EventPipeline::execute
/// [`post`]: EventPipeline::post
pub struct EventPipeline<'a, T> {
    run: Box<dyn FnOnce() -> Option<T> + 'a>,
}

impl<'a, T: 'a> EventPipeline<'a, T> {
    /// Start a pipeline over `event`
    pub fn of(event: T) -> Self {
        Self {
            run: Box::new(move || Some(event)),
        }
    }

    fn then<R: 'a>(self, stage: impl FnOnce(T) -> Option<R> + 'a) -> EventPipeline<'a, R> {
        let run = self.run;
        EventPipeline {
            run: Box::new(move || run().and_then(stage)),
        }
    }

    /// Keep the value only if `predicate` holds
    pub fn filter(self, predicate: impl FnOnce(&T) -> bool + 'a) -> Self {
        self.then(move |event| predicate(&event).then_some(event))
    }

    /// Replace the value with `mapper`'s result
    pub fn map(self, mapper: impl FnOnce(T) -> T + 'a) -> Self {
        self.then(move |event| Some(mapper(event)))
    }

    /// Observe the value without changing it
    pub fn peek(self, observer: impl FnOnce(&T) + 'a) -> Self {
        self.then(move |event| {
            observer(&event);
            Some(event)
        })
    }

    /// Convert the value into another type
    pub fn transform<R: 'a>(self, transformer: impl FnOnce(T) -> R + 'a) -> EventPipeline<'a, R> {
        self.then(move |event| Some(transformer(event)))
    }

    /// Run every stage; `None` if a filter rejected the value
    pub fn execute(self) -> Option<T> {
        (self.run)()
    }
}

impl<'a, T: Event> EventPipeline<'a, T> {
    /// Run every stage and post the surviving value on `bus`
    pub fn post(self, bus: &EventBus) -> Result<Option<T>, DispatchError> {
        self.execute().map(|event| bus.post(event)).transpose()
    }
}
