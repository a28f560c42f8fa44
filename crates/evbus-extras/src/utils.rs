//! Shorthand subscriptions.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

use evbus_core::{event_bus, DispatchError, Event, EventBus, ListenerHandle, OwnerId, Priority};

use crate::scheduler::{EventScheduler, ScheduledTask};
use crate::shared::SharedBus;

/// Post `event` on the process-wide bus
pub fn fire<E: Event>(event: E) -> Result<E, DispatchError> {
    event_bus().post(event)
}

/// Run `handler` for the next `E` only, then unsubscribe it
///
/// The listener holds only a weak reference to an explicit bus.
pub fn once<E, F>(bus: impl Into<SharedBus>, handler: F) -> ListenerHandle
where
    E: Event,
    F: FnOnce(&mut E) + Send + 'static,
{
    let bus = bus.into();
    let weak = bus.downgrade();
    let owner = OwnerId::new();
    let pending = Mutex::new(Some(handler));

    bus.get().subscribe_owned(
        move |event: &mut E| {
            let Some(handler) = pending.lock().take() else {
                return Ok(());
            };
            // Detached before running so a panicking handler is not left behind
            if let Some(bus) = weak.upgrade() {
                bus.get().unsubscribe_owner(&owner);
            }
            handler(event);
            Ok(())
        },
        Priority::NORMAL,
        owner,
    )
}

/// Run `handler` only for events matching `condition`
pub fn when<E, P, F>(bus: &EventBus, condition: P, handler: F) -> ListenerHandle
where
    E: Event,
    P: Fn(&E) -> bool + Send + Sync + 'static,
    F: Fn(&mut E) + Send + Sync + 'static,
{
    bus.on(move |event: &mut E| {
        if condition(event) {
            handler(event);
        }
    })
}

/// Run `handler` at most once per `period`; events arriving in between are
/// ignored by this listener
pub fn throttle<E, F>(bus: &EventBus, period: Duration, handler: F) -> ListenerHandle
where
    E: Event,
    F: Fn(&mut E) + Send + Sync + 'static,
{
    let last: Mutex<Option<Instant>> = Mutex::new(None);
    bus.on(move |event: &mut E| {
        {
            let mut last = last.lock();
            let now = Instant::now();
            if last.is_some_and(|at| now.duration_since(at) < period) {
                return;
            }
            *last = Some(now);
        }
        handler(event);
    })
}

/// Run `handler` once activity settles
///
/// Every `E` posted on the scheduler's bus restarts a `delay` timer; when it
/// expires the handler receives a copy of the latest event on the
/// scheduler's thread. The listener does not keep the scheduler alive.
pub fn debounce<E, F>(
    scheduler: &Arc<EventScheduler>,
    delay: Duration,
    handler: F,
) -> ListenerHandle
where
    E: Event + Clone,
    F: Fn(&mut E) + Send + Sync + 'static,
{
    let weak = Arc::downgrade(scheduler);
    let handler = Arc::new(handler);
    let pending: Mutex<Option<ScheduledTask>> = Mutex::new(None);

    scheduler.bus().get().on(move |event: &mut E| {
        let Some(scheduler) = weak.upgrade() else {
            return;
        };
        let mut pending = pending.lock();
        if let Some(previous) = pending.take() {
            previous.cancel();
        }

        let handler = handler.clone();
        let mut latest = event.clone();
        match scheduler.run_after(delay, move || handler(&mut latest)) {
            Ok(task) => *pending = Some(task),
            Err(err) => tracing::warn!(error = %err, "Debounced handler not scheduled"),
        }
    })
}
