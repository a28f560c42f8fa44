//! Listener records and the handles returned to subscribers.

use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use crate::event::{Event, EventKind};
use crate::types::{ErasedHandler, HandlerResult};

/// Unique identifier of one registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(Uuid);

impl ListenerId {
    /// Create a new unique listener ID
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Listener({})", &self.0.to_string()[..8])
    }
}

/// Opaque grouping key for bulk removal of listeners.
///
/// Either a fresh token from [`OwnerId::new`] or the identity of a shared
/// object from [`OwnerId::of`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OwnerId(OwnerRepr);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum OwnerRepr {
    Token(Uuid),
    Address(usize),
}

impl OwnerId {
    /// Create a fresh owner token
    pub fn new() -> Self {
        Self(OwnerRepr::Token(Uuid::new_v4()))
    }

    /// Owner keyed by the identity of the value behind `object`.
    ///
    /// Two clones of the same `Arc` map to the same owner. The key is only
    /// unique while the allocation is alive, so keep a clone around for as
    /// long as listeners are registered under it.
    pub fn of<T: ?Sized>(object: &Arc<T>) -> Self {
        Self(OwnerRepr::Address(Arc::as_ptr(object) as *const () as usize))
    }
}

impl Default for OwnerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            OwnerRepr::Token(id) => write!(f, "Owner({})", &id.to_string()[..8]),
            OwnerRepr::Address(addr) => write!(f, "Owner({:#x})", addr),
        }
    }
}

/// A registered binding of a handler to an event kind
pub struct Listener {
    id: ListenerId,
    kind: EventKind,
    priority: i32,
    owner: Option<OwnerId>,
    active: AtomicBool,
    handler: ErasedHandler,
}

impl Listener {
    pub(crate) fn new<E, F>(handler: F, priority: i32, owner: Option<OwnerId>) -> Self
    where
        E: Event,
        F: Fn(&mut E) -> HandlerResult + Send + Sync + 'static,
    {
        let erased: ErasedHandler = Box::new(move |event: &mut dyn Any| {
            match event.downcast_mut::<E>() {
                Some(event) => handler(event),
                // Registry is keyed by TypeId, a mismatch cannot reach here
                None => Ok(()),
            }
        });
        Self {
            id: ListenerId::new(),
            kind: EventKind::of::<E>(),
            priority,
            owner,
            active: AtomicBool::new(true),
            handler: erased,
        }
    }

    /// Run the handler against a type-erased event. Inactive listeners are skipped.
    pub(crate) fn invoke(&self, event: &mut dyn Any) -> HandlerResult {
        if self.is_active() {
            (self.handler)(event)
        } else {
            Ok(())
        }
    }

    pub fn id(&self) -> ListenerId {
        self.id
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn owner(&self) -> Option<OwnerId> {
        self.owner
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("priority", &self.priority)
            .field("owner", &self.owner)
            .field("active", &self.is_active())
            .finish()
    }
}

/// Handle for a registered listener, used to unsubscribe it.
///
/// Cloning the handle does not create a new registration.
#[derive(Clone)]
pub struct ListenerHandle(pub(crate) Arc<Listener>);

impl ListenerHandle {
    pub fn id(&self) -> ListenerId {
        self.0.id
    }

    pub fn kind(&self) -> EventKind {
        self.0.kind
    }

    pub fn priority(&self) -> i32 {
        self.0.priority
    }

    pub fn owner(&self) -> Option<OwnerId> {
        self.0.owner
    }

    pub fn is_active(&self) -> bool {
        self.0.is_active()
    }
}

impl PartialEq for ListenerHandle {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for ListenerHandle {}

impl fmt::Debug for ListenerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Display for ListenerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} on {} @{}", self.0.id, self.0.kind, self.0.priority)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    struct Tick(u32);
    impl Event for Tick {}

    #[test]
    fn test_listener_ids_are_unique() {
        assert_ne!(ListenerId::new(), ListenerId::new());
        assert!(ListenerId::new().to_string().starts_with("Listener("));
    }

    #[test]
    fn test_owner_of_shared_object() {
        let object = Arc::new(5u8);
        let clone = object.clone();
        assert_eq!(OwnerId::of(&object), OwnerId::of(&clone));
        assert_ne!(OwnerId::of(&object), OwnerId::of(&Arc::new(5u8)));
        assert_ne!(OwnerId::new(), OwnerId::new());
    }

    #[test]
    fn test_invoke_downcasts_event() {
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_clone = seen.clone();
        let listener = Listener::new(
            move |tick: &mut Tick| {
                seen_clone.store(tick.0 as usize, Ordering::SeqCst);
                tick.0 += 1;
                Ok(())
            },
            10,
            None,
        );

        let mut tick = Tick(7);
        listener.invoke(&mut tick).expect("handler succeeds");
        assert_eq!(seen.load(Ordering::SeqCst), 7);
        assert_eq!(tick.0, 8);
        assert!(listener.is_active());
        assert_eq!(listener.kind(), EventKind::of::<Tick>());
    }

    #[test]
    fn test_inactive_listener_is_skipped() {
        let listener = Listener::new(|_: &mut Tick| anyhow::bail!("should not run"), 0, None);
        listener.active.store(false, Ordering::Release);
        assert!(listener.invoke(&mut Tick(0)).is_ok());
    }
}
