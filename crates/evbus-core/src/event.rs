//! Event contract inspected by the dispatcher.
//!
//! Any `'static + Send` type can be posted once it implements [`Event`]. Two
//! optional capabilities change how a post is walked:
//! - [`Cancellable`]: an event already cancelled when `post` is called reaches
//!   no listener at all.
//! - [`Stoppable`]: a listener calling [`Stoppable::stop`] prevents every later
//!   listener of the same post from running.
//!
//! The capabilities are orthogonal; an event may expose neither, either or both.

use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// A value that can be posted on an [`EventBus`](crate::EventBus).
///
/// Capabilities are surfaced through the two accessor methods so the
/// dispatcher can inspect a type-erased event without downcasting.
///
/// ```rust
/// use evbus_core::{Cancellable, Event};
///
/// struct Shutdown {
///     cancelled: bool,
/// }
///
/// impl Event for Shutdown {
///     fn as_cancellable(&self) -> Option<&dyn Cancellable> {
///         Some(self)
///     }
/// }
///
/// impl Cancellable for Shutdown {
///     fn is_cancelled(&self) -> bool {
///         self.cancelled
///     }
///
///     fn set_cancelled(&mut self, cancelled: bool) {
///         self.cancelled = cancelled;
///     }
/// }
/// ```
pub trait Event: Any + Send {
    /// The cancellable view of this event, if it has one.
    fn as_cancellable(&self) -> Option<&dyn Cancellable> {
        None
    }

    /// The stoppable view of this event, if it has one.
    fn as_stoppable(&self) -> Option<&dyn Stoppable> {
        None
    }
}

/// Event that can be suppressed before dispatch starts.
pub trait Cancellable {
    /// Whether the event is cancelled.
    fn is_cancelled(&self) -> bool;

    /// Set or clear the cancelled flag.
    fn set_cancelled(&mut self, cancelled: bool);

    /// Shorthand for `set_cancelled(true)`.
    fn cancel(&mut self) {
        self.set_cancelled(true);
    }
}

/// Event whose listener chain can be cut short from inside a listener.
pub trait Stoppable {
    /// Halt the remaining listeners of the current post.
    fn stop(&mut self);

    /// Whether [`stop`](Stoppable::stop) has been called.
    fn is_stopped(&self) -> bool;
}

/// Cancelled flag an event type can embed instead of hand-writing
/// [`Cancellable`].
///
/// Pair it with [`impl_event!`](crate::impl_event) to expose it to the
/// dispatcher.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CancelFlag(bool);

impl Cancellable for CancelFlag {
    fn is_cancelled(&self) -> bool {
        self.0
    }

    fn set_cancelled(&mut self, cancelled: bool) {
        self.0 = cancelled;
    }
}

/// Stopped flag an event type can embed instead of hand-writing
/// [`Stoppable`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StopFlag(bool);

impl Stoppable for StopFlag {
    fn stop(&mut self) {
        self.0 = true;
    }

    fn is_stopped(&self) -> bool {
        self.0
    }
}

/// Implement [`Event`] for a type, exposing embedded flag fields as its
/// capabilities
///
/// ```rust
/// use evbus_core::{impl_event, CancelFlag, Cancellable, Event, StopFlag, Stoppable};
///
/// #[derive(Default)]
/// struct Upload {
///     cancel: CancelFlag,
///     stop: StopFlag,
/// }
/// impl_event!(Upload, cancel = cancel, stop = stop);
///
/// struct Tick;
/// impl_event!(Tick);
///
/// let mut upload = Upload::default();
/// upload.cancel();
/// assert!(upload.as_cancellable().is_some_and(|c| c.is_cancelled()));
/// assert!(Tick.as_stoppable().is_none());
/// ```
#[macro_export]
macro_rules! impl_event {
    ($ty:ty) => {
        impl $crate::Event for $ty {}
    };
    ($ty:ty, cancel = $cancel:ident) => {
        impl $crate::Event for $ty {
            fn as_cancellable(&self) -> Option<&dyn $crate::Cancellable> {
                Some(self)
            }
        }
        $crate::impl_event!(@cancellable $ty, $cancel);
    };
    ($ty:ty, stop = $stop:ident) => {
        impl $crate::Event for $ty {
            fn as_stoppable(&self) -> Option<&dyn $crate::Stoppable> {
                Some(self)
            }
        }
        $crate::impl_event!(@stoppable $ty, $stop);
    };
    ($ty:ty, cancel = $cancel:ident, stop = $stop:ident) => {
        impl $crate::Event for $ty {
            fn as_cancellable(&self) -> Option<&dyn $crate::Cancellable> {
                Some(self)
            }

            fn as_stoppable(&self) -> Option<&dyn $crate::Stoppable> {
                Some(self)
            }
        }
        $crate::impl_event!(@cancellable $ty, $cancel);
        $crate::impl_event!(@stoppable $ty, $stop);
    };
    (@cancellable $ty:ty, $field:ident) => {
        impl $crate::Cancellable for $ty {
            fn is_cancelled(&self) -> bool {
                $crate::Cancellable::is_cancelled(&self.$field)
            }

            fn set_cancelled(&mut self, cancelled: bool) {
                $crate::Cancellable::set_cancelled(&mut self.$field, cancelled);
            }
        }
    };
    (@stoppable $ty:ty, $field:ident) => {
        impl $crate::Stoppable for $ty {
            fn stop(&mut self) {
                $crate::Stoppable::stop(&mut self.$field);
            }

            fn is_stopped(&self) -> bool {
                $crate::Stoppable::is_stopped(&self.$field)
            }
        }
    };
}

/// Stable identifier of an event type, used as the registry key.
///
/// Equality and hashing use the [`TypeId`] only; the name is carried for logs
/// and error messages.
#[derive(Clone, Copy)]
pub struct EventKind {
    id: TypeId,
    name: &'static str,
}

impl EventKind {
    /// Kind of the event type `E`.
    pub fn of<E: Event>() -> Self {
        Self {
            id: TypeId::of::<E>(),
            name: type_name::<E>(),
        }
    }

    /// Fully qualified type name of the kind.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type name without its module path.
    pub fn short_name(&self) -> &'static str {
        let base = self.name.split('<').next().unwrap_or(self.name);
        match base.rfind("::") {
            Some(idx) => &self.name[idx + 2..],
            None => self.name,
        }
    }
}

impl PartialEq for EventKind {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EventKind {}

impl Hash for EventKind {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EventKind").field(&self.name).finish()
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// Conventional priority bands. Any `i32` is accepted; higher runs first.
pub struct Priority;

impl Priority {
    pub const HIGHEST: i32 = 100;
    pub const HIGH: i32 = 75;
    pub const NORMAL: i32 = 50;
    pub const LOW: i32 = 25;
    pub const LOWEST: i32 = 0;
}
