//! Type aliases for the shapes the bus passes around.
//!
//! ## Rationale
//!
//! Listener sequences and handler closures are nested `Arc`/`Box`/`dyn` types
//! that show up in the registry, the snapshot cache and the dispatcher. Naming
//! them once keeps those modules readable and lets the representation change
//! in one place.

use parking_lot::RwLock;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use crate::event_bus::Listener;

// =============================================================================
// HANDLER TYPES
// =============================================================================

/// What every handler returns. Errors abort the current post.
pub type HandlerResult = anyhow::Result<()>;

/// A handler with its event type erased, as stored in a [`Listener`].
pub type ErasedHandler = Box<dyn Fn(&mut dyn Any) -> HandlerResult + Send + Sync>;

// =============================================================================
// LISTENER COLLECTIONS
// =============================================================================

/// A copy-on-write listener sequence in registration order.
///
/// Writers replace the whole `Arc`; readers clone it and never see a list
/// being modified.
pub type ListenerList = Arc<Vec<Arc<Listener>>>;

/// A frozen, priority-sorted listener sequence handed to the dispatcher.
pub type Snapshot = Arc<[Arc<Listener>]>;

/// A reader-writer lock wrapper for read-heavy maps.
///
/// Uses `parking_lot::RwLock`, which never poisons.
pub type ThreadSafeRwMap<K, V> = RwLock<HashMap<K, V>>;

// =============================================================================
// CONSTRUCTOR HELPERS
// =============================================================================

/// Create a new empty `ThreadSafeRwMap<K, V>`.
#[inline]
pub fn thread_safe_rw_map<K, V>() -> ThreadSafeRwMap<K, V> {
    RwLock::new(HashMap::new())
}

/// Create an empty snapshot.
#[inline]
pub fn empty_snapshot() -> Snapshot {
    Arc::from(Vec::new())
}
