//! Listener registry.
//!
//! Source of truth for which listeners exist: per-kind sequences in
//! registration order plus an owner index for bulk removal. Per-kind
//! sequences are copy-on-write, so a reader holding a [`ListenerList`] keeps a
//! consistent view while writers move on.

use std::collections::HashMap;
use std::sync::Arc;

use super::listener::{Listener, OwnerId};
use crate::event::EventKind;
use crate::types::ListenerList;
use parking_lot::RwLock;

#[derive(Default)]
struct RegistryState {
    by_kind: HashMap<EventKind, ListenerList>,
    by_owner: HashMap<OwnerId, Vec<Arc<Listener>>>,
}

/// Outcome of [`Registry::remove`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Removal {
    /// No sequence exists for the listener's kind.
    UnknownKind,
    /// The kind has a sequence but the listener is not in it.
    Absent,
    Removed,
}

pub(crate) struct Registry {
    state: RwLock<RegistryState>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self {
            state: RwLock::new(RegistryState::default()),
        }
    }

    /// Append a listener to its kind and, if owned, to its owner.
    pub(crate) fn insert(&self, listener: Arc<Listener>) {
        let mut state = self.state.write();
        if let Some(owner) = listener.owner() {
            state
                .by_owner
                .entry(owner)
                .or_default()
                .push(listener.clone());
        }
        let list = state.by_kind.entry(listener.kind()).or_default();
        Arc::make_mut(list).push(listener);
    }

    /// Remove one listener.
    pub(crate) fn remove(&self, listener: &Listener) -> Removal {
        let mut state = self.state.write();
        if !state.by_kind.contains_key(&listener.kind()) {
            return Removal::UnknownKind;
        }
        let removed = Self::detach(&mut state.by_kind, listener);

        if let Some(owner) = listener.owner() {
            if let Some(owned) = state.by_owner.get_mut(&owner) {
                owned.retain(|l| l.id() != listener.id());
                if owned.is_empty() {
                    state.by_owner.remove(&owner);
                }
            }
        }
        if removed {
            Removal::Removed
        } else {
            Removal::Absent
        }
    }

    /// Remove every listener registered for `owner`. Returns how many were removed.
    pub(crate) fn remove_owner(&self, owner: &OwnerId) -> usize {
        let mut state = self.state.write();
        let Some(owned) = state.by_owner.remove(owner) else {
            return 0;
        };
        for listener in &owned {
            Self::detach(&mut state.by_kind, listener);
        }
        owned.len()
    }

    fn detach(by_kind: &mut HashMap<EventKind, ListenerList>, listener: &Listener) -> bool {
        let Some(list) = by_kind.get_mut(&listener.kind()) else {
            return false;
        };
        let Some(pos) = list.iter().position(|l| l.id() == listener.id()) else {
            return false;
        };
        // Emptied sequences stay, so the kind keeps counting as known
        Arc::make_mut(list).remove(pos);
        true
    }

    /// Current sequence for `kind`, in registration order.
    pub(crate) fn listeners(&self, kind: EventKind) -> Option<ListenerList> {
        self.state.read().by_kind.get(&kind).cloned()
    }

    pub(crate) fn has_listeners(&self, kind: EventKind) -> bool {
        self.state
            .read()
            .by_kind
            .get(&kind)
            .is_some_and(|list| !list.is_empty())
    }

    pub(crate) fn len(&self) -> usize {
        self.state.read().by_kind.values().map(|list| list.len()).sum()
    }

    pub(crate) fn owner_count(&self) -> usize {
        self.state.read().by_owner.len()
    }

    /// Kinds currently holding listeners.
    pub(crate) fn kinds(&self) -> Vec<EventKind> {
        self.state
            .read()
            .by_kind
            .iter()
            .filter(|(_, list)| !list.is_empty())
            .map(|(kind, _)| *kind)
            .collect()
    }

    pub(crate) fn clear(&self) {
        let mut state = self.state.write();
        state.by_kind.clear();
        state.by_owner.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Event;

    struct Alpha;
    impl Event for Alpha {}

    struct Beta;
    impl Event for Beta {}

    fn listener<E: Event>(priority: i32, owner: Option<OwnerId>) -> Arc<Listener> {
        Arc::new(Listener::new(|_: &mut E| Ok(()), priority, owner))
    }

    #[test]
    fn test_insert_preserves_registration_order() {
        let registry = Registry::new();
        let first = listener::<Alpha>(10, None);
        let second = listener::<Alpha>(90, None);
        registry.insert(first.clone());
        registry.insert(second.clone());

        let list = registry
            .listeners(EventKind::of::<Alpha>())
            .expect("kind registered");
        let ids: Vec<_> = list.iter().map(|l| l.id()).collect();
        assert_eq!(ids, vec![first.id(), second.id()]);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_reader_keeps_its_copy() {
        let registry = Registry::new();
        registry.insert(listener::<Alpha>(0, None));
        let before = registry
            .listeners(EventKind::of::<Alpha>())
            .expect("kind registered");

        registry.insert(listener::<Alpha>(0, None));
        assert_eq!(before.len(), 1);
        assert_eq!(
            registry
                .listeners(EventKind::of::<Alpha>())
                .map(|l| l.len()),
            Some(2)
        );
    }

    #[test]
    fn test_remove_single() {
        let registry = Registry::new();
        let owner = OwnerId::new();
        let kept = listener::<Alpha>(0, Some(owner));
        let dropped = listener::<Alpha>(0, Some(owner));
        registry.insert(kept.clone());
        registry.insert(dropped.clone());

        assert_eq!(registry.remove(&dropped), Removal::Removed);
        assert_eq!(registry.remove(&dropped), Removal::Absent);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.owner_count(), 1);

        assert_eq!(registry.remove(&kept), Removal::Removed);
        assert!(!registry.has_listeners(EventKind::of::<Alpha>()));
        assert_eq!(registry.owner_count(), 0);
        assert_eq!(registry.remove(&kept), Removal::Absent);
        assert!(registry.kinds().is_empty());

        let fresh = Registry::new();
        assert_eq!(fresh.remove(&kept), Removal::UnknownKind);
    }

    #[test]
    fn test_remove_owner_across_kinds() {
        let registry = Registry::new();
        let owner = OwnerId::new();
        registry.insert(listener::<Alpha>(0, Some(owner)));
        registry.insert(listener::<Beta>(0, Some(owner)));
        registry.insert(listener::<Beta>(0, None));

        assert_eq!(registry.remove_owner(&owner), 2);
        assert!(!registry.has_listeners(EventKind::of::<Alpha>()));
        assert!(registry.has_listeners(EventKind::of::<Beta>()));
        assert_eq!(registry.remove_owner(&owner), 0);
    }

    #[test]
    fn test_clear_and_kinds() {
        let registry = Registry::new();
        registry.insert(listener::<Alpha>(0, None));
        registry.insert(listener::<Beta>(0, Some(OwnerId::new())));
        assert_eq!(registry.kinds().len(), 2);

        registry.clear();
        assert_eq!(registry.len(), 0);
        assert_eq!(registry.owner_count(), 0);
        assert!(registry.kinds().is_empty());
    }
}
