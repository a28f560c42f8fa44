//! Priority-sorted snapshot cache.
//!
//! Snapshots are memoized per kind and invalidated coarsely: any registry
//! mutation sets a single dirty flag, and the next lookup drops the snapshots
//! of every kind before building the one it was asked for.
//!
//! The dirty flag is consumed and the requested snapshot rebuilt while the
//! cache write lock is held. Writers update the registry before raising the
//! flag, so a snapshot built from an outdated registry is always followed by a
//! raised flag and never outlives the next lookup.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use super::registry::Registry;
use crate::event::EventKind;
use crate::types::{empty_snapshot, thread_safe_rw_map, Snapshot, ThreadSafeRwMap};

pub(crate) struct SnapshotCache {
    snapshots: ThreadSafeRwMap<EventKind, Snapshot>,
    dirty: AtomicBool,
    rebuilds: AtomicU64,
}

impl SnapshotCache {
    pub(crate) fn new() -> Self {
        Self {
            snapshots: thread_safe_rw_map(),
            dirty: AtomicBool::new(false),
            rebuilds: AtomicU64::new(0),
        }
    }

    /// Mark every memoized snapshot stale.
    pub(crate) fn invalidate(&self) {
        self.dirty.store(true, Ordering::Release);
    }

    pub(crate) fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    /// Number of snapshots built since creation.
    pub(crate) fn rebuilds(&self) -> u64 {
        self.rebuilds.load(Ordering::Relaxed)
    }

    /// Sorted listeners for `kind`, building the snapshot if needed.
    pub(crate) fn sorted(&self, kind: EventKind, registry: &Registry) -> Snapshot {
        if !self.is_dirty() {
            if let Some(snapshot) = self.snapshots.read().get(&kind) {
                return snapshot.clone();
            }
        }

        let mut snapshots = self.snapshots.write();
        if self.dirty.swap(false, Ordering::AcqRel) {
            tracing::trace!(dropped = snapshots.len(), "Snapshot cache invalidated");
            snapshots.clear();
        }
        snapshots
            .entry(kind)
            .or_insert_with(|| self.build(kind, registry))
            .clone()
    }

    fn build(&self, kind: EventKind, registry: &Registry) -> Snapshot {
        self.rebuilds.fetch_add(1, Ordering::Relaxed);
        let Some(list) = registry.listeners(kind) else {
            return empty_snapshot();
        };

        let mut sorted: Vec<_> = list.iter().cloned().collect();
        // Stable: equal priorities keep registration order
        sorted.sort_by(|a, b| b.priority().cmp(&a.priority()));
        tracing::trace!(kind = %kind, listeners = sorted.len(), "Snapshot built");
        Arc::from(sorted)
    }

    pub(crate) fn clear(&self) {
        let mut snapshots = self.snapshots.write();
        snapshots.clear();
        self.dirty.store(false, Ordering::Release);
    }
}
