//! Persisted scene metadata seam.
//!
//! The synchronizer reads the saved event list once at construction and
//! writes it back after recalculation passes that changed something. The
//! store stamps every stored list with a fresh [`Revision`]; change
//! notifications carry that revision so the synchronizer can recognize
//! its own writes coming back.

use std::collections::VecDeque;

use timesync_types::{Revision, SavedSnapshot, SavedTimeEvent};
use tracing::debug;

/// Storage for the persisted time events of one scene.
pub trait MetaStore {
    /// Return the stored snapshot.
    fn get(&self) -> SavedSnapshot;

    /// Replace the stored events. Returns the revision assigned to them.
    fn set(&mut self, events: Vec<SavedTimeEvent>) -> Revision;
}

/// An in-memory [`MetaStore`] with a queue of change notifications.
///
/// Both writes through [`MetaStore::set`] and external edits through
/// [`MemoryMetaStore::edit`] enqueue the resulting snapshot, the way a
/// file-backed store would notify after every change on disk.
#[derive(Debug, Clone, Default)]
pub struct MemoryMetaStore {
    snapshot: SavedSnapshot,
    writes: u64,
    changes: VecDeque<SavedSnapshot>,
}

impl MemoryMetaStore {
    /// Create an empty store at [`Revision::INITIAL`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `events` (e.g. read from a file).
    pub fn with_events(events: Vec<SavedTimeEvent>) -> Self {
        Self {
            snapshot: SavedSnapshot::new(Revision::INITIAL.next(), events),
            writes: 0,
            changes: VecDeque::new(),
        }
    }

    /// Apply an edit that did not come from the synchronizer.
    ///
    /// Returns the new snapshot, which is also queued as a change.
    pub fn edit(&mut self, events: Vec<SavedTimeEvent>) -> SavedSnapshot {
        self.store(events);
        self.snapshot.clone()
    }

    /// Number of writes made through [`MetaStore::set`].
    pub const fn writes(&self) -> u64 {
        self.writes
    }

    /// Take the oldest pending change notification.
    pub fn next_change(&mut self) -> Option<SavedSnapshot> {
        self.changes.pop_front()
    }

    /// Take every pending change notification, oldest first.
    pub fn drain_changes(&mut self) -> Vec<SavedSnapshot> {
        self.changes.drain(..).collect()
    }

    fn store(&mut self, events: Vec<SavedTimeEvent>) -> Revision {
        let revision = self.snapshot.revision.next();
        self.snapshot = SavedSnapshot::new(revision, events);
        self.changes.push_back(self.snapshot.clone());
        debug!(%revision, events = self.snapshot.len(), "Metadata stored");
        revision
    }
}

impl MetaStore for MemoryMetaStore {
    fn get(&self) -> SavedSnapshot {
        self.snapshot.clone()
    }

    fn set(&mut self, events: Vec<SavedTimeEvent>) -> Revision {
        self.writes = self.writes.saturating_add(1);
        self.store(events)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn empty_store_is_at_initial_revision() {
        let store = MemoryMetaStore::new();
        let snapshot = store.get();
        assert_eq!(snapshot.revision, Revision::INITIAL);
        assert!(snapshot.is_empty());
    }

    #[test]
    fn set_assigns_increasing_revisions() {
        let mut store = MemoryMetaStore::new();
        let first = store.set(vec![SavedTimeEvent::new("a", 1.0)]);
        let second = store.set(vec![SavedTimeEvent::new("a", 2.0)]);
        assert!(second > first);
        assert_eq!(store.get().revision, second);
        assert_eq!(store.writes(), 2);
    }

    #[test]
    fn set_and_edit_both_notify() {
        let mut store = MemoryMetaStore::new();
        let written = store.set(vec![SavedTimeEvent::new("a", 1.0)]);
        let edited = store.edit(vec![SavedTimeEvent::new("a", 3.0)]);

        let changes = store.drain_changes();
        assert_eq!(changes.len(), 2);
        assert_eq!(changes.first().unwrap().revision, written);
        assert_eq!(changes.get(1).unwrap(), &edited);
        assert!(store.next_change().is_none());
    }

    #[test]
    fn edits_are_not_counted_as_writes() {
        let mut store = MemoryMetaStore::with_events(vec![SavedTimeEvent::new("a", 1.0)]);
        let edited = store.edit(Vec::new());
        assert_eq!(store.writes(), 0);
        assert_eq!(edited.revision, Revision(2));
    }
}
