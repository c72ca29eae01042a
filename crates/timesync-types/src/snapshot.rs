//! Revision-stamped snapshots of persisted time events.
//!
//! The metadata store hands out a [`SavedSnapshot`] for everything it
//! holds. Each stored write gets a fresh [`Revision`], so a reader can tell
//! its own write apart from an external edit by comparing revisions rather
//! than object identity.
//!
//! The on-disk record list is a JSON array of `{name, targetTime}` objects
//! with no version or checksum. The revision is store metadata and never
//! appears in it.

use serde::{Deserialize, Serialize};

use crate::event::SavedTimeEvent;

/// Errors that can occur when decoding or encoding a record list.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// The JSON content is malformed or does not match the record schema.
    #[error("invalid time event records: {source}")]
    Json {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },
}

/// Monotonic revision assigned by the metadata store to each stored snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Revision(pub u64);

impl Revision {
    /// Revision of a store that has never been written.
    pub const INITIAL: Self = Self(0);

    /// Return the revision that follows this one.
    ///
    /// Saturates at `u64::MAX`.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl core::fmt::Display for Revision {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// The persisted event list together with the revision that stored it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SavedSnapshot {
    /// Revision under which the store holds this list.
    pub revision: Revision,
    /// Persisted events in registration order.
    pub events: Vec<SavedTimeEvent>,
}

impl SavedSnapshot {
    /// Create a snapshot from a revision and its events.
    pub const fn new(revision: Revision, events: Vec<SavedTimeEvent>) -> Self {
        Self { revision, events }
    }

    /// Number of persisted events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the snapshot holds no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Encode a record list into its JSON array form.
///
/// # Errors
///
/// Returns [`SnapshotError::Json`] if serialization fails.
pub fn encode_events(events: &[SavedTimeEvent]) -> Result<String, SnapshotError> {
    Ok(serde_json::to_string(events)?)
}

/// Decode a record list from its JSON array form.
///
/// # Errors
///
/// Returns [`SnapshotError::Json`] if the content is not an array of
/// `{name, targetTime}` records.
pub fn decode_events(json: &str) -> Result<Vec<SavedTimeEvent>, SnapshotError> {
    Ok(serde_json::from_str(json)?)
}
