//! Per-pass bookkeeping shared by both synchronizers.
//!
//! A pass registers each event name at most once. [`PassLedger`] tracks
//! the names claimed so far and the records resolved for them, in
//! registration order. A reload clears both; a reset clears only the
//! claimed names.

use std::collections::BTreeSet;
use std::panic::Location;

use indexmap::IndexMap;
use timesync_types::TimeEvent;

/// Errors that can occur while registering an event.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegisterError {
    /// The name was already registered during the current pass.
    #[error("name \"{name}\" has already been used for another event name")]
    Duplicate {
        /// The duplicated event name.
        name: String,
        /// Call site of the rejected registration (`file:line:column`).
        location: String,
    },
}

impl RegisterError {
    /// Call site of the rejected registration.
    pub fn location(&self) -> &str {
        match self {
            Self::Duplicate { location, .. } => location,
        }
    }
}

/// Names claimed and records resolved during the current pass.
#[derive(Debug, Clone, Default)]
pub struct PassLedger {
    claimed: BTreeSet<String>,
    registered: IndexMap<String, TimeEvent>,
}

impl PassLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `name` for this pass.
    ///
    /// # Errors
    ///
    /// Returns [`RegisterError::Duplicate`] if the name was already claimed
    /// since the last reload or reset.
    pub fn claim(&mut self, name: &str, location: &Location<'_>) -> Result<(), RegisterError> {
        if self.claimed.contains(name) {
            return Err(RegisterError::Duplicate {
                name: name.to_owned(),
                location: location.to_string(),
            });
        }
        self.claimed.insert(name.to_owned());
        Ok(())
    }

    /// Record the resolved event, keeping the position of an earlier entry
    /// with the same name.
    pub fn record(&mut self, event: TimeEvent) {
        self.registered.insert(event.name.clone(), event);
    }

    /// The resolved record for `name`, if it was recorded this pass.
    pub fn get(&self, name: &str) -> Option<&TimeEvent> {
        self.registered.get(name)
    }

    /// Number of recorded events.
    pub(crate) fn len(&self) -> usize {
        self.registered.len()
    }

    /// Recorded events in registration order.
    pub fn events(&self) -> impl Iterator<Item = &TimeEvent> {
        self.registered.values()
    }

    /// Forget everything, as on a reload.
    pub fn clear(&mut self) {
        self.claimed.clear();
        self.registered.clear();
    }

    /// Forget claimed names but keep recorded events, as on a reset.
    pub fn clear_claims(&mut self) {
        self.claimed.clear();
    }
}
