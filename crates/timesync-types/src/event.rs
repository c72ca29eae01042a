//! Working and persisted time event records.
//!
//! A [`TimeEvent`] is the live record the synchronizer reconciles on every
//! pass. A [`SavedTimeEvent`] is its persisted projection: only the name
//! and the absolute target time survive a round trip through the scene
//! metadata. Everything else is re-derived from playback on the next pass.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Absolute tolerance, in seconds, under which two times are the same.
pub const TIME_EPSILON: f64 = 1e-9;

/// Return `true` if two times (in seconds) differ by less than [`TIME_EPSILON`].
pub const fn same_time(a: f64, b: f64) -> bool {
    (a - b).abs() < TIME_EPSILON
}

/// A named event raised during the replay of a scene.
///
/// Names are identity keys: at most one event of a given name exists per
/// scene. For every registered event `target_time == initial_time + offset`
/// and `offset >= 0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct TimeEvent {
    /// Unique event name within the scene.
    pub name: String,
    /// Seconds from scene start at which the event was last observed.
    pub initial_time: f64,
    /// Seconds from scene start at which the event concludes.
    pub target_time: f64,
    /// Distance between the initial and the target time, in seconds.
    pub offset: f64,
    /// Call site that registered the event (`file:line:column`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub stack: Option<String>,
}

impl TimeEvent {
    /// Create the record for an event seen for the first time.
    ///
    /// The event concludes where it was observed: the target equals the
    /// initial time and the offset is zero.
    pub fn first_seen(name: impl Into<String>, initial_time: f64, stack: Option<String>) -> Self {
        Self {
            name: name.into(),
            initial_time,
            target_time: initial_time,
            offset: 0.0,
            stack,
        }
    }

    /// Create a stub record from its persisted projection.
    ///
    /// Only `target_time` is durable. The initial time and the offset start
    /// at zero and are re-derived on the next registration.
    pub fn from_saved(saved: &SavedTimeEvent) -> Self {
        Self {
            name: saved.name.clone(),
            initial_time: 0.0,
            target_time: saved.target_time,
            offset: 0.0,
            stack: None,
        }
    }

    /// Return a copy that keeps the initial time and uses the given offset.
    #[must_use]
    pub fn with_offset(&self, offset: f64) -> Self {
        Self {
            target_time: self.initial_time + offset,
            offset,
            ..self.clone()
        }
    }

    /// Return `true` if the record satisfies `target = initial + offset`
    /// with a non-negative offset.
    pub fn is_consistent(&self) -> bool {
        self.offset >= 0.0 && same_time(self.target_time, self.initial_time + self.offset)
    }

    /// Project the record onto its persisted form.
    pub fn to_saved(&self) -> SavedTimeEvent {
        SavedTimeEvent {
            name: self.name.clone(),
            target_time: self.target_time,
        }
    }
}

/// The persisted projection of a [`TimeEvent`].
///
/// Serializes as `{"name": ..., "targetTime": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct SavedTimeEvent {
    /// Unique event name within the scene.
    pub name: String,
    /// Seconds from scene start at which the event concludes.
    pub target_time: f64,
}

impl SavedTimeEvent {
    /// Create a persisted record.
    pub fn new(name: impl Into<String>, target_time: f64) -> Self {
        Self {
            name: name.into(),
            target_time,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn first_seen_concludes_where_observed() {
        let event = TimeEvent::first_seen("intro", 2.5, None);
        assert!(same_time(event.target_time, 2.5));
        assert!(same_time(event.offset, 0.0));
        assert!(event.is_consistent());
    }

    #[test]
    fn with_offset_moves_target() {
        let event = TimeEvent::first_seen("intro", 2.0, None).with_offset(3.0);
        assert!(same_time(event.target_time, 5.0));
        assert!(same_time(event.initial_time, 2.0));
        assert!(event.is_consistent());
    }

    #[test]
    fn stub_from_saved_keeps_only_target() {
        let saved = SavedTimeEvent::new("outro", 7.0);
        let stub = TimeEvent::from_saved(&saved);
        assert_eq!(stub.name, "outro");
        assert!(same_time(stub.target_time, 7.0));
        assert!(same_time(stub.initial_time, 0.0));
        assert!(same_time(stub.offset, 0.0));
        assert!(stub.stack.is_none());
    }

    #[test]
    fn negative_offset_is_inconsistent() {
        let mut event = TimeEvent::first_seen("a", 4.0, None);
        event.offset = -1.0;
        event.target_time = 3.0;
        assert!(!event.is_consistent());
    }

    #[test]
    fn saved_event_uses_camel_case() {
        let saved = SavedTimeEvent::new("a", 5.0);
        let json = serde_json::to_value(&saved).unwrap();
        assert_eq!(json, serde_json::json!({ "name": "a", "targetTime": 5.0 }));
    }

    #[test]
    fn time_event_omits_missing_stack() {
        let event = TimeEvent::first_seen("a", 1.0, None);
        let json = serde_json::to_value(&event).unwrap();
        assert!(json.get("stack").is_none());
        assert_eq!(json.get("initialTime"), Some(&serde_json::json!(1.0)));
    }

    #[test]
    fn same_time_tolerates_rounding() {
        assert!(same_time(0.1 + 0.2, 0.3));
        assert!(!same_time(1.0, 1.001));
    }
}
