//! Timing reconciliation for re-registered events.
//!
//! When a known event is observed again, its initial time may have moved
//! because code earlier in the scene got slower or faster. The policy
//! decides which of the two derived quantities stays put:
//!
//! - [`TimingPolicy::PreserveTarget`] keeps the absolute target time and
//!   recomputes the offset as `max(0, target - initial)`.
//! - [`TimingPolicy::PreserveOffset`] keeps the offset and slides the
//!   target to `initial + offset`.
//!
//! Under either policy the result satisfies `target = initial + offset`.
//! If the initial time has moved past a preserved target, the offset
//! clamps to zero and the target snaps to the initial time.

use timesync_types::{TimeEvent, same_time};

/// Which derived quantity survives a shift in the observed initial time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimingPolicy {
    /// Hold the target time fixed, recompute the offset.
    #[default]
    PreserveTarget,
    /// Hold the offset fixed, recompute the target time.
    PreserveOffset,
}

impl TimingPolicy {
    /// Map the `preserve` flag of a timing change onto a policy.
    pub const fn from_preserve(preserve: bool) -> Self {
        if preserve {
            Self::PreserveTarget
        } else {
            Self::PreserveOffset
        }
    }

    /// Whether this policy holds the target time fixed.
    pub const fn preserves_target(self) -> bool {
        matches!(self, Self::PreserveTarget)
    }
}

/// Outcome of [`reconcile`].
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled {
    /// The merged record.
    pub event: TimeEvent,
    /// Whether any field differs from the existing record.
    pub changed: bool,
    /// Whether the target time moved, which must be persisted.
    pub target_moved: bool,
}

/// Merge a fresh observation of an event into its existing record.
pub fn reconcile(
    existing: &TimeEvent,
    initial_time: f64,
    stack: Option<&str>,
    policy: TimingPolicy,
) -> Reconciled {
    let mut event = existing.clone();
    let mut changed = false;
    let mut target_moved = false;

    if event.stack.as_deref() != stack {
        event.stack = stack.map(str::to_owned);
        changed = true;
    }

    if !same_time(event.initial_time, initial_time) {
        event.initial_time = initial_time;
        changed = true;
    }

    if policy.preserves_target() {
        let offset = (event.target_time - event.initial_time).max(0.0);
        if !same_time(event.offset, offset) {
            event.offset = offset;
            changed = true;
        }
    }

    let target = event.initial_time + event.offset;
    if !same_time(event.target_time, target) {
        event.target_time = target;
        changed = true;
        target_moved = true;
    }

    Reconciled {
        event,
        changed,
        target_moved,
    }
}
