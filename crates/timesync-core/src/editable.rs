//! The editable time event synchronizer.
//!
//! [`EditableTimeEvents`] is the authoring-mode synchronizer. It owns the
//! durable timing history of every event the scene has ever raised, the
//! bookkeeping of the current pass, and the bridge to the persisted scene
//! metadata.
//!
//! # Lifecycle
//!
//! 1. Construction reads the stored snapshot and merges it into the
//!    timing history.
//! 2. [`SceneSignal::Reloaded`] clears the pass; events re-register while
//!    the pass runs.
//! 3. [`SceneSignal::Recalculated`] restores the default policy,
//!    republishes the registered set, and writes it back if it changed.
//! 4. A metadata change that is not the echo of our own write is merged
//!    and triggers a reload.
//!
//! The timing history survives reloads, so an event that disappears for a
//! few passes keeps its target time when it comes back.

use std::collections::BTreeMap;
use std::panic::Location;

use timesync_types::{SavedSnapshot, SavedTimeEvent, SceneId, TimeEvent, same_time};
use tracing::{debug, error, info};

use crate::dispatch::{EventDispatcher, Listener, SubscriptionId};
use crate::pass::{PassLedger, RegisterError};
use crate::playback::SceneHost;
use crate::policy::{TimingPolicy, reconcile};
use crate::store::MetaStore;
use crate::time_events::{MetaChange, SceneSignal, TimeEvents};

/// Authoring-mode synchronizer for one scene.
#[derive(Debug)]
pub struct EditableTimeEvents {
    scene: SceneId,
    /// Durable timing history, keyed by event name.
    lookup: BTreeMap<String, TimeEvent>,
    ledger: PassLedger,
    /// Last snapshot written to or adopted from the store.
    previous: SavedSnapshot,
    did_events_change: bool,
    policy: TimingPolicy,
    dispatcher: EventDispatcher,
}

impl EditableTimeEvents {
    /// Create a synchronizer for a new scene and load its stored events.
    pub fn new(store: &dyn MetaStore) -> Self {
        Self::with_scene_id(SceneId::new(), store)
    }

    /// Create a synchronizer for the given scene and load its stored events.
    pub fn with_scene_id(scene: SceneId, store: &dyn MetaStore) -> Self {
        let previous = store.get();
        let mut manager = Self {
            scene,
            lookup: BTreeMap::new(),
            ledger: PassLedger::new(),
            previous: SavedSnapshot::default(),
            did_events_change: false,
            policy: TimingPolicy::default(),
            dispatcher: EventDispatcher::new(),
        };
        manager.load(&previous.events);
        debug!(
            scene = %scene,
            revision = %previous.revision,
            events = previous.len(),
            "Time events loaded"
        );
        manager.previous = previous;
        manager
    }

    /// Identifier of the owning scene.
    pub const fn scene_id(&self) -> SceneId {
        self.scene
    }

    /// The event registered under `name` during the current pass.
    pub fn get(&self, name: &str) -> Option<&TimeEvent> {
        self.ledger.get(name)
    }

    /// The durable timing record for `name`, registered this pass or not.
    pub fn history(&self, name: &str) -> Option<&TimeEvent> {
        self.lookup.get(name)
    }

    /// The last published event list, in registration order.
    pub fn events(&self) -> &[TimeEvent] {
        self.dispatcher.current()
    }

    /// Whether re-registrations currently hold the target time fixed.
    pub const fn preserves_timing(&self) -> bool {
        self.policy.preserves_target()
    }

    /// Whether timing changed since the last write to the store.
    pub const fn is_dirty(&self) -> bool {
        self.did_events_change
    }

    /// The last snapshot written to or adopted from the store.
    pub const fn previous_snapshot(&self) -> &SavedSnapshot {
        &self.previous
    }

    /// Register `name` at the current playback position.
    ///
    /// Returns the absolute frame at which the event concludes. A name
    /// registered twice in one pass is logged as an error and resolves to
    /// frame `0` without touching its record.
    #[track_caller]
    pub fn register(&mut self, name: &str, scene: &dyn SceneHost) -> u64 {
        match self.try_register(name, scene) {
            Ok(frame) => frame,
            Err(err) => {
                error!(scene = %self.scene, event = name, stack = err.location(), "{err}");
                0
            }
        }
    }

    /// Register `name` at the current playback position.
    ///
    /// # Errors
    ///
    /// Returns [`RegisterError::Duplicate`] if `name` was already registered
    /// during this pass. The event's record is left untouched.
    #[track_caller]
    pub fn try_register(&mut self, name: &str, scene: &dyn SceneHost) -> Result<u64, RegisterError> {
        let location = Location::caller();
        self.ledger.claim(name, location)?;

        let initial_time = scene.elapsed_seconds();
        let stack = location.to_string();

        let event = match self.lookup.get(name).cloned() {
            None => {
                let event = TimeEvent::first_seen(name, initial_time, Some(stack));
                debug!(scene = %self.scene, event = name, initial_time, "Event registered");
                self.lookup.insert(name.to_owned(), event.clone());
                self.did_events_change = true;
                event
            }
            Some(existing) => {
                let reconciled = reconcile(&existing, initial_time, Some(&stack), self.policy);
                if reconciled.target_moved {
                    debug!(
                        scene = %self.scene,
                        event = name,
                        from = existing.target_time,
                        to = reconciled.event.target_time,
                        "Event target moved"
                    );
                    self.did_events_change = true;
                }
                if reconciled.changed {
                    self.lookup.insert(name.to_owned(), reconciled.event.clone());
                }
                reconciled.event
            }
        };

        let frame = scene
            .first_frame()
            .saturating_add(scene.seconds_to_frames(event.target_time));
        self.ledger.record(event);
        Ok(frame)
    }

    /// Change the offset of a known event and reload the scene.
    ///
    /// `preserve` selects the policy for the next pass: `true` keeps the
    /// new target time fixed, `false` keeps the new offset fixed. Unknown
    /// names, unchanged offsets and non-finite offsets are ignored.
    /// Negative offsets clamp to zero.
    pub fn set(&mut self, name: &str, offset: f64, preserve: bool, scene: &mut dyn SceneHost) {
        if !offset.is_finite() {
            return;
        }
        let offset = offset.max(0.0);
        let Some(existing) = self.lookup.get(name) else {
            return;
        };
        if same_time(existing.offset, offset) {
            return;
        }

        let event = existing.with_offset(offset);
        self.policy = TimingPolicy::from_preserve(preserve);
        debug!(
            scene = %self.scene,
            event = name,
            offset,
            target_time = event.target_time,
            preserve,
            "Event offset changed"
        );
        self.lookup.insert(name.to_owned(), event.clone());
        self.ledger.record(event);
        self.publish();
        self.did_events_change = true;
        scene.request_reload();
    }

    /// Start a new pass.
    pub fn on_reloaded(&mut self) {
        self.ledger.clear();
    }

    /// Restart duplicate detection without discarding the registered set.
    pub fn on_reset(&mut self) {
        self.ledger.clear_claims();
    }

    /// Finalize a pass: republish and, if anything changed, persist.
    pub fn on_recalculated(&mut self, store: &mut dyn MetaStore) {
        self.policy = TimingPolicy::PreserveTarget;
        self.publish();

        if !self.did_events_change && self.previous.len() == self.ledger.len() {
            return;
        }

        let events: Vec<SavedTimeEvent> = self.ledger.events().map(TimeEvent::to_saved).collect();
        let revision = store.set(events.clone());
        info!(
            scene = %self.scene,
            %revision,
            events = events.len(),
            "Time events persisted"
        );
        self.did_events_change = false;
        self.previous = SavedSnapshot::new(revision, events);
    }

    /// Handle a change notification from the metadata store.
    ///
    /// Revisions at or below the reference snapshot are our own writes, or
    /// edits those writes already superseded, and are ignored. Anything
    /// newer becomes the reference snapshot, is merged into the timing
    /// history, and reloads the scene.
    pub fn on_meta_changed(
        &mut self,
        snapshot: &SavedSnapshot,
        scene: &mut dyn SceneHost,
    ) -> MetaChange {
        if snapshot.revision <= self.previous.revision {
            debug!(scene = %self.scene, revision = %snapshot.revision, "Ignoring own or superseded write");
            return MetaChange::Echo;
        }

        info!(
            scene = %self.scene,
            revision = %snapshot.revision,
            events = snapshot.len(),
            "Adopting external time events"
        );
        self.previous = snapshot.clone();
        self.load(&snapshot.events);
        scene.request_reload();
        MetaChange::Adopted
    }

    /// Merge persisted target times into the timing history.
    ///
    /// Only `target_time` is taken from the snapshot. Known events keep
    /// their initial time and offset until the next registration
    /// re-derives them; unknown events start from a zeroed stub.
    fn load(&mut self, events: &[SavedTimeEvent]) {
        for saved in events {
            let event = match self.lookup.get(&saved.name) {
                Some(existing) => TimeEvent {
                    target_time: saved.target_time,
                    ..existing.clone()
                },
                None => TimeEvent::from_saved(saved),
            };
            self.lookup.insert(saved.name.clone(), event);
        }
    }

    fn publish(&mut self) {
        self.dispatcher
            .publish(self.ledger.events().cloned().collect());
    }
}

impl TimeEvents for EditableTimeEvents {
    fn scene_id(&self) -> SceneId {
        Self::scene_id(self)
    }

    fn get(&self, name: &str) -> Option<&TimeEvent> {
        Self::get(self, name)
    }

    fn set(&mut self, name: &str, offset: f64, preserve: bool, scene: &mut dyn SceneHost) {
        Self::set(self, name, offset, preserve, scene);
    }

    #[track_caller]
    fn register(&mut self, name: &str, scene: &dyn SceneHost) -> u64 {
        Self::register(self, name, scene)
    }

    fn events(&self) -> &[TimeEvent] {
        Self::events(self)
    }

    fn subscribe(&mut self, listener: Listener, dispatch_now: bool) -> SubscriptionId {
        self.dispatcher.subscribe(listener, dispatch_now)
    }

    fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.dispatcher.unsubscribe(id)
    }

    fn handle_signal(&mut self, signal: SceneSignal, store: &mut dyn MetaStore) {
        match signal {
            SceneSignal::Reloaded => self.on_reloaded(),
            SceneSignal::Recalculated => self.on_recalculated(store),
            SceneSignal::Reset => self.on_reset(),
        }
    }

    fn handle_meta_changed(
        &mut self,
        snapshot: &SavedSnapshot,
        scene: &mut dyn SceneHost,
    ) -> MetaChange {
        self.on_meta_changed(snapshot, scene)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::PlaybackConfig;
    use crate::playback::FixedRatePlayback;
    use crate::store::MemoryMetaStore;

    fn make_clock() -> FixedRatePlayback {
        FixedRatePlayback::new(&PlaybackConfig::default()).unwrap()
    }

    /// Run one pass: reload, register `names` one second apart, recalculate.
    fn run_pass(
        manager: &mut EditableTimeEvents,
        clock: &mut FixedRatePlayback,
        store: &mut MemoryMetaStore,
        names: &[&str],
    ) -> Vec<u64> {
        manager.on_reloaded();
        clock.rewind();
        let frames = names
            .iter()
            .map(|name| {
                clock.advance(30);
                manager.register(name, &*clock)
            })
            .collect();
        manager.on_recalculated(store);
        frames
    }

    #[test]
    fn first_registration_resolves_to_current_frame() {
        let store = MemoryMetaStore::new();
        let mut manager = EditableTimeEvents::new(&store);
        let mut clock = make_clock();
        clock.advance(60);

        let frame = manager.register("intro", &clock);

        assert_eq!(frame, 60);
        let event = manager.get("intro").unwrap();
        assert!(same_time(event.initial_time, 2.0));
        assert!(same_time(event.target_time, 2.0));
        assert!(manager.is_dirty());
    }

    #[test]
    fn first_frame_offsets_the_result() {
        let store = MemoryMetaStore::new();
        let mut manager = EditableTimeEvents::new(&store);
        let mut clock = FixedRatePlayback::new(&PlaybackConfig {
            fps: 30,
            first_frame: 100,
        })
        .unwrap();
        clock.advance(30);

        assert_eq!(manager.register("a", &clock), 130);
        assert!(same_time(manager.get("a").unwrap().initial_time, 1.0));
    }

    #[test]
    fn stack_points_at_the_caller() {
        let store = MemoryMetaStore::new();
        let mut manager = EditableTimeEvents::new(&store);
        let clock = make_clock();
        manager.register("a", &clock);

        let stack = manager.get("a").unwrap().stack.clone().unwrap();
        assert!(stack.contains("editable.rs"), "unexpected stack {stack}");
    }

    #[test]
    fn duplicate_try_register_reports_error() {
        let store = MemoryMetaStore::new();
        let mut manager = EditableTimeEvents::new(&store);
        let clock = make_clock();

        assert!(manager.try_register("a", &clock).is_ok());
        let err = manager.try_register("a", &clock).unwrap_err();
        assert!(matches!(err, RegisterError::Duplicate { ref name, .. } if name == "a"));
    }

    #[test]
    fn reset_allows_registering_again() {
        let store = MemoryMetaStore::new();
        let mut manager = EditableTimeEvents::new(&store);
        let clock = make_clock();

        manager.register("a", &clock);
        manager.on_reset();
        assert!(manager.try_register("a", &clock).is_ok());
        assert!(manager.get("a").is_some());
    }

    #[test]
    fn history_survives_reload() {
        let mut store = MemoryMetaStore::new();
        let mut manager = EditableTimeEvents::new(&store);
        let mut clock = make_clock();
        run_pass(&mut manager, &mut clock, &mut store, &["a"]);

        manager.on_reloaded();
        assert!(manager.get("a").is_none());
        assert!(manager.history("a").is_some());
    }

    #[test]
    fn set_ignores_unknown_and_unchanged() {
        let mut store = MemoryMetaStore::new();
        let mut manager = EditableTimeEvents::new(&store);
        let mut clock = make_clock();
        run_pass(&mut manager, &mut clock, &mut store, &["a"]);

        manager.set("missing", 1.0, true, &mut clock);
        manager.set("a", 0.0, true, &mut clock);
        manager.set("a", f64::NAN, true, &mut clock);

        assert_eq!(clock.reload_requests(), 0);
        assert!(!manager.is_dirty());
    }

    #[test]
    fn set_moves_target_and_reloads() {
        let mut store = MemoryMetaStore::new();
        let mut manager = EditableTimeEvents::new(&store);
        let mut clock = make_clock();
        run_pass(&mut manager, &mut clock, &mut store, &["a"]);

        manager.set("a", 3.0, false, &mut clock);

        let event = manager.get("a").unwrap();
        assert!(same_time(event.target_time, 4.0));
        assert!(same_time(event.offset, 3.0));
        assert!(!manager.preserves_timing());
        assert!(manager.is_dirty());
        assert_eq!(clock.reload_requests(), 1);
        assert_eq!(manager.events().len(), 1);
    }

    #[test]
    fn negative_offset_clamps_to_zero() {
        let mut store = MemoryMetaStore::new();
        let mut manager = EditableTimeEvents::new(&store);
        let mut clock = make_clock();
        run_pass(&mut manager, &mut clock, &mut store, &["a"]);
        manager.set("a", 2.0, true, &mut clock);

        manager.set("a", -5.0, true, &mut clock);

        let event = manager.get("a").unwrap();
        assert!(same_time(event.offset, 0.0));
        assert!(event.is_consistent());
    }

    #[test]
    fn recalculate_restores_preserve_policy() {
        let mut store = MemoryMetaStore::new();
        let mut manager = EditableTimeEvents::new(&store);
        let mut clock = make_clock();
        run_pass(&mut manager, &mut clock, &mut store, &["a"]);
        manager.set("a", 1.0, false, &mut clock);

        manager.on_recalculated(&mut store);
        assert!(manager.preserves_timing());
    }

    #[test]
    fn published_list_follows_registration_order() {
        let mut store = MemoryMetaStore::new();
        let mut manager = EditableTimeEvents::new(&store);
        let mut clock = make_clock();
        run_pass(&mut manager, &mut clock, &mut store, &["b", "a", "c"]);

        let names: Vec<&str> = manager.events().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["b", "a", "c"]);
    }

    #[test]
    fn removed_event_triggers_write() {
        let mut store = MemoryMetaStore::new();
        let mut manager = EditableTimeEvents::new(&store);
        let mut clock = make_clock();
        run_pass(&mut manager, &mut clock, &mut store, &["a", "b"]);
        assert_eq!(store.writes(), 1);

        run_pass(&mut manager, &mut clock, &mut store, &["a"]);
        assert_eq!(store.writes(), 2);
        assert_eq!(store.get().events.len(), 1);
    }

    #[test]
    fn external_edit_is_adopted() {
        let mut store = MemoryMetaStore::new();
        let mut manager = EditableTimeEvents::new(&store);
        let mut clock = make_clock();
        run_pass(&mut manager, &mut clock, &mut store, &["a"]);

        let edited = store.edit(vec![SavedTimeEvent::new("a", 9.0)]);
        assert_eq!(manager.on_meta_changed(&edited, &mut clock), MetaChange::Adopted);
        assert!(same_time(manager.history("a").unwrap().target_time, 9.0));
        assert_eq!(manager.previous_snapshot().revision, edited.revision);
        assert_eq!(clock.reload_requests(), 1);
    }

    #[test]
    fn signals_route_to_handlers() {
        let mut store = MemoryMetaStore::new();
        let mut manager = EditableTimeEvents::new(&store);
        let clock = make_clock();

        TimeEvents::register(&mut manager, "a", &clock);
        manager.handle_signal(SceneSignal::Recalculated, &mut store);
        assert_eq!(store.writes(), 1);

        manager.handle_signal(SceneSignal::Reset, &mut store);
        assert!(TimeEvents::get(&manager, "a").is_some());

        manager.handle_signal(SceneSignal::Reloaded, &mut store);
        assert!(TimeEvents::get(&manager, "a").is_none());
    }
}
