//! Presentation-mode synchronizer.
//!
//! [`ReadOnlyTimeEvents`] replays a scene against timing that was authored
//! elsewhere: it resolves events from the stored snapshot, never writes to
//! the store, and ignores offset changes.

use std::collections::BTreeMap;
use std::panic::Location;

use timesync_types::{Revision, SavedSnapshot, SceneId, TimeEvent};
use tracing::{debug, error, info};

use crate::dispatch::{EventDispatcher, Listener, SubscriptionId};
use crate::pass::{PassLedger, RegisterError};
use crate::playback::SceneHost;
use crate::store::MetaStore;
use crate::time_events::{MetaChange, SceneSignal, TimeEvents};

/// Read-only synchronizer for one scene.
#[derive(Debug)]
pub struct ReadOnlyTimeEvents {
    scene: SceneId,
    lookup: BTreeMap<String, TimeEvent>,
    ledger: PassLedger,
    loaded: Revision,
    dispatcher: EventDispatcher,
}

impl ReadOnlyTimeEvents {
    /// Create a synchronizer for a new scene from the stored snapshot.
    pub fn new(store: &dyn MetaStore) -> Self {
        Self::with_scene_id(SceneId::new(), store)
    }

    /// Create a synchronizer for the given scene from the stored snapshot.
    pub fn with_scene_id(scene: SceneId, store: &dyn MetaStore) -> Self {
        let mut manager = Self {
            scene,
            lookup: BTreeMap::new(),
            ledger: PassLedger::new(),
            loaded: Revision::INITIAL,
            dispatcher: EventDispatcher::new(),
        };
        manager.load(&store.get());
        manager
    }

    /// Revision of the snapshot the timing was taken from.
    pub const fn loaded_revision(&self) -> Revision {
        self.loaded
    }

    /// Register `name` at the current playback position.
    ///
    /// Known events resolve to their stored target frame, or to the current
    /// frame once playback has passed it; unknown events resolve to the
    /// current frame. Duplicates in one pass resolve to `0`.
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
    /// during this pass.
    #[track_caller]
    pub fn try_register(&mut self, name: &str, scene: &dyn SceneHost) -> Result<u64, RegisterError> {
        self.ledger.claim(name, Location::caller())?;
        let initial_time = scene.elapsed_seconds();

        let Some(stored) = self.lookup.get(name) else {
            self.ledger
                .record(TimeEvent::first_seen(name, initial_time, None));
            return Ok(scene.frame());
        };

        let offset = (stored.target_time - initial_time).max(0.0);
        let event = TimeEvent {
            initial_time,
            offset,
            target_time: initial_time + offset,
            ..stored.clone()
        };
        let frame = scene
            .first_frame()
            .saturating_add(scene.seconds_to_frames(event.target_time));
        self.ledger.record(event);
        Ok(frame)
    }

    fn load(&mut self, snapshot: &SavedSnapshot) {
        self.lookup = snapshot
            .events
            .iter()
            .map(|saved| (saved.name.clone(), TimeEvent::from_saved(saved)))
            .collect();
        self.loaded = snapshot.revision;
        debug!(
            scene = %self.scene,
            revision = %snapshot.revision,
            events = snapshot.len(),
            "Read-only time events loaded"
        );
    }
}

impl TimeEvents for ReadOnlyTimeEvents {
    fn scene_id(&self) -> SceneId {
        self.scene
    }

    fn get(&self, name: &str) -> Option<&TimeEvent> {
        self.ledger.get(name)
    }

    fn set(&mut self, name: &str, _offset: f64, _preserve: bool, _scene: &mut dyn SceneHost) {
        debug!(scene = %self.scene, event = name, "Ignoring offset change in read-only mode");
    }

    #[track_caller]
    fn register(&mut self, name: &str, scene: &dyn SceneHost) -> u64 {
        Self::register(self, name, scene)
    }

    fn events(&self) -> &[TimeEvent] {
        self.dispatcher.current()
    }

    fn subscribe(&mut self, listener: Listener, dispatch_now: bool) -> SubscriptionId {
        self.dispatcher.subscribe(listener, dispatch_now)
    }

    fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.dispatcher.unsubscribe(id)
    }

    fn handle_signal(&mut self, signal: SceneSignal, _store: &mut dyn MetaStore) {
        match signal {
            SceneSignal::Reloaded => self.ledger.clear(),
            SceneSignal::Recalculated => {
                self.dispatcher
                    .publish(self.ledger.events().cloned().collect());
            }
            SceneSignal::Reset => self.ledger.clear_claims(),
        }
    }

    fn handle_meta_changed(
        &mut self,
        snapshot: &SavedSnapshot,
        scene: &mut dyn SceneHost,
    ) -> MetaChange {
        if snapshot.revision <= self.loaded {
            return MetaChange::Echo;
        }
        info!(scene = %self.scene, revision = %snapshot.revision, "Reloading read-only time events");
        self.load(snapshot);
        scene.request_reload();
        MetaChange::Adopted
    }
}
