//! The [`TimeEvents`] trait implemented by both synchronizers.
//!
//! A scene holds one synchronizer for its lifetime and routes three kinds
//! of input into it: registrations raised while a pass runs, scene
//! lifecycle signals, and change notifications from the metadata store.

use timesync_types::{SavedSnapshot, SceneId, TimeEvent};

use crate::dispatch::{Listener, SubscriptionId};
use crate::playback::SceneHost;
use crate::store::MetaStore;

/// Lifecycle signals raised by the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneSignal {
    /// A new pass is about to run from the top.
    Reloaded,
    /// A pass finished; timing is final for this pass.
    Recalculated,
    /// Playback restarted without re-running the pass setup.
    Reset,
}

/// What a synchronizer did with a metadata change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaChange {
    /// The change was the synchronizer's own write, or one a later write
    /// already superseded, and was ignored.
    Echo,
    /// The change was merged and a reload was requested.
    Adopted,
}

/// Time event synchronizer for a single scene.
pub trait TimeEvents {
    /// Identifier of the owning scene.
    fn scene_id(&self) -> SceneId;

    /// The event registered under `name` during the current pass.
    fn get(&self, name: &str) -> Option<&TimeEvent>;

    /// Change the offset of a known event.
    fn set(&mut self, name: &str, offset: f64, preserve: bool, scene: &mut dyn SceneHost);

    /// Register `name` at the current playback position.
    ///
    /// Returns the absolute frame at which the event concludes, or `0` if
    /// the name was already registered during this pass.
    fn register(&mut self, name: &str, scene: &dyn SceneHost) -> u64;

    /// The last published event list, in registration order.
    fn events(&self) -> &[TimeEvent];

    /// Subscribe to the published event list.
    fn subscribe(&mut self, listener: Listener, dispatch_now: bool) -> SubscriptionId;

    /// Remove a subscription. Returns `false` if it was not active.
    fn unsubscribe(&mut self, id: SubscriptionId) -> bool;

    /// Handle a scene lifecycle signal.
    fn handle_signal(&mut self, signal: SceneSignal, store: &mut dyn MetaStore);

    /// Handle a change notification from the metadata store.
    fn handle_meta_changed(
        &mut self,
        snapshot: &SavedSnapshot,
        scene: &mut dyn SceneHost,
    ) -> MetaChange;
}
