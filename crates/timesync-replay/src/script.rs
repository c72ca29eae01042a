//! Scripted replay of a scene against the time event synchronizer.
//!
//! A pass rewinds the clock, plays each step's frames, registers the
//! step's event, and waits until the frame the synchronizer resolved.
//! After each pass the scene recalculates, store notifications are
//! forwarded back into the synchronizer, and any scheduled overrides are
//! applied.

use timesync_core::playback::{FixedRatePlayback, SceneHost};
use timesync_core::store::{MemoryMetaStore, MetaStore};
use timesync_core::{EditableTimeEvents, MetaChange, ReadOnlyTimeEvents, SceneSignal, TimeEvents};
use timesync_types::{SavedSnapshot, TimeEvent};
use tracing::{debug, info};

use crate::config::{ReplayConfig, ScriptStep};
use crate::error::ReplayError;

/// Frames resolved during one pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassReport {
    /// 1-based pass number.
    pub pass: u32,
    /// Event name and the frame it resolved to, in step order.
    pub frames: Vec<(String, u64)>,
    /// Frame the clock stood on when the pass finished.
    pub end_frame: u64,
}

/// Everything a replay produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayOutcome {
    /// One report per pass.
    pub passes: Vec<PassReport>,
    /// The published event list after the last pass.
    pub events: Vec<TimeEvent>,
    /// The snapshot the store held at the end.
    pub snapshot: SavedSnapshot,
    /// Number of writes the synchronizer made.
    pub writes: u64,
}

/// Replay the configured scene.
///
/// # Errors
///
/// Returns [`ReplayError::Playback`] if the frame clock configuration is
/// invalid.
pub fn run(config: &ReplayConfig) -> Result<ReplayOutcome, ReplayError> {
    let mut clock = FixedRatePlayback::new(&config.playback)?;
    let mut store = if config.snapshot.is_empty() {
        MemoryMetaStore::new()
    } else {
        MemoryMetaStore::with_events(config.snapshot.clone())
    };

    let mut events: Box<dyn TimeEvents> = if config.read_only {
        Box::new(ReadOnlyTimeEvents::new(&store))
    } else {
        Box::new(EditableTimeEvents::new(&store))
    };

    info!(
        scene = %events.scene_id(),
        fps = clock.fps(),
        first_frame = clock.first_frame(),
        read_only = config.read_only,
        "Replay starting"
    );

    let mut passes = Vec::new();
    for pass in 1..=config.scene.passes {
        let report = run_pass(pass, events.as_mut(), &mut clock, &mut store, &config.scene.steps);
        info!(
            pass,
            end_frame = report.end_frame,
            events = report.frames.len(),
            "Pass finished"
        );
        passes.push(report);

        events.handle_signal(SceneSignal::Recalculated, &mut store);
        forward_changes(events.as_mut(), &mut store, &mut clock);

        for change in config.overrides.iter().filter(|o| o.after_pass == pass) {
            info!(
                pass,
                event = change.event,
                offset = change.offset,
                preserve = change.preserve,
                "Applying timing override"
            );
            events.set(&change.event, change.offset, change.preserve, &mut clock);
        }

        if clock.take_reload_request() {
            debug!(pass, "Scene reload requested");
        }
    }

    Ok(ReplayOutcome {
        passes,
        events: events.events().to_vec(),
        snapshot: store.get(),
        writes: store.writes(),
    })
}

fn run_pass(
    pass: u32,
    events: &mut dyn TimeEvents,
    clock: &mut FixedRatePlayback,
    store: &mut MemoryMetaStore,
    steps: &[ScriptStep],
) -> PassReport {
    events.handle_signal(SceneSignal::Reloaded, store);
    clock.rewind();

    let mut frames = Vec::with_capacity(steps.len());
    for step in steps {
        clock.advance(step.wait_frames);
        let frame = events.register(&step.event, &*clock);
        if frame > clock.frame() {
            clock.seek(frame);
        }
        frames.push((step.event.clone(), frame));
    }

    PassReport {
        pass,
        frames,
        end_frame: clock.frame(),
    }
}

/// Deliver pending store notifications, the way a file watcher would.
fn forward_changes(
    events: &mut dyn TimeEvents,
    store: &mut MemoryMetaStore,
    clock: &mut FixedRatePlayback,
) {
    for snapshot in store.drain_changes() {
        if events.handle_meta_changed(&snapshot, clock) == MetaChange::Adopted {
            info!(revision = %snapshot.revision, "External time events adopted");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use timesync_types::SavedTimeEvent;

    use super::*;
    use crate::config::TimingOverride;

    fn frames_of(report: &PassReport) -> Vec<u64> {
        report.frames.iter().map(|(_, frame)| *frame).collect()
    }

    #[test]
    fn default_script_is_stable_across_passes() {
        let outcome = run(&ReplayConfig::default()).unwrap();
        assert_eq!(outcome.passes.len(), 2);

        let first = outcome.passes.first().unwrap();
        let second = outcome.passes.get(1).unwrap();
        assert_eq!(frames_of(first), [30, 75, 135]);
        assert_eq!(frames_of(first), frames_of(second));
        assert_eq!(outcome.writes, 1);
        assert_eq!(outcome.snapshot.len(), 3);
    }

    #[test]
    fn preserving_override_delays_later_events() {
        let config = ReplayConfig {
            overrides: vec![TimingOverride {
                event: "intro".to_owned(),
                offset: 1.0,
                preserve: true,
                after_pass: 1,
            }],
            ..ReplayConfig::default()
        };
        let outcome = run(&config).unwrap();

        let second = outcome.passes.get(1).unwrap();
        // intro now ends a second later and pushes the rest along.
        assert_eq!(frames_of(second), [60, 105, 165]);
        assert_eq!(outcome.writes, 2);
    }

    #[test]
    fn duplicate_step_resolves_to_zero() {
        let mut config = ReplayConfig::default();
        config.scene.passes = 1;
        config.scene.steps.push(ScriptStep {
            wait_frames: 10,
            event: "intro".to_owned(),
        });
        let outcome = run(&config).unwrap();

        let only = outcome.passes.first().unwrap();
        assert_eq!(frames_of(only), [30, 75, 135, 0]);
        assert_eq!(outcome.events.len(), 3);
    }

    #[test]
    fn read_only_replay_uses_snapshot_without_writing() {
        let config = ReplayConfig {
            read_only: true,
            snapshot: vec![SavedTimeEvent::new("intro", 2.0)],
            ..ReplayConfig::default()
        };
        let outcome = run(&config).unwrap();

        let first = outcome.passes.first().unwrap();
        assert_eq!(frames_of(first), [60, 105, 165]);
        assert_eq!(outcome.writes, 0);
    }
}
