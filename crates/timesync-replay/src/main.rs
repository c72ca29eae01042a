//! Replay binary for the time event synchronizer.
//!
//! Loads a scripted scene, replays it for the configured number of
//! passes, and prints the persisted event records as JSON on stdout.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from the path given as the first argument, or
//!    `timesync-config.yaml`, or defaults
//! 2. Initialize structured logging (tracing)
//! 3. Replay the scene
//! 4. Print the final snapshot

mod config;
mod error;
mod script;

use std::path::{Path, PathBuf};

use timesync_types::encode_events;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::ReplayConfig;
use crate::error::ReplayError;

/// Default configuration file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "timesync-config.yaml";

fn main() -> Result<(), ReplayError> {
    // 1. Load configuration.
    let config = load_config()?;

    // 2. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    info!(
        fps = config.playback.fps,
        first_frame = config.playback.first_frame,
        passes = config.scene.passes,
        steps = config.scene.steps.len(),
        read_only = config.read_only,
        "Configuration loaded"
    );

    // 3. Replay.
    let outcome = script::run(&config)?;
    info!(
        passes = outcome.passes.len(),
        writes = outcome.writes,
        revision = %outcome.snapshot.revision,
        "Replay finished"
    );
    for event in &outcome.events {
        info!(
            event = event.name,
            initial_time = event.initial_time,
            target_time = event.target_time,
            offset = event.offset,
            "Event"
        );
    }

    // 4. Print the persisted records.
    println!("{}", encode_events(&outcome.snapshot.events)?);
    Ok(())
}

/// Load the replay configuration.
///
/// An explicit path must exist; the default path falls back to the
/// built-in script when absent.
fn load_config() -> Result<ReplayConfig, ReplayError> {
    if let Some(path) = std::env::args_os().nth(1).map(PathBuf::from) {
        return Ok(ReplayConfig::from_file(&path)?);
    }
    let default_path = Path::new(DEFAULT_CONFIG_PATH);
    if default_path.exists() {
        Ok(ReplayConfig::from_file(default_path)?)
    } else {
        Ok(ReplayConfig::default())
    }
}
