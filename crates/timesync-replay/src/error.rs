//! Error types for the replay binary.
//!
//! [`ReplayError`] wraps every failure mode of loading the script and
//! replaying it, so `main` can propagate with `?`.

use timesync_core::config::ConfigError;
use timesync_core::playback::PlaybackError;
use timesync_types::SnapshotError;

/// Top-level error for the replay binary.
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ConfigError,
    },

    /// The playback clock could not be built.
    #[error("playback error: {source}")]
    Playback {
        /// The underlying playback error.
        #[from]
        source: PlaybackError,
    },

    /// The final snapshot could not be encoded.
    #[error("snapshot error: {source}")]
    Snapshot {
        /// The underlying snapshot error.
        #[from]
        source: SnapshotError,
    },
}
