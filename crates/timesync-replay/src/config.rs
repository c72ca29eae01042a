//! Replay script configuration.
//!
//! The script lives in `timesync-config.yaml`. It names the frame clock,
//! the ordered steps of one pass, how many passes to run, the snapshot the
//! store starts with, and timing overrides applied between passes.

use std::path::Path;

use serde::Deserialize;
use timesync_core::config::{ConfigError, PlaybackConfig};
use timesync_types::SavedTimeEvent;

/// Top-level replay configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ReplayConfig {
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Frame clock settings.
    #[serde(default)]
    pub playback: PlaybackConfig,

    /// The scripted scene.
    #[serde(default)]
    pub scene: SceneScript,

    /// Events the metadata store holds before the first pass.
    #[serde(default)]
    pub snapshot: Vec<SavedTimeEvent>,

    /// Offset changes applied after specific passes.
    #[serde(default)]
    pub overrides: Vec<TimingOverride>,

    /// Replay against stored timing without editing it.
    #[serde(default)]
    pub read_only: bool,
}

impl ReplayConfig {
    /// Load the replay configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse the replay configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yml::from_str(yaml)?)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// The steps of one pass and how many passes to run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SceneScript {
    /// Number of passes to replay.
    #[serde(default = "default_passes")]
    pub passes: u32,

    /// Ordered steps of a pass.
    #[serde(default = "default_steps")]
    pub steps: Vec<ScriptStep>,
}

impl Default for SceneScript {
    fn default() -> Self {
        Self {
            passes: default_passes(),
            steps: default_steps(),
        }
    }
}

/// Play for `wait_frames`, then wait until the named event.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ScriptStep {
    /// Frames played before the event is raised.
    #[serde(default)]
    pub wait_frames: u64,

    /// Event name.
    pub event: String,
}

/// An offset change applied after a pass, as an editor would.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TimingOverride {
    /// Event name.
    pub event: String,

    /// New offset in seconds.
    pub offset: f64,

    /// Keep the target fixed (`true`) or the offset fixed (`false`) on the
    /// following pass.
    #[serde(default = "default_true")]
    pub preserve: bool,

    /// 1-based pass after which the change is applied.
    pub after_pass: u32,
}

fn default_log_level() -> String {
    "info".to_owned()
}

const fn default_passes() -> u32 {
    2
}

fn default_steps() -> Vec<ScriptStep> {
    vec![
        ScriptStep {
            wait_frames: 30,
            event: "intro".to_owned(),
        },
        ScriptStep {
            wait_frames: 45,
            event: "swap".to_owned(),
        },
        ScriptStep {
            wait_frames: 60,
            event: "outro".to_owned(),
        },
    ]
}

const fn default_true() -> bool {
    true
}
