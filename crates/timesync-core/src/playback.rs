//! Scene playback seam and a fixed-rate reference clock.
//!
//! The synchronizer never drives playback itself. It reads the current
//! position through [`SceneHost`] and asks the host to reload the scene
//! when timing changes must take visible effect. [`FixedRatePlayback`] is
//! the host used by the replay binary and the tests.
//!
//! # Frame conversion
//!
//! - `frames_to_seconds(f) = f / fps`
//! - `seconds_to_frames(s) = ceil(s * fps)`, with negative or non-finite
//!   seconds mapping to frame 0. Products within [`FRAME_EPSILON`] of a
//!   whole frame round to that frame.

use tracing::debug;

use crate::config::PlaybackConfig;

/// Tolerance, in frames, absorbed before rounding a time up to a frame.
pub const FRAME_EPSILON: f64 = 1e-6;

/// Errors that can occur when building a playback clock.
#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    /// Invalid playback configuration (e.g. zero frames per second).
    #[error("invalid playback configuration: {reason}")]
    InvalidConfig {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

/// The scene a synchronizer belongs to, as seen from the synchronizer.
pub trait SceneHost {
    /// Current absolute frame index.
    fn frame(&self) -> u64;

    /// Absolute frame index at which the scene starts.
    fn first_frame(&self) -> u64;

    /// Convert a frame count to seconds.
    fn frames_to_seconds(&self, frames: u64) -> f64;

    /// Convert seconds to a frame count, rounding up.
    fn seconds_to_frames(&self, seconds: f64) -> u64;

    /// Ask the scene to re-run its pass from the top.
    fn request_reload(&mut self);

    /// Seconds elapsed between the first frame and the current frame.
    fn elapsed_seconds(&self) -> f64 {
        self.frames_to_seconds(self.frame().saturating_sub(self.first_frame()))
    }
}

/// A frame clock ticking at a constant rate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedRatePlayback {
    fps: u32,
    first_frame: u64,
    frame: u64,
    reload_requests: u64,
    reload_pending: bool,
}

impl FixedRatePlayback {
    /// Create a clock positioned on the first frame.
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::InvalidConfig`] if `fps` is zero.
    pub fn new(config: &PlaybackConfig) -> Result<Self, PlaybackError> {
        if config.fps == 0 {
            return Err(PlaybackError::InvalidConfig {
                reason: "fps must be at least 1".to_owned(),
            });
        }
        Ok(Self {
            fps: config.fps,
            first_frame: config.first_frame,
            frame: config.first_frame,
            reload_requests: 0,
            reload_pending: false,
        })
    }

    /// Return the configured frames per second.
    pub const fn fps(&self) -> u32 {
        self.fps
    }

    /// Move forward by `frames`. Returns the new frame.
    pub const fn advance(&mut self, frames: u64) -> u64 {
        self.frame = self.frame.saturating_add(frames);
        self.frame
    }

    /// Jump to an absolute frame, never before the first frame.
    pub fn seek(&mut self, frame: u64) {
        self.frame = frame.max(self.first_frame);
    }

    /// Return to the first frame, as at the start of a pass.
    pub const fn rewind(&mut self) {
        self.frame = self.first_frame;
    }

    /// Total number of reload requests received.
    pub const fn reload_requests(&self) -> u64 {
        self.reload_requests
    }

    /// Return whether a reload was requested since the last call, and clear it.
    pub const fn take_reload_request(&mut self) -> bool {
        let pending = self.reload_pending;
        self.reload_pending = false;
        pending
    }
}

impl SceneHost for FixedRatePlayback {
    fn frame(&self) -> u64 {
        self.frame
    }

    fn first_frame(&self) -> u64 {
        self.first_frame
    }

    #[allow(clippy::cast_precision_loss)]
    fn frames_to_seconds(&self, frames: u64) -> f64 {
        frames as f64 / f64::from(self.fps)
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn seconds_to_frames(&self, seconds: f64) -> u64 {
        if !seconds.is_finite() || seconds <= 0.0 {
            return 0;
        }
        let frames = (seconds * f64::from(self.fps) - FRAME_EPSILON).ceil();
        // `as` saturates for values beyond the u64 range.
        frames.max(0.0) as u64
    }

    fn request_reload(&mut self) {
        debug!(frame = self.frame, "Reload requested");
        self.reload_requests = self.reload_requests.saturating_add(1);
        self.reload_pending = true;
    }
}
