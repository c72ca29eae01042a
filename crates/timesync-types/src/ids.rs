//! Type-safe identifier wrapper around [`Uuid`].
//!
//! Each scene owns exactly one synchronizer; the [`SceneId`] ties log
//! lines and published snapshots back to the scene that produced them.
//! IDs use UUID v7 (time-ordered) so scenes created later sort later.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Unique identifier for a scene instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SceneId(pub Uuid);

impl SceneId {
    /// Create a new identifier using UUID v7 (time-ordered).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Return the inner [`Uuid`] value.
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for SceneId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for SceneId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for SceneId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl From<SceneId> for Uuid {
    fn from(id: SceneId) -> Self {
        id.0
    }
}
