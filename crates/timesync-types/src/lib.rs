//! Shared type definitions for timeline event synchronization.
//!
//! This crate is the single source of truth for the records exchanged
//! between the synchronizer, the persisted scene metadata, and the editor
//! UI. Types flow downstream to `TypeScript` via `ts-rs` so the timeline
//! editor can render the published event list.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrapper for scene identity
//! - [`event`] -- Working and persisted time event records
//! - [`snapshot`] -- Revision-stamped snapshots and the JSON record format

pub mod event;
pub mod ids;
pub mod snapshot;

pub use event::{SavedTimeEvent, TIME_EPSILON, TimeEvent, same_time};
pub use ids::SceneId;
pub use snapshot::{Revision, SavedSnapshot, SnapshotError, decode_events, encode_events};
