//! Registration, timing reconciliation, and metadata sync for scene time
//! events.
//!
//! A scene raises named events while it replays. This crate keeps those
//! events unique within a pass, reconciles their timing across passes,
//! mirrors the reconciled set to the scene's persisted metadata, and
//! republishes it after every recalculation.
//!
//! # Modules
//!
//! - [`config`] -- Playback configuration loaded from YAML.
//! - [`playback`] -- [`SceneHost`] trait and the [`FixedRatePlayback`] clock.
//! - [`store`] -- [`MetaStore`] trait and the in-memory [`MemoryMetaStore`].
//! - [`dispatch`] -- Subscriber list broadcasting the current event list.
//! - [`policy`] -- Fixed-target vs fixed-offset timing reconciliation.
//! - [`pass`] -- Per-pass bookkeeping: duplicate detection and the
//!   registered set.
//! - [`time_events`] -- [`TimeEvents`] trait and scene signals.
//! - [`editable`] -- [`EditableTimeEvents`], the full synchronizer.
//! - [`read_only`] -- [`ReadOnlyTimeEvents`] for presentation playback.
//!
//! [`SceneHost`]: playback::SceneHost
//! [`FixedRatePlayback`]: playback::FixedRatePlayback
//! [`MetaStore`]: store::MetaStore
//! [`MemoryMetaStore`]: store::MemoryMetaStore
//! [`TimeEvents`]: time_events::TimeEvents
//! [`EditableTimeEvents`]: editable::EditableTimeEvents
//! [`ReadOnlyTimeEvents`]: read_only::ReadOnlyTimeEvents

pub mod config;
pub mod dispatch;
pub mod editable;
pub mod pass;
pub mod playback;
pub mod policy;
pub mod read_only;
pub mod store;
pub mod time_events;

pub use editable::EditableTimeEvents;
pub use read_only::ReadOnlyTimeEvents;
pub use time_events::{MetaChange, SceneSignal, TimeEvents};
