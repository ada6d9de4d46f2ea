// src/playback/mod.rs
//! Status playback engine
//!
//! Plays one author's statuses as an auto-advancing slideshow. The pieces:
//!
//! - [`controller`]: index/progress/pause state machine, no timers
//! - [`recorder`]: at-most-once view reporting per session
//! - [`gestures`]: tap vs. hold disambiguation
//! - [`reply`]: reply composer and owner panel
//! - [`session`]: owns the tick timer and wires the pieces to collaborators

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::models::StatusId;
use crate::services::ServiceError;

pub mod controller;
pub mod gestures;
pub mod recorder;
pub mod reply;
pub mod session;

pub use controller::{Direction, PauseReason, PlaybackController, PlaybackMark, PlaybackState, Transition};
pub use gestures::{GestureCommand, GestureMapper, TapZone};
pub use recorder::ViewRecorder;
pub use reply::{OwnerPanel, ReplyComposer, ViewerRole};
pub use session::{Collaborators, PlaybackSession, PlaybackSnapshot, StatusViewer};

/// Errors surfaced by the playback engine
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// The collection had nothing to play
    #[error("Status collection is empty")]
    EmptyCollection,

    /// The session already ended
    #[error("Playback session is closed")]
    SessionClosed,

    /// Only the author may delete their statuses
    #[error("Status belongs to another user")]
    NotOwner,

    /// Index no longer points at a status
    #[error("No current status")]
    NoCurrentStatus,

    /// Deleting failed; playback was left untouched
    #[error("Failed to delete status {status_id}: {source}")]
    Delete {
        status_id: StatusId,
        #[source]
        source: ServiceError,
    },

    /// Fetching the collection failed
    #[error("Failed to fetch statuses: {0}")]
    Fetch(#[source] ServiceError),

    /// Reply affordance is not available for this status
    #[error("Reply unavailable: {0}")]
    ReplyUnavailable(String),

    /// Timings that cannot produce a deterministic duration
    #[error("Invalid playback configuration: {0}")]
    InvalidConfig(String),
}

/// Timing parameters for a playback session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Period of the tick timer (in milliseconds)
    pub tick_period_ms: u64,

    /// How long one status stays on screen (in milliseconds)
    pub status_duration_ms: u64,

    /// Minimum press length that counts as a hold (in milliseconds)
    pub hold_threshold_ms: u64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            tick_period_ms: 100,
            status_duration_ms: 5_000, // 2% per tick
            hold_threshold_ms: 200,
        }
    }
}

impl PlaybackConfig {
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }

    pub fn status_duration(&self) -> Duration {
        Duration::from_millis(self.status_duration_ms)
    }

    pub fn hold_threshold(&self) -> Duration {
        Duration::from_millis(self.hold_threshold_ms)
    }

    /// Number of unpaused ticks a status stays current, rounded up.
    pub fn ticks_per_status(&self) -> u32 {
        if self.tick_period_ms == 0 {
            return 1;
        }
        let ticks = self.status_duration_ms.div_ceil(self.tick_period_ms);
        ticks.clamp(1, u32::MAX as u64) as u32
    }

    pub fn validate(&self) -> Result<(), PlaybackError> {
        if self.tick_period_ms == 0 {
            return Err(PlaybackError::InvalidConfig("tick period must be positive".into()));
        }
        if self.status_duration_ms < self.tick_period_ms {
            return Err(PlaybackError::InvalidConfig(format!(
                "status duration {}ms is shorter than one tick ({}ms)",
                self.status_duration_ms, self.tick_period_ms
            )));
        }
        Ok(())
    }
}
