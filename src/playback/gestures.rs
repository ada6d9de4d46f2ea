// src/playback/gestures.rs
//! Tap vs. hold disambiguation
//!
//! `Idle -> Pressed(start) -> Holding`. A press turns into a hold once
//! [`GestureMapper::poll`] observes it outlasting the threshold; only a
//! release that never crossed the threshold counts as a tap. Time is passed
//! in by the caller so the machine can be exercised without timers.

use log::debug;
use std::time::{Duration, Instant};

use super::Direction;

/// Half of the content area a press landed on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapZone {
    Left,
    Right,
}

impl TapZone {
    pub fn from_position(x: f32, width: f32) -> Self {
        if x < width / 2.0 {
            TapZone::Left
        } else {
            TapZone::Right
        }
    }

    pub fn direction(self) -> Direction {
        match self {
            TapZone::Left => Direction::Previous,
            TapZone::Right => Direction::Next,
        }
    }
}

/// Command for the playback controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureCommand {
    Previous,
    Next,
    Pause,
    Resume,
    Close,
}

impl From<Direction> for GestureCommand {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Previous => GestureCommand::Previous,
            Direction::Next => GestureCommand::Next,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GestureState {
    Idle,
    Pressed { started: Instant, zone: TapZone },
    Holding { zone: TapZone },
}

pub struct GestureMapper {
    state: GestureState,
    hold_threshold: Duration,
}

impl GestureMapper {
    pub fn new(hold_threshold: Duration) -> Self {
        Self { state: GestureState::Idle, hold_threshold }
    }

    pub fn is_holding(&self) -> bool {
        matches!(self.state, GestureState::Holding { .. })
    }

    pub fn is_pressed(&self) -> bool {
        !matches!(self.state, GestureState::Idle)
    }

    /// Finger down. A press arriving mid-hold means the release was lost,
    /// so the hold is ended first.
    pub fn press(&mut self, zone: TapZone, now: Instant) -> Option<GestureCommand> {
        let previous = std::mem::replace(&mut self.state, GestureState::Pressed { started: now, zone });
        match previous {
            GestureState::Holding { .. } => {
                debug!("Press during hold; ending previous hold");
                Some(GestureCommand::Resume)
            }
            _ => None,
        }
    }

    /// Promotes a long enough press to a hold.
    pub fn poll(&mut self, now: Instant) -> Option<GestureCommand> {
        if let GestureState::Pressed { started, zone } = self.state {
            if now.saturating_duration_since(started) >= self.hold_threshold {
                debug!("Press on {:?} became a hold", zone);
                self.state = GestureState::Holding { zone };
                return Some(GestureCommand::Pause);
            }
        }
        None
    }

    /// Finger up.
    pub fn release(&mut self, now: Instant) -> Option<GestureCommand> {
        match std::mem::replace(&mut self.state, GestureState::Idle) {
            GestureState::Idle => None,
            GestureState::Holding { .. } => Some(GestureCommand::Resume),
            GestureState::Pressed { started, zone } => {
                if now.saturating_duration_since(started) < self.hold_threshold {
                    Some(zone.direction().into())
                } else {
                    // Held past the threshold without being polled: neither a tap nor a pause
                    debug!("Late release on {:?} ignored", zone);
                    None
                }
            }
        }
    }

    /// Swipe down always closes, whatever the press state.
    pub fn swipe_down(&mut self) -> GestureCommand {
        self.state = GestureState::Idle;
        GestureCommand::Close
    }

    /// Drops any in-flight press, ending a hold if one was active.
    pub fn cancel(&mut self) -> Option<GestureCommand> {
        match std::mem::replace(&mut self.state, GestureState::Idle) {
            GestureState::Holding { .. } => Some(GestureCommand::Resume),
            _ => None,
        }
    }
}
