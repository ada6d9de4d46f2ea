// src/playback/controller.rs
//! Playback state machine
//!
//! Owns the current index, elapsed progress and pause flags for one session.
//! It has no timer of its own: the session calls [`PlaybackController::tick`]
//! on every period, and every operation returns a [`Transition`] telling the
//! caller whether a new status became current or the viewer must close.

use log::debug;

use super::{PlaybackConfig, PlaybackError};
use crate::models::{Status, StatusCollection, StatusId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Next,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseReason {
    /// Long-press on the content area
    Hold,
    /// Reply composer is open
    Reply,
    /// Paused from the keyboard or while a dialog is up
    Manual,
}

/// Playback position captured when a press starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackMark {
    index: usize,
    elapsed_ticks: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Playing,
    Paused(PauseReason),
    Closed,
}

/// Observable outcome of a controller operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Nothing besides progress changed
    None,
    /// A status became current
    Entered { index: usize, status_id: StatusId },
    /// The session ended and the viewer must go back
    Closed,
}

pub struct PlaybackController {
    collection: StatusCollection,
    current_index: usize,
    elapsed_ticks: u32,
    ticks_per_status: u32,
    paused: bool,
    suspended: bool,
    awaiting_reply: bool,
    closed: bool,
}

impl PlaybackController {
    /// Creates a controller positioned on the first status.
    pub fn new(collection: StatusCollection, config: &PlaybackConfig) -> Result<Self, PlaybackError> {
        config.validate()?;
        if collection.is_empty() {
            return Err(PlaybackError::EmptyCollection);
        }
        Ok(Self {
            collection,
            current_index: 0,
            elapsed_ticks: 0,
            ticks_per_status: config.ticks_per_status(),
            paused: false,
            suspended: false,
            awaiting_reply: false,
            closed: false,
        })
    }

    pub fn collection(&self) -> &StatusCollection {
        &self.collection
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// Current status, or `None` once the index no longer points at one.
    pub fn current_status(&self) -> Option<&Status> {
        if self.closed {
            return None;
        }
        self.collection.get(self.current_index)
    }

    /// Progress through the current status, 0..=100.
    pub fn progress(&self) -> u8 {
        let pct = (self.elapsed_ticks as u64 * 100) / self.ticks_per_status as u64;
        pct.min(100) as u8
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    pub fn is_awaiting_reply(&self) -> bool {
        self.awaiting_reply
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn state(&self) -> PlaybackState {
        if self.closed {
            PlaybackState::Closed
        } else if self.awaiting_reply {
            PlaybackState::Paused(PauseReason::Reply)
        } else if self.suspended {
            PlaybackState::Paused(PauseReason::Manual)
        } else if self.paused {
            PlaybackState::Paused(PauseReason::Hold)
        } else {
            PlaybackState::Playing
        }
    }

    /// One timer period. Progress only moves while playing.
    pub fn tick(&mut self) -> Transition {
        if let Some(end) = self.check_bounds() {
            return end;
        }
        if self.paused || self.suspended || self.awaiting_reply {
            return Transition::None;
        }

        self.elapsed_ticks += 1;
        if self.elapsed_ticks >= self.ticks_per_status {
            return self.step_forward();
        }
        Transition::None
    }

    /// Explicit tap navigation. Previous at the first status is a no-op.
    pub fn advance(&mut self, direction: Direction) -> Transition {
        if let Some(end) = self.check_bounds() {
            return end;
        }
        match direction {
            Direction::Next => self.step_forward(),
            Direction::Previous => {
                if self.current_index == 0 {
                    return Transition::None;
                }
                self.enter(self.current_index - 1)
            }
        }
    }

    pub fn pause(&mut self) {
        if !self.closed && !self.paused {
            debug!("Playback paused at {}% of status {}", self.progress(), self.current_index);
            self.paused = true;
        }
    }

    pub fn resume(&mut self) {
        if self.paused {
            debug!("Playback resumed at {}% of status {}", self.progress(), self.current_index);
            self.paused = false;
        }
    }

    pub fn mark(&self) -> PlaybackMark {
        PlaybackMark { index: self.current_index, elapsed_ticks: self.elapsed_ticks }
    }

    /// Hold pause that takes effect from `mark`. Ticks that ran between the
    /// press and the hold being recognised are given back, unless playback
    /// has since moved to another status.
    pub fn pause_from(&mut self, mark: PlaybackMark) {
        if self.closed {
            return;
        }
        if mark.index == self.current_index && mark.elapsed_ticks < self.elapsed_ticks {
            self.elapsed_ticks = mark.elapsed_ticks;
        }
        self.pause();
    }

    /// Manual pause, independent of holds and the reply composer.
    pub fn set_suspended(&mut self, suspended: bool) {
        if self.closed {
            return;
        }
        if self.suspended != suspended {
            debug!("Playback {} at {}%", if suspended { "suspended" } else { "unsuspended" }, self.progress());
        }
        self.suspended = suspended;
    }

    pub fn set_awaiting_reply(&mut self, awaiting: bool) {
        if self.closed {
            return;
        }
        self.awaiting_reply = awaiting;
    }

    /// Removes a deleted status and re-evaluates bounds.
    ///
    /// Removing the current status moves to the status that followed it, or
    /// closes the viewer when it was the last one.
    pub fn remove(&mut self, status_id: StatusId) -> Transition {
        let Some(removed) = self.collection.remove(status_id) else {
            return Transition::None;
        };
        debug!("Removed status {} at index {}", status_id, removed);
        if self.closed {
            return Transition::None;
        }

        if self.collection.is_empty() {
            return self.close();
        }
        if removed < self.current_index {
            self.current_index -= 1;
            return Transition::None;
        }
        if removed > self.current_index {
            return Transition::None;
        }
        if self.current_index >= self.collection.len() {
            return self.close();
        }
        self.enter(self.current_index)
    }

    /// Ends the session. Only the first call reports [`Transition::Closed`].
    pub fn close(&mut self) -> Transition {
        if self.closed {
            return Transition::None;
        }
        debug!("Playback closed at index {}", self.current_index);
        self.closed = true;
        self.paused = false;
        self.suspended = false;
        self.awaiting_reply = false;
        Transition::Closed
    }

    fn check_bounds(&mut self) -> Option<Transition> {
        if self.closed {
            return Some(Transition::None);
        }
        if self.current_index >= self.collection.len() {
            return Some(self.close());
        }
        None
    }

    fn step_forward(&mut self) -> Transition {
        if self.current_index + 1 >= self.collection.len() {
            return self.close();
        }
        self.enter(self.current_index + 1)
    }

    fn enter(&mut self, index: usize) -> Transition {
        self.current_index = index;
        self.elapsed_ticks = 0;
        match self.collection.get(index) {
            Some(status) => {
                debug!("Status {} is now current (index {})", status.id, index);
                Transition::Entered { index, status_id: status.id }
            }
            None => self.close(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AuthorProfile, MediaType, StatusAuthor};
    use chrono::Utc;

    fn collection(ids: &[StatusId]) -> StatusCollection {
        StatusCollection {
            user: StatusAuthor { id: 1, username: "seller".into(), profile: AuthorProfile::default() },
            statuses: ids
                .iter()
                .map(|id| Status {
                    id: *id,
                    content: Some("hello".into()),
                    media_url: None,
                    media_type: MediaType::Text,
                    background_color: None,
                    created_at: Utc::now(),
                    view_count: 0,
                })
                .collect(),
            unviewed_count: ids.len() as u32,
        }
    }

    fn controller(ids: &[StatusId]) -> PlaybackController {
        PlaybackController::new(collection(ids), &PlaybackConfig::default()).unwrap()
    }

    fn tick_n(c: &mut PlaybackController, n: usize) -> Vec<Transition> {
        (0..n).map(|_| c.tick()).filter(|t| *t != Transition::None).collect()
    }

    #[test]
    fn test_empty_collection_rejected() {
        let result = PlaybackController::new(collection(&[]), &PlaybackConfig::default());
        assert!(matches!(result, Err(PlaybackError::EmptyCollection)));
    }

    #[test]
    fn test_tick_advances_two_percent() {
        let mut c = controller(&[1, 2]);
        assert_eq!(c.tick(), Transition::None);
        assert_eq!(c.progress(), 2);
        tick_n(&mut c, 19);
        assert_eq!(c.progress(), 40);
    }

    #[test]
    fn test_completion_moves_to_next_and_resets() {
        let mut c = controller(&[1, 2]);
        let transitions = tick_n(&mut c, 50);
        assert_eq!(transitions, vec![Transition::Entered { index: 1, status_id: 2 }]);
        assert_eq!(c.current_index(), 1);
        assert_eq!(c.progress(), 0);
    }

    #[test]
    fn test_completion_of_last_closes_once() {
        let mut c = controller(&[1]);
        let transitions = tick_n(&mut c, 80);
        assert_eq!(transitions, vec![Transition::Closed]);
        assert!(c.is_closed());
        assert_eq!(c.current_status(), None);
    }

    #[test]
    fn test_paused_ticks_leave_progress_unchanged() {
        let mut c = controller(&[1, 2]);
        tick_n(&mut c, 20);
        c.pause();
        tick_n(&mut c, 100);
        assert_eq!(c.progress(), 40);
        assert_eq!(c.state(), PlaybackState::Paused(PauseReason::Hold));
        c.resume();
        assert_eq!(c.progress(), 40);
        c.tick();
        assert_eq!(c.progress(), 42);
    }

    #[test]
    fn test_pause_then_resume_keeps_progress() {
        let mut c = controller(&[1]);
        tick_n(&mut c, 7);
        let before = c.progress();
        c.pause();
        c.resume();
        assert_eq!(c.progress(), before);
    }

    #[test]
    fn test_pause_from_mark_gives_back_threshold_ticks() {
        let mut c = controller(&[1, 2]);
        tick_n(&mut c, 20);
        let mark = c.mark();
        tick_n(&mut c, 2);
        assert_eq!(c.progress(), 44);
        c.pause_from(mark);
        assert_eq!(c.progress(), 40);
        tick_n(&mut c, 20);
        c.resume();
        assert_eq!(c.progress(), 40);
    }

    #[test]
    fn test_pause_from_stale_mark_keeps_new_status() {
        let mut c = controller(&[1, 2]);
        tick_n(&mut c, 49);
        let mark = c.mark();
        tick_n(&mut c, 2);
        assert_eq!(c.current_index(), 1);
        c.pause_from(mark);
        assert_eq!(c.progress(), 2);
        assert_eq!(c.state(), PlaybackState::Paused(PauseReason::Hold));
    }

    #[test]
    fn test_manual_pause_survives_hold_release() {
        let mut c = controller(&[1, 2]);
        tick_n(&mut c, 10);
        c.set_suspended(true);
        c.pause();
        c.resume();
        assert_eq!(c.state(), PlaybackState::Paused(PauseReason::Manual));
        tick_n(&mut c, 30);
        assert_eq!(c.progress(), 20);
        c.set_suspended(false);
        assert_eq!(c.state(), PlaybackState::Playing);
        c.tick();
        assert_eq!(c.progress(), 22);
    }

    #[test]
    fn test_awaiting_reply_pauses() {
        let mut c = controller(&[1, 2]);
        tick_n(&mut c, 5);
        c.set_awaiting_reply(true);
        assert_eq!(c.state(), PlaybackState::Paused(PauseReason::Reply));
        tick_n(&mut c, 60);
        assert_eq!(c.progress(), 10);
        assert_eq!(c.current_index(), 0);
        c.set_awaiting_reply(false);
        assert_eq!(c.state(), PlaybackState::Playing);
    }

    #[test]
    fn test_previous_at_first_is_noop() {
        let mut c = controller(&[1, 2]);
        tick_n(&mut c, 10);
        assert_eq!(c.advance(Direction::Previous), Transition::None);
        assert_eq!(c.current_index(), 0);
        assert_eq!(c.progress(), 20);
    }

    #[test]
    fn test_explicit_navigation_resets_progress() {
        let mut c = controller(&[1, 2, 3]);
        tick_n(&mut c, 10);
        assert_eq!(c.advance(Direction::Next), Transition::Entered { index: 1, status_id: 2 });
        assert_eq!(c.progress(), 0);
        tick_n(&mut c, 10);
        assert_eq!(c.advance(Direction::Previous), Transition::Entered { index: 0, status_id: 1 });
        assert_eq!(c.progress(), 0);
    }

    #[test]
    fn test_next_at_last_closes() {
        let mut c = controller(&[1, 2]);
        c.advance(Direction::Next);
        assert_eq!(c.advance(Direction::Next), Transition::Closed);
        assert_eq!(c.advance(Direction::Next), Transition::None);
        assert_eq!(c.tick(), Transition::None);
    }

    #[test]
    fn test_remove_current_moves_to_following() {
        let mut c = controller(&[1, 2, 3]);
        tick_n(&mut c, 10);
        assert_eq!(c.remove(1), Transition::Entered { index: 0, status_id: 2 });
        assert_eq!(c.progress(), 0);
    }

    #[test]
    fn test_remove_before_current_keeps_status() {
        let mut c = controller(&[1, 2, 3]);
        c.advance(Direction::Next);
        tick_n(&mut c, 5);
        assert_eq!(c.remove(1), Transition::None);
        assert_eq!(c.current_index(), 0);
        assert_eq!(c.current_status().map(|s| s.id), Some(2));
        assert_eq!(c.progress(), 10);
    }

    #[test]
    fn test_remove_last_current_closes() {
        let mut c = controller(&[1, 2]);
        c.advance(Direction::Next);
        assert_eq!(c.remove(2), Transition::Closed);
    }

    #[test]
    fn test_remove_only_status_closes() {
        let mut c = controller(&[1]);
        assert_eq!(c.remove(1), Transition::Closed);
        assert_eq!(c.tick(), Transition::None);
        assert_eq!(c.remove(1), Transition::None);
    }

    #[test]
    fn test_close_is_reported_once() {
        let mut c = controller(&[1]);
        assert_eq!(c.close(), Transition::Closed);
        assert_eq!(c.close(), Transition::None);
        assert_eq!(c.state(), PlaybackState::Closed);
    }
}
