// src/playback/session.rs
//! Playback session lifecycle
//!
//! A [`PlaybackSession`] is created when the viewer opens an author's
//! statuses and is never reused for another author. It owns the only tick
//! timer; teardown aborts that timer before touching anything else. Every
//! command runs synchronously under the session lock, so the state seen by
//! the next tick always reflects the latest command.

use log::{debug, error, info, warn};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use uuid::Uuid;

use super::controller::{Direction, PlaybackController, PlaybackMark, PlaybackState, Transition};
use super::gestures::{GestureCommand, GestureMapper, TapZone};
use super::recorder::ViewRecorder;
use super::reply::{OwnerPanel, ReplyComposer, ViewerRole};
use super::{PlaybackConfig, PlaybackError};
use crate::models::{Status, StatusAuthor, StatusCollection, StatusId, UserId};
use crate::services::{Navigator, ReplySender, StatusService};

/// External collaborators a session reports to
#[derive(Clone)]
pub struct Collaborators {
    pub statuses: Arc<dyn StatusService>,
    pub replies: Arc<dyn ReplySender>,
    pub navigator: Arc<dyn Navigator>,
}

/// Render-ready view of a session
#[derive(Debug, Clone)]
pub struct PlaybackSnapshot {
    pub author: StatusAuthor,
    pub status: Option<Status>,
    pub current_index: usize,
    pub total: usize,
    pub progress: u8,
    pub state: PlaybackState,
    pub role: ViewerRole,
    pub reply_open: bool,
    pub owner_panel: Option<OwnerPanel>,
}

struct SessionCore {
    controller: PlaybackController,
    recorder: ViewRecorder,
    gestures: GestureMapper,
    composer: ReplyComposer,
    /// Position when the current press started
    press_mark: Option<PlaybackMark>,
}

impl SessionCore {
    /// Applies the effects of a transition that belong under the lock.
    /// Returns true when the session just closed.
    fn settle(&mut self, transition: Transition) -> bool {
        match transition {
            Transition::None => false,
            Transition::Entered { status_id, .. } => {
                self.recorder.record(status_id);
                false
            }
            Transition::Closed => {
                self.composer.cancel();
                self.gestures.cancel();
                self.press_mark = None;
                true
            }
        }
    }

    fn apply(&mut self, command: GestureCommand) -> Transition {
        match command {
            GestureCommand::Previous => self.controller.advance(Direction::Previous),
            GestureCommand::Next => self.controller.advance(Direction::Next),
            GestureCommand::Pause => {
                match self.press_mark.take() {
                    Some(mark) => self.controller.pause_from(mark),
                    None => self.controller.pause(),
                }
                Transition::None
            }
            GestureCommand::Resume => {
                self.controller.resume();
                Transition::None
            }
            GestureCommand::Close => self.controller.close(),
        }
    }
}

fn lock_core(core: &Mutex<SessionCore>) -> MutexGuard<'_, SessionCore> {
    core.lock().unwrap_or_else(|e| e.into_inner())
}

fn spawn_ticker(
    session_id: Uuid,
    shared: Arc<Mutex<SessionCore>>,
    period: Duration,
    navigator: Arc<dyn Navigator>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = interval_at(Instant::now() + period, period);
        // A stalled runtime must not replay missed ticks as a burst
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            let closed = {
                let mut core = lock_core(&shared);
                if core.controller.is_closed() {
                    break;
                }
                if let Some(command) = core.gestures.poll(Instant::now().into_std()) {
                    let transition = core.apply(command);
                    core.settle(transition);
                }
                let transition = core.controller.tick();
                core.settle(transition)
            };

            if closed {
                info!("Session {} played its last status", session_id);
                navigator.go_back();
                break;
            }
        }
        debug!("Tick loop for session {} stopped", session_id);
    })
}

pub struct PlaybackSession {
    id: Uuid,
    role: ViewerRole,
    author_id: UserId,
    core: Arc<Mutex<SessionCore>>,
    ticker: Mutex<Option<JoinHandle<()>>>,
    collaborators: Collaborators,
}

impl PlaybackSession {
    /// Starts playback at the first status and reports it viewed.
    /// Must be called from within a Tokio runtime.
    pub fn start(
        collection: StatusCollection,
        role: ViewerRole,
        config: &PlaybackConfig,
        collaborators: Collaborators,
    ) -> Result<Self, PlaybackError> {
        let author_id = collection.user.id;
        let controller = PlaybackController::new(collection, config)?;
        let mut core = SessionCore {
            controller,
            recorder: ViewRecorder::new(collaborators.statuses.clone()),
            gestures: GestureMapper::new(config.hold_threshold()),
            composer: ReplyComposer::new(),
            press_mark: None,
        };
        if let Some(first) = core.controller.current_status().map(|s| s.id) {
            core.recorder.record(first);
        }

        let id = Uuid::new_v4();
        let core = Arc::new(Mutex::new(core));
        let ticker = spawn_ticker(id, core.clone(), config.tick_period(), collaborators.navigator.clone());
        info!("Started playback session {} for user {} ({:?})", id, author_id, role);

        Ok(Self {
            id,
            role,
            author_id,
            core,
            ticker: Mutex::new(Some(ticker)),
            collaborators,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn role(&self) -> ViewerRole {
        self.role
    }

    pub fn author_id(&self) -> UserId {
        self.author_id
    }

    fn lock(&self) -> MutexGuard<'_, SessionCore> {
        lock_core(&self.core)
    }

    pub fn is_closed(&self) -> bool {
        self.lock().controller.is_closed()
    }

    pub fn progress(&self) -> u8 {
        self.lock().controller.progress()
    }

    pub fn current_index(&self) -> usize {
        self.lock().controller.current_index()
    }

    pub fn current_status_id(&self) -> Option<StatusId> {
        self.lock().controller.current_status().map(|s| s.id)
    }

    pub fn state(&self) -> PlaybackState {
        self.lock().controller.state()
    }

    /// Whether the tick loop is still alive.
    pub fn is_ticking(&self) -> bool {
        self.ticker
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(|t| !t.is_finished())
            .unwrap_or(false)
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        let core = self.lock();
        let controller = &core.controller;
        let status = controller.current_status().cloned();
        let owner_panel = match self.role {
            ViewerRole::Owner => status.as_ref().map(OwnerPanel::for_status),
            ViewerRole::Visitor => None,
        };
        PlaybackSnapshot {
            author: controller.collection().user.clone(),
            status,
            current_index: controller.current_index(),
            total: controller.collection().len(),
            progress: controller.progress(),
            state: controller.state(),
            role: self.role,
            reply_open: core.composer.is_open(),
            owner_panel,
        }
    }

    /// Runs one command under the lock, then navigates if it ended the session.
    fn run<F>(&self, f: F) -> Transition
    where
        F: FnOnce(&mut SessionCore) -> Transition,
    {
        let (transition, closed) = {
            let mut core = self.lock();
            let transition = f(&mut core);
            if transition == Transition::Closed {
                self.cancel_ticker();
            }
            let closed = core.settle(transition);
            (transition, closed)
        };
        if closed {
            info!("Session {} closed", self.id);
            self.collaborators.navigator.go_back();
        }
        transition
    }

    fn cancel_ticker(&self) -> bool {
        let handle = self.ticker.lock().unwrap_or_else(|e| e.into_inner()).take();
        match handle {
            Some(handle) => {
                handle.abort();
                debug!("Cancelled tick loop for session {}", self.id);
                true
            }
            None => false,
        }
    }

    pub fn advance(&self, direction: Direction) -> Transition {
        self.run(|core| core.controller.advance(direction))
    }

    /// Manual pause. Holds and replies pause and resume on their own and
    /// never lift this one.
    pub fn pause(&self) {
        self.lock().controller.set_suspended(true);
    }

    pub fn resume(&self) {
        self.lock().controller.set_suspended(false);
    }

    pub fn is_suspended(&self) -> bool {
        self.lock().controller.is_suspended()
    }

    /// Applies a gesture command. `Close` goes through [`Self::close`].
    pub fn dispatch(&self, command: GestureCommand) -> Transition {
        if command == GestureCommand::Close {
            return self.close();
        }
        self.run(|core| core.apply(command))
    }

    pub fn press(&self, zone: TapZone) -> Transition {
        let now = Instant::now().into_std();
        self.run(|core| {
            let command = core.gestures.press(zone, now);
            let transition = match command {
                Some(command) => core.apply(command),
                None => Transition::None,
            };
            core.press_mark = Some(core.controller.mark());
            transition
        })
    }

    pub fn release(&self) -> Transition {
        let now = Instant::now().into_std();
        self.run(|core| {
            core.press_mark = None;
            match core.gestures.release(now) {
                Some(command) => core.apply(command),
                None => Transition::None,
            }
        })
    }

    pub fn swipe_down(&self) -> Transition {
        let command = self.lock().gestures.swipe_down();
        self.dispatch(command)
    }

    /// Close button: stop the timer, then leave the viewer.
    pub fn close(&self) -> Transition {
        self.cancel_ticker();
        self.run(|core| core.controller.close())
    }

    /// Screen is going away on its own; stop everything without navigating.
    pub fn unmount(&self) {
        self.cancel_ticker();
        let mut core = self.lock();
        if core.controller.close() == Transition::Closed {
            core.composer.cancel();
            core.gestures.cancel();
            info!("Session {} unmounted", self.id);
        }
    }

    pub fn open_reply(&self) -> Result<(), PlaybackError> {
        if self.role == ViewerRole::Owner {
            return Err(PlaybackError::ReplyUnavailable("cannot reply to your own status".into()));
        }
        let mut core = self.lock();
        if core.controller.is_closed() {
            return Err(PlaybackError::SessionClosed);
        }
        if core.composer.open() {
            debug!("Reply composer opened on status {:?}", core.controller.current_status().map(|s| s.id));
        }
        core.controller.set_awaiting_reply(true);
        Ok(())
    }

    pub fn update_reply(&self, text: &str) {
        self.lock().composer.set_draft(text);
    }

    pub fn cancel_reply(&self) -> bool {
        let mut core = self.lock();
        let was_open = core.composer.cancel();
        core.controller.set_awaiting_reply(false);
        was_open
    }

    /// Hands the reply to the messaging collaborator and resumes playback.
    /// Returns whether anything was sent; blank replies just close the composer.
    pub fn send_reply(&self, text: &str) -> Result<bool, PlaybackError> {
        let (reply, status_id) = {
            let mut core = self.lock();
            if !core.composer.is_open() {
                return Err(PlaybackError::ReplyUnavailable("reply composer is not open".into()));
            }
            core.composer.set_draft(text);
            let reply = core.composer.take_for_send();
            core.controller.set_awaiting_reply(false);
            (reply, core.controller.current_status().map(|s| s.id))
        };

        let (Some(reply), Some(status_id)) = (reply, status_id) else {
            return Ok(false);
        };

        let replies = self.collaborators.replies.clone();
        let author_id = self.author_id;
        tokio::spawn(async move {
            match replies.send_reply(author_id, status_id, &reply).await {
                Ok(()) => debug!("Reply to status {} sent", status_id),
                Err(e) => warn!("Failed to send reply to status {}: {}", status_id, e),
            }
        });
        Ok(true)
    }

    /// Deletes the current status. On failure nothing changes so the user can retry.
    pub async fn delete_current(&self) -> Result<Transition, PlaybackError> {
        let status_id = {
            let core = self.lock();
            if core.controller.is_closed() {
                return Err(PlaybackError::SessionClosed);
            }
            if self.role != ViewerRole::Owner {
                return Err(PlaybackError::NotOwner);
            }
            core.controller
                .current_status()
                .map(|s| s.id)
                .ok_or(PlaybackError::NoCurrentStatus)?
        };

        info!("Deleting status {} from session {}", status_id, self.id);
        if let Err(source) = self.collaborators.statuses.delete_status(status_id).await {
            error!("Failed to delete status {}: {}", status_id, source);
            return Err(PlaybackError::Delete { status_id, source });
        }
        Ok(self.run(|core| core.controller.remove(status_id)))
    }
}

impl Drop for PlaybackSession {
    fn drop(&mut self) {
        self.cancel_ticker();
    }
}

/// Entry point of the status screen. Holds at most one live session.
pub struct StatusViewer {
    collaborators: Collaborators,
    config: PlaybackConfig,
    me: Option<UserId>,
    session: Option<PlaybackSession>,
}

impl StatusViewer {
    pub fn new(collaborators: Collaborators, config: PlaybackConfig, me: Option<UserId>) -> Self {
        Self { collaborators, config, me, session: None }
    }

    /// Fetches an author's statuses and opens them. `Ok(None)` when there is
    /// nothing to show.
    pub async fn open(&mut self, author_id: UserId) -> Result<Option<&PlaybackSession>, PlaybackError> {
        let collection = self
            .collaborators
            .statuses
            .fetch_statuses_for_user(author_id)
            .await
            .map_err(PlaybackError::Fetch)?;

        match collection {
            Some(collection) if !collection.is_empty() => self.open_collection(collection).map(Some),
            _ => {
                info!("User {} has no active statuses", author_id);
                Ok(None)
            }
        }
    }

    /// Replaces any current session; the old timer is gone before the new one starts.
    pub fn open_collection(&mut self, collection: StatusCollection) -> Result<&PlaybackSession, PlaybackError> {
        if let Some(previous) = self.session.take() {
            previous.unmount();
        }
        let role = ViewerRole::for_author(collection.user.id, self.me);
        let session = PlaybackSession::start(collection, role, &self.config, self.collaborators.clone())?;
        Ok(self.session.insert(session))
    }

    pub fn session(&self) -> Option<&PlaybackSession> {
        self.session.as_ref()
    }

    /// The current session if it has not ended.
    pub fn active(&self) -> Option<&PlaybackSession> {
        self.session.as_ref().filter(|s| !s.is_closed())
    }

    pub fn close(&mut self) {
        if let Some(session) = self.session.take() {
            session.close();
        }
    }

    pub fn unmount(&mut self) {
        if let Some(session) = self.session.take() {
            session.unmount();
        }
    }
}
