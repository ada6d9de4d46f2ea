// Common test utilities for integration tests
// Test doubles for the playback collaborators plus status builders
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use log::LevelFilter;

use statusreel::models::{
    AuthorProfile, MediaType, Status, StatusAuthor, StatusCollection, StatusId, UserId,
};
use statusreel::playback::{Collaborators, PlaybackConfig};
use statusreel::services::{Navigator, ReplySender, ServiceError, ServiceResult, StatusService};

// Initialize logging once
static INIT_LOGGER: Once = Once::new();

/// Set up the logger for the tests
pub fn setup_logging() {
    INIT_LOGGER.call_once(|| {
        let _ = env_logger::Builder::new()
            .filter_level(LevelFilter::Debug)
            .is_test(true)
            .try_init();
    });
}

/// Status service that remembers every call
#[derive(Default)]
pub struct MockStatusService {
    feed: Mutex<Vec<StatusCollection>>,
    views: Arc<Mutex<Vec<StatusId>>>,
    deletes: Arc<Mutex<Vec<StatusId>>>,
    fail_deletes: AtomicBool,
}

impl MockStatusService {
    pub fn with_feed(feed: Vec<StatusCollection>) -> Self {
        Self {
            feed: Mutex::new(feed),
            ..Default::default()
        }
    }

    pub fn recorded_views(&self) -> Vec<StatusId> {
        self.views.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<StatusId> {
        self.deletes.lock().unwrap().clone()
    }

    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl StatusService for MockStatusService {
    async fn fetch_feed(&self) -> ServiceResult<Vec<StatusCollection>> {
        Ok(self.feed.lock().unwrap().clone())
    }

    async fn record_view(&self, status_id: StatusId) -> ServiceResult<()> {
        self.views.lock().unwrap().push(status_id);
        Ok(())
    }

    async fn delete_status(&self, status_id: StatusId) -> ServiceResult<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(ServiceError::Http {
                status: 500,
                message: "internal server error".into(),
            });
        }
        self.deletes.lock().unwrap().push(status_id);
        for collection in self.feed.lock().unwrap().iter_mut() {
            collection.remove(status_id);
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MockReplySender {
    sent: Arc<Mutex<Vec<(UserId, StatusId, String)>>>,
}

impl MockReplySender {
    pub fn sent(&self) -> Vec<(UserId, StatusId, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReplySender for MockReplySender {
    async fn send_reply(&self, author_id: UserId, status_id: StatusId, text: &str) -> ServiceResult<()> {
        self.sent.lock().unwrap().push((author_id, status_id, text.to_string()));
        Ok(())
    }
}

#[derive(Default)]
pub struct MockNavigator {
    back_calls: AtomicUsize,
}

impl MockNavigator {
    pub fn back_calls(&self) -> usize {
        self.back_calls.load(Ordering::SeqCst)
    }
}

impl Navigator for MockNavigator {
    fn go_back(&self) {
        self.back_calls.fetch_add(1, Ordering::SeqCst);
    }
}

/// Mocks wired together as session collaborators
pub struct Harness {
    pub statuses: Arc<MockStatusService>,
    pub replies: Arc<MockReplySender>,
    pub navigator: Arc<MockNavigator>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_feed(Vec::new())
    }

    pub fn with_feed(feed: Vec<StatusCollection>) -> Self {
        setup_logging();
        Self {
            statuses: Arc::new(MockStatusService::with_feed(feed)),
            replies: Arc::new(MockReplySender::default()),
            navigator: Arc::new(MockNavigator::default()),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            statuses: self.statuses.clone(),
            replies: self.replies.clone(),
            navigator: self.navigator.clone(),
        }
    }
}

pub fn text_status(id: StatusId, minute: u32) -> Status {
    Status {
        id,
        content: Some(format!("status {}", id)),
        media_url: None,
        media_type: MediaType::Text,
        background_color: None,
        created_at: Utc.with_ymd_and_hms(2024, 5, 1, 9, minute, 0).unwrap(),
        view_count: 0,
    }
}

pub fn image_status(id: StatusId, minute: u32) -> Status {
    Status {
        media_url: Some(format!("/media/status/{}.jpg", id)),
        media_type: MediaType::Image,
        ..text_status(id, minute)
    }
}

pub fn collection(user_id: UserId, username: &str, statuses: Vec<Status>) -> StatusCollection {
    StatusCollection {
        user: StatusAuthor {
            id: user_id,
            username: username.to_string(),
            profile: AuthorProfile::default(),
        },
        unviewed_count: statuses.len() as u32,
        statuses,
    }
}

/// 100ms ticks, 5s per status
pub fn config() -> PlaybackConfig {
    PlaybackConfig::default()
}

/// Moves the paused clock off the tick grid. Call once right after starting a session.
pub async fn half_tick(config: &PlaybackConfig) {
    tokio::time::sleep(config.tick_period() / 2).await;
}

/// Moves the paused clock by whole timer periods, so exactly `ticks` ticks fire.
pub async fn advance_ticks(config: &PlaybackConfig, ticks: u32) {
    tokio::time::sleep(config.tick_period() * ticks).await;
}

/// Lets fire-and-forget tasks finish.
pub async fn settle() {
    for _ in 0..5 {
        tokio::task::yield_now().await;
    }
}
