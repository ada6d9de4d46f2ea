// JSON-file backed status source for offline use and demos

use async_trait::async_trait;
use log::{debug, info};
use std::path::Path;
use std::sync::Mutex;

use super::{ReplySender, ServiceError, ServiceResult, StatusService};
use crate::models::{StatusCollection, StatusId, UserId};

/// Reply captured by the fixture service
#[derive(Debug, Clone, PartialEq)]
pub struct StoredReply {
    pub author_id: UserId,
    pub status_id: StatusId,
    pub text: String,
}

pub struct FixtureStatusService {
    feed: Mutex<Vec<StatusCollection>>,
    replies: Mutex<Vec<StoredReply>>,
}

impl FixtureStatusService {
    pub fn new(mut feed: Vec<StatusCollection>) -> Self {
        for collection in feed.iter_mut() {
            collection.sort_by_creation();
        }
        Self {
            feed: Mutex::new(feed),
            replies: Mutex::new(Vec::new()),
        }
    }

    pub fn load(path: &Path) -> ServiceResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let feed: Vec<StatusCollection> =
            serde_json::from_str(&contents).map_err(|e| ServiceError::Decode(e.to_string()))?;
        info!("Loaded {} status collections from {}", feed.len(), path.display());
        Ok(Self::new(feed))
    }

    pub fn view_count(&self, status_id: StatusId) -> Option<u64> {
        let feed = self.feed.lock().unwrap_or_else(|e| e.into_inner());
        feed.iter()
            .flat_map(|c| c.statuses.iter())
            .find(|s| s.id == status_id)
            .map(|s| s.view_count)
    }

    pub fn replies(&self) -> Vec<StoredReply> {
        self.replies.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl StatusService for FixtureStatusService {
    async fn fetch_feed(&self) -> ServiceResult<Vec<StatusCollection>> {
        let feed = self.feed.lock().unwrap_or_else(|e| e.into_inner());
        Ok(feed.iter().filter(|c| !c.is_empty()).cloned().collect())
    }

    async fn record_view(&self, status_id: StatusId) -> ServiceResult<()> {
        let mut feed = self.feed.lock().unwrap_or_else(|e| e.into_inner());
        let status = feed
            .iter_mut()
            .flat_map(|c| c.statuses.iter_mut())
            .find(|s| s.id == status_id)
            .ok_or_else(|| ServiceError::NotFound(format!("status {}", status_id)))?;
        status.view_count += 1;
        debug!("Status {} now has {} views", status_id, status.view_count);
        Ok(())
    }

    async fn delete_status(&self, status_id: StatusId) -> ServiceResult<()> {
        let mut feed = self.feed.lock().unwrap_or_else(|e| e.into_inner());
        for collection in feed.iter_mut() {
            if collection.remove(status_id).is_some() {
                return Ok(());
            }
        }
        Err(ServiceError::NotFound(format!("status {}", status_id)))
    }
}

#[async_trait]
impl ReplySender for FixtureStatusService {
    async fn send_reply(&self, author_id: UserId, status_id: StatusId, text: &str) -> ServiceResult<()> {
        self.replies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(StoredReply { author_id, status_id, text: text.to_string() });
        Ok(())
    }
}
