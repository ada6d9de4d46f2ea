// src/services/mod.rs
//! Collaborators the playback engine talks to
//!
//! The engine never reaches the network or the navigation stack directly.
//! It goes through these traits so sessions can be driven by the REST API,
//! a fixture file, or test doubles.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{StatusCollection, StatusId, UserId};

pub mod fixture;
pub mod rest;

pub use fixture::FixtureStatusService;
pub use rest::RestStatusService;

/// Errors reported by status collaborators
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Transport failure before a response arrived
    #[error("Network error: {0}")]
    Network(String),

    /// Server answered with a non-success status
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// Status or author does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Payload could not be decoded
    #[error("Decoding error: {0}")]
    Decode(String),

    /// Local storage failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// Status data source and sink
#[async_trait]
pub trait StatusService: Send + Sync {
    /// All authors with active statuses.
    async fn fetch_feed(&self) -> ServiceResult<Vec<StatusCollection>>;

    /// One author's statuses; `None` means the viewer must not open.
    async fn fetch_statuses_for_user(&self, user_id: UserId) -> ServiceResult<Option<StatusCollection>> {
        let feed = self.fetch_feed().await?;
        Ok(feed
            .into_iter()
            .find(|c| c.user.id == user_id)
            .filter(|c| !c.is_empty()))
    }

    async fn record_view(&self, status_id: StatusId) -> ServiceResult<()>;

    async fn delete_status(&self, status_id: StatusId) -> ServiceResult<()>;
}

/// Messaging side of the reply affordance
#[async_trait]
pub trait ReplySender: Send + Sync {
    async fn send_reply(&self, author_id: UserId, status_id: StatusId, text: &str) -> ServiceResult<()>;
}

/// Pops the viewer off the navigation stack
pub trait Navigator: Send + Sync {
    fn go_back(&self);
}
