use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type StatusId = u64;
pub type UserId = u64;

/// Background used for text statuses that arrive without a colour.
pub const DEFAULT_BACKGROUND: &str = "#25D366";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    #[default]
    Text,
    Image,
    Video,
}

/// One playable status post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Status {
    pub id: StatusId,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub media_type: MediaType,
    #[serde(default)]
    pub background_color: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub view_count: u64,
}

impl Status {
    /// Text statuses render on a coloured card; media statuses never do.
    pub fn display_background(&self) -> Option<&str> {
        match self.media_type {
            MediaType::Text => Some(self.background_color.as_deref().unwrap_or(DEFAULT_BACKGROUND)),
            MediaType::Image | MediaType::Video => None,
        }
    }

    /// Media URL, if this status renders media rather than text.
    pub fn media(&self) -> Option<&str> {
        match self.media_type {
            MediaType::Text => None,
            MediaType::Image | MediaType::Video => self.media_url.as_deref().filter(|u| !u.is_empty()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AuthorProfile {
    #[serde(default)]
    pub profile_picture: Option<String>,
    #[serde(default)]
    pub shop_slug: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusAuthor {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub profile: AuthorProfile,
}

/// An author's ordered set of active statuses (oldest first).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusCollection {
    pub user: StatusAuthor,
    pub statuses: Vec<Status>,
    #[serde(default)]
    pub unviewed_count: u32,
}

impl StatusCollection {
    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Status> {
        self.statuses.get(index)
    }

    pub fn position(&self, status_id: StatusId) -> Option<usize> {
        self.statuses.iter().position(|s| s.id == status_id)
    }

    /// Drives the "unviewed" ring around an author's avatar.
    pub fn has_unviewed(&self) -> bool {
        self.unviewed_count > 0
    }

    pub fn latest(&self) -> Option<&Status> {
        self.statuses.iter().max_by_key(|s| s.created_at)
    }

    /// Removes exactly one status, returning the index it occupied.
    pub fn remove(&mut self, status_id: StatusId) -> Option<usize> {
        let index = self.position(status_id)?;
        self.statuses.remove(index);
        Some(index)
    }

    /// Puts statuses into creation order; the server does not promise one.
    pub fn sort_by_creation(&mut self) {
        self.statuses.sort_by_key(|s| (s.created_at, s.id));
    }
}

/// Separates the viewer's own collection from everyone else's.
pub fn split_feed(
    feed: Vec<StatusCollection>,
    me: UserId,
) -> (Option<StatusCollection>, Vec<StatusCollection>) {
    let mut mine = None;
    let mut others = Vec::with_capacity(feed.len());
    for collection in feed {
        if collection.user.id == me {
            mine = Some(collection);
        } else {
            others.push(collection);
        }
    }
    (mine, others)
}
