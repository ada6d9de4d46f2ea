// Reply affordance for other people's statuses, and the owner panel that
// replaces it on your own.

use crate::models::{Status, StatusId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerRole {
    /// Viewing your own statuses: delete + view count
    Owner,
    /// Viewing someone else's: reply
    Visitor,
}

impl ViewerRole {
    pub fn for_author(author_id: UserId, me: Option<UserId>) -> Self {
        match me {
            Some(me) if me == author_id => ViewerRole::Owner,
            _ => ViewerRole::Visitor,
        }
    }
}

/// What the author sees instead of the reply box
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerPanel {
    pub status_id: StatusId,
    pub view_count: u64,
}

impl OwnerPanel {
    pub fn for_status(status: &Status) -> Self {
        Self { status_id: status.id, view_count: status.view_count }
    }

    pub fn label(&self) -> String {
        match self.view_count {
            1 => "1 view".to_string(),
            n => format!("{} views", n),
        }
    }
}

#[derive(Debug, Default)]
pub struct ReplyComposer {
    draft: Option<String>,
}

impl ReplyComposer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.draft.is_some()
    }

    pub fn draft(&self) -> Option<&str> {
        self.draft.as_deref()
    }

    /// Returns false when already open.
    pub fn open(&mut self) -> bool {
        if self.draft.is_some() {
            return false;
        }
        self.draft = Some(String::new());
        true
    }

    pub fn set_draft(&mut self, text: &str) {
        if let Some(draft) = self.draft.as_mut() {
            draft.clear();
            draft.push_str(text);
        }
    }

    /// Closes without sending. Returns whether it was open.
    pub fn cancel(&mut self) -> bool {
        self.draft.take().is_some()
    }

    /// Closes the composer and hands back the text worth sending, if any.
    pub fn take_for_send(&mut self) -> Option<String> {
        let text = self.draft.take()?;
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}
