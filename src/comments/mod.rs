use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    anonymity::{Authored, DisplayIdentity, ItemKind},
    profiles::Profile,
};

pub mod handler;
pub mod thread;

pub use thread::CommentThread;

/// Stored comment. Not serializable: it carries the true author id.
#[derive(Debug, Clone, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub is_anonymous: bool,
    pub created_at: DateTime<Utc>,
}

/// Request payload for creating a comment
#[derive(Debug, Deserialize)]
pub struct CreateComment {
    pub content: String,
    #[serde(default)]
    pub is_anonymous: bool,
}

/// Comment content after trimming, checked before anything is written.
#[derive(Debug, Validate)]
pub(crate) struct NewComment {
    #[validate(length(
        min = 1,
        max = 500,
        message = "Comment must be between 1 and 500 characters"
    ))]
    pub content: String,
}

/// Comment joined with its author's profile (absent when anonymous).
#[derive(Debug, Clone)]
pub struct EnrichedComment {
    pub comment: Comment,
    pub author: Option<Profile>,
}

impl Authored for EnrichedComment {
    const KIND: ItemKind = ItemKind::Comment;

    fn author_id(&self) -> Uuid {
        self.comment.author_id
    }

    fn is_anonymous(&self) -> bool {
        self.comment.is_anonymous
    }

    fn author_profile(&self) -> Option<&Profile> {
        self.author.as_ref()
    }
}

impl EnrichedComment {
    pub fn view(&self, viewer: Option<Uuid>) -> CommentResponse {
        CommentResponse {
            id: self.comment.id,
            post_id: self.comment.post_id,
            author: self.display_identity(),
            content: self.comment.content.clone(),
            can_delete: self.can_delete(viewer),
            created_at: self.comment.created_at,
        }
    }
}

/// Response structure for a comment with its displayed author
#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author: DisplayIdentity,
    pub content: String,
    pub can_delete: bool,
    pub created_at: DateTime<Utc>,
}
