use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    anonymity::{Authored, DisplayIdentity, ItemKind},
    profiles::Profile,
    reactions::{self, Reaction, ReactionSummary},
    tags::{self, HobbyTag},
};

pub mod handler;
pub mod service;
pub mod timeline;

pub use service::PostService;
pub use timeline::{
    Cursor, FeedFilter, Page, PageRequest, PageResponse, TimelineAssembler, TimelineState,
};

/// Stored post. Not serializable: it carries the true author id.
#[derive(Debug, Clone, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub is_anonymous: bool,
    #[serde(default, deserialize_with = "tags::known_tags")]
    pub hobby_tags: Vec<HobbyTag>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePost {
    pub content: String,
    #[serde(default)]
    pub is_anonymous: bool,
    #[serde(default)]
    pub hobby_tags: Vec<String>,
}

/// Post content after trimming, checked before anything is written.
#[derive(Debug, Validate)]
pub(crate) struct NewPost {
    #[validate(length(
        min = 1,
        max = 2000,
        message = "Post must be between 1 and 2000 characters"
    ))]
    pub content: String,
    pub is_anonymous: bool,
    pub hobby_tags: Vec<HobbyTag>,
}

/// A timeline row: the post, its author (absent when anonymous), every
/// reaction row on it and its comment total.
#[derive(Debug, Clone)]
pub struct EnrichedPost {
    pub post: Post,
    pub author: Option<Profile>,
    pub reactions: Vec<Reaction>,
    pub comment_count: usize,
}

impl Authored for EnrichedPost {
    const KIND: ItemKind = ItemKind::Post;

    fn author_id(&self) -> Uuid {
        self.post.author_id
    }

    fn is_anonymous(&self) -> bool {
        self.post.is_anonymous
    }

    fn author_profile(&self) -> Option<&Profile> {
        self.author.as_ref()
    }
}

impl EnrichedPost {
    pub fn id(&self) -> Uuid {
        self.post.id
    }

    /// Render-facing projection for `viewer`, with anonymity applied.
    pub fn view(&self, viewer: Option<Uuid>) -> PostResponse {
        PostResponse {
            id: self.post.id,
            author: self.display_identity(),
            content: self.post.content.clone(),
            hobby_tags: self.post.hobby_tags.clone(),
            reactions: reactions::summarize(&self.reactions, viewer),
            comment_count: self.comment_count,
            can_delete: self.can_delete(viewer),
            created_at: self.post.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub id: Uuid,
    pub author: DisplayIdentity,
    pub content: String,
    pub hobby_tags: Vec<HobbyTag>,
    pub reactions: Vec<ReactionSummary>,
    pub comment_count: usize,
    pub can_delete: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct FeedResponse {
    pub posts: Vec<PostResponse>,
    pub next_cursor: Option<String>,
}
