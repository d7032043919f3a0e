use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{profiles::Profile, tags::HobbyTag};

pub mod graph;
pub mod handler;

pub use graph::FollowGraph;

/// Directed follow relationship; at most one per ordered pair.
#[derive(Debug, Clone, Deserialize)]
pub struct FollowEdge {
    pub follower_id: Uuid,
    pub following_id: Uuid,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FollowState {
    pub following: bool,
}

/// Edge cardinalities, computed from the edge set on every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FollowCounts {
    pub followers: u64,
    pub following: u64,
}

/// Response for a user in followers/following lists
#[derive(Debug, Serialize)]
pub struct FollowUserResponse {
    pub id: Uuid,
    pub name: String,
    pub username: Option<String>,
    pub avatar_url: Option<String>,
    pub hobby_tags: Vec<HobbyTag>,
    pub is_following: bool, // Whether the current user follows this user
    pub is_self: bool,
}

impl FollowUserResponse {
    pub fn new(profile: Profile, is_following: bool, viewer: Option<Uuid>) -> Self {
        FollowUserResponse {
            id: profile.id,
            name: profile.display_name_or_fallback(),
            username: profile.username,
            avatar_url: profile.avatar_url,
            hobby_tags: profile.hobby_tags,
            is_following,
            is_self: viewer == Some(profile.id),
        }
    }
}

/// Response for a full followers/following list
#[derive(Debug, Serialize)]
pub struct FollowListResponse {
    pub users: Vec<FollowUserResponse>,
    pub total: u64,
}

/// Follow stats shown on a profile header
#[derive(Debug, Serialize)]
pub struct FollowStatsResponse {
    pub followers_count: u64,
    pub following_count: u64,
    pub is_following: bool,
}

/// Response for follow/unfollow actions
#[derive(Debug, Serialize)]
pub struct FollowActionResponse {
    pub following: bool,
    pub followers_count: u64,
}
