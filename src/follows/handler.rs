use std::collections::HashSet;

use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use uuid::Uuid;

use crate::{
    auth::{jwt, CurrentIdentity},
    error::AppError,
    follows::{
        FollowActionResponse, FollowGraph, FollowListResponse, FollowStatsResponse,
        FollowUserResponse,
    },
    profiles::{Profile, ProfileDirectory},
    response::ApiResponse,
};

async fn require_user(profiles: &ProfileDirectory, user_id: Uuid) -> Result<Profile, AppError> {
    profiles
        .get(user_id)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))
}

/// Follow or unfollow a user, whichever flips the current state
/// POST /api/users/:id/follow
pub async fn toggle_follow(
    State(graph): State<FollowGraph>,
    State(profiles): State<ProfileDirectory>,
    claims: jwt::Claims,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    require_user(&profiles, user_id).await?;

    let state = graph.toggle(claims.sub, user_id).await?;
    let counts = graph.counts(user_id).await?;

    Ok(ApiResponse::success(FollowActionResponse {
        following: state.following,
        followers_count: counts.followers,
    }))
}

/// Follower and following totals for a profile header
/// GET /api/users/:id/follow-stats
pub async fn get_follow_stats(
    State(graph): State<FollowGraph>,
    State(profiles): State<ProfileDirectory>,
    claims: Option<jwt::Claims>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    require_user(&profiles, user_id).await?;

    let counts = graph.counts(user_id).await?;
    let is_following = match claims.viewer() {
        Some(viewer) => graph.is_following(viewer, user_id).await?,
        None => false,
    };

    Ok(ApiResponse::success(FollowStatsResponse {
        followers_count: counts.followers,
        following_count: counts.following,
        is_following,
    }))
}

async fn list_response(
    graph: &FollowGraph,
    users: Vec<Profile>,
    viewer: Option<Uuid>,
) -> Result<FollowListResponse, AppError> {
    let followed = match viewer {
        Some(viewer) => {
            let ids: Vec<Uuid> = users.iter().map(|u| u.id).collect();
            graph.followed_among(viewer, &ids).await?
        }
        None => HashSet::new(),
    };

    let total = users.len() as u64;
    let users = users
        .into_iter()
        .map(|u| {
            let is_following = followed.contains(&u.id);
            FollowUserResponse::new(u, is_following, viewer)
        })
        .collect();
    Ok(FollowListResponse { users, total })
}

/// Get a user's followers
/// GET /api/users/:id/followers
pub async fn get_followers(
    State(graph): State<FollowGraph>,
    State(profiles): State<ProfileDirectory>,
    claims: Option<jwt::Claims>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    require_user(&profiles, user_id).await?;

    let users = graph.followers(user_id).await?;
    let response = list_response(&graph, users, claims.viewer()).await?;
    Ok(ApiResponse::success(response))
}

/// Get users that a user is following
/// GET /api/users/:id/following
pub async fn get_following(
    State(graph): State<FollowGraph>,
    State(profiles): State<ProfileDirectory>,
    claims: Option<jwt::Claims>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    require_user(&profiles, user_id).await?;

    let users = graph.following(user_id).await?;
    let response = list_response(&graph, users, claims.viewer()).await?;
    Ok(ApiResponse::success(response))
}
