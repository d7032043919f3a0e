use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    auth::jwt,
    error::AppError,
    posts::TimelineAssembler,
    reactions::{ReactionInfo, ReactionLedger, ReactionSummary, ReactionType},
    response::ApiResponse,
};

/// Response for a reaction toggle: the new state plus the post's refreshed bar
#[derive(Debug, Serialize)]
pub struct ReactionToggleResponse {
    pub active: bool,
    pub reactions: Vec<ReactionSummary>,
}

/// Toggle the caller's reaction of one type on a post
/// POST /api/posts/:id/reactions/:kind
pub async fn toggle_reaction(
    State(ledger): State<ReactionLedger>,
    State(timeline): State<TimelineAssembler>,
    claims: jwt::Claims,
    Path((post_id, kind)): Path<(Uuid, String)>,
) -> Result<impl IntoResponse, AppError> {
    let kind: ReactionType = kind
        .parse()
        .map_err(|e: crate::reactions::UnknownReaction| AppError::BadRequest(e.to_string()))?;

    let state = ledger
        .toggle(post_id, Some(claims.sub), kind)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let post = timeline.get_post(post_id).await?;
    Ok(ApiResponse::success(ReactionToggleResponse {
        active: state.active,
        reactions: post.view(Some(claims.sub)).reactions,
    }))
}

/// Reaction vocabulary in display order
/// GET /api/reactions
pub async fn get_reaction_types() -> impl IntoResponse {
    let kinds: Vec<ReactionInfo> = ReactionType::ALL
        .into_iter()
        .map(ReactionInfo::from)
        .collect();
    ApiResponse::success(kinds)
}
