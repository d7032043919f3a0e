use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    auth::{jwt, CurrentIdentity},
    comments::{CommentResponse, CommentThread, CreateComment},
    error::AppError,
    posts::PostService,
    response::{ApiResponse, EmptyData},
};

/// List a post's comments, oldest first
/// GET /api/posts/:id/comments
pub async fn get_post_comments(
    State(comments): State<CommentThread>,
    claims: Option<jwt::Claims>,
    Path(post_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let viewer = claims.viewer();
    let list: Vec<CommentResponse> = comments
        .list(post_id)
        .await
        .iter()
        .map(|c| c.view(viewer))
        .collect();

    Ok(ApiResponse::success(list))
}

/// Create a new comment on a post
/// POST /api/posts/:id/comments
pub async fn create_comment(
    State(comments): State<CommentThread>,
    State(posts): State<PostService>,
    claims: jwt::Claims,
    Path(post_id): Path<Uuid>,
    Json(payload): Json<CreateComment>,
) -> Result<impl IntoResponse, AppError> {
    posts
        .get(post_id)
        .await?
        .ok_or(AppError::NotFound("Post not found".to_string()))?;

    let comment = comments
        .create(post_id, claims.sub, &payload.content, payload.is_anonymous)
        .await?;

    Ok(ApiResponse::success(comment.view(Some(claims.sub))).created())
}

/// Delete a comment (only by its author)
/// DELETE /api/comments/:id
pub async fn delete_comment(
    State(comments): State<CommentThread>,
    claims: jwt::Claims,
    Path(comment_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    comments.delete(comment_id, claims.sub).await?;
    Ok(ApiResponse::<EmptyData>::ok(
        "Comment deleted successfully".to_string(),
    ))
}
