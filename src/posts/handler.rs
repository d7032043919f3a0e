use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    auth::{jwt, CurrentIdentity},
    config::settings::Settings,
    error::AppError,
    posts::{CreatePost, Cursor, FeedFilter, FeedResponse, Page, PostService, TimelineAssembler},
    response::{ApiResponse, EmptyData},
    tags::{HobbyTag, TagInfo},
};

/// Query parameters for timeline endpoints
#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    pub tag: Option<String>,
    /// Opaque cursor from a previous page's `next_cursor`
    pub before: Option<String>,
    pub limit: Option<usize>,
}

impl FeedQuery {
    fn parse(&self, default_limit: usize) -> Result<(Option<HobbyTag>, Option<Cursor>, usize), AppError> {
        let tag = self
            .tag
            .as_deref()
            .map(str::parse::<HobbyTag>)
            .transpose()
            .map_err(|e| AppError::UnprocessableEntity(e.to_string()))?;
        let cursor = self
            .before
            .as_deref()
            .map(str::parse::<Cursor>)
            .transpose()?;
        Ok((tag, cursor, self.limit.unwrap_or(default_limit)))
    }
}

fn feed_response(page: Page, viewer: Option<Uuid>) -> FeedResponse {
    FeedResponse {
        posts: page.posts.iter().map(|p| p.view(viewer)).collect(),
        next_cursor: page.next_cursor.map(|c| c.to_string()),
    }
}

/// Get the timeline, optionally narrowed to one hobby tag
/// GET /api/posts?tag=&before=&limit=
pub async fn get_feed(
    State(timeline): State<TimelineAssembler>,
    State(settings): State<Settings>,
    claims: Option<jwt::Claims>,
    Query(query): Query<FeedQuery>,
) -> Result<impl IntoResponse, AppError> {
    let (tag, cursor, limit) = query.parse(settings.page_size)?;
    let filter = FeedFilter { tag, author: None };

    let page = timeline.get_page(filter, cursor, limit).await;
    Ok(ApiResponse::success(feed_response(page, claims.viewer())))
}

/// Get a user's named posts. Anonymous posts never appear here.
/// GET /api/users/:id/posts
pub async fn get_user_posts(
    State(timeline): State<TimelineAssembler>,
    State(settings): State<Settings>,
    claims: Option<jwt::Claims>,
    Path(user_id): Path<Uuid>,
    Query(query): Query<FeedQuery>,
) -> Result<impl IntoResponse, AppError> {
    let (tag, cursor, limit) = query.parse(settings.page_size)?;
    let filter = FeedFilter {
        tag,
        author: Some(user_id),
    };

    let page = timeline.get_page(filter, cursor, limit).await;
    Ok(ApiResponse::success(feed_response(page, claims.viewer())))
}

/// POST /api/posts
pub async fn create_post(
    State(posts): State<PostService>,
    State(timeline): State<TimelineAssembler>,
    claims: jwt::Claims,
    Json(payload): Json<CreatePost>,
) -> Result<impl IntoResponse, AppError> {
    let post = posts.create(claims.sub, payload).await?;
    let enriched = timeline.get_post(post.id).await?;

    Ok(ApiResponse::success(enriched.view(Some(claims.sub))).created())
}

/// GET /api/posts/:id
pub async fn get_post(
    State(timeline): State<TimelineAssembler>,
    claims: Option<jwt::Claims>,
    Path(post_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let post = timeline.get_post(post_id).await?;
    Ok(ApiResponse::success(post.view(claims.viewer())))
}

/// DELETE /api/posts/:id
pub async fn delete_post(
    State(posts): State<PostService>,
    claims: jwt::Claims,
    Path(post_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    posts.delete(post_id, claims.sub).await?;
    Ok(ApiResponse::<EmptyData>::ok("Post deleted successfully".to_string()))
}

/// Hobby tag catalogue
/// GET /api/tags
pub async fn get_tags() -> impl IntoResponse {
    let tags: Vec<TagInfo> = HobbyTag::ALL.into_iter().map(TagInfo::from).collect();
    ApiResponse::success(tags)
}
