use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;

/// Failure surfaced by the feed core.
#[derive(Debug, Clone, Error)]
pub enum FeedError {
    /// Empty or oversized content, unknown tag or reaction id. Nothing was written.
    #[error("{0}")]
    Validation(String),

    /// The requester does not own the target. Rejected before touching the store.
    #[error("{0}")]
    Permission(String),

    /// A unique key was already taken by a non-toggle write.
    #[error("{0}")]
    Conflict(String),

    /// The target vanished between read and mutate; the caller should refresh.
    #[error("{0}")]
    NotFound(String),

    /// Store unreachable or misbehaving; retry is the caller's decision.
    #[error("{0}")]
    Transient(String),
}

impl From<StoreError> for FeedError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => FeedError::Conflict(msg),
            StoreError::MissingReference(msg) => FeedError::NotFound(msg),
            StoreError::Unavailable(msg) | StoreError::Malformed(msg) => {
                FeedError::Transient(msg)
            }
        }
    }
}

pub type FeedResult<T> = Result<T, FeedError>;

/// HTTP-facing error; renders the failure envelope.
pub enum AppError {
    BadRequest(String),
    Unauthorized,
    NotFound(String),
    Conflict(String),
    UnprocessableEntity(String),
    ServiceUnavailable(String),
}

impl From<FeedError> for AppError {
    fn from(err: FeedError) -> Self {
        match err {
            FeedError::Validation(msg) => AppError::UnprocessableEntity(msg),
            FeedError::Permission(_) => AppError::Unauthorized,
            FeedError::Conflict(msg) => AppError::Conflict(msg),
            FeedError::NotFound(msg) => AppError::NotFound(msg),
            FeedError::Transient(msg) => {
                tracing::error!("Store unavailable: {}", msg);
                AppError::ServiceUnavailable("Please try again in a moment".to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::UnprocessableEntity(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            AppError::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
        };

        // Standardized failure response matching ApiResponse structure
        let body = Json(json!({
            "success": false,
            "message": error_message,
            "data": null
        }));

        (status, body).into_response()
    }
}
