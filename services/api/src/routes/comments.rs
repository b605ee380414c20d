//! Comment routes: paginated per-video listing and owner-gated mutations

use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    middleware,
    response::IntoResponse,
    routing::{get, patch},
};
use serde::Deserialize;
use tracing::error;

use common::pagination::PageRequest;

use crate::{
    error::ApiError,
    middleware::{CurrentUser, auth_middleware},
    models::comment::{CommentContentRequest, CommentResponse},
    response::ApiResponse,
    state::AppState,
    validation::{ensure_owner, parse_object_id, validate_non_blank},
};

/// Create the comment router
pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/:video_id", get(list_comments).post(add_comment))
        .route(
            "/c/:comment_id",
            patch(update_comment).delete(delete_comment),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Page/limit query parameters
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Paginated comments for one video
pub async fn list_comments(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let video_id = parse_object_id(&video_id, "video")?;
    let request = PageRequest::new(query.page, query.limit);

    let page = state
        .comment_repository
        .list_for_video(video_id, request)
        .await?;

    Ok(ApiResponse::ok(page, "Comments fetched successfully"))
}

/// Add a comment to a video
pub async fn add_comment(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(video_id): Path<String>,
    Json(payload): Json<CommentContentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let video_id = parse_object_id(&video_id, "video")?;

    if let Err(message) = validate_non_blank(&payload.content, "content") {
        return Err(ApiError::validation(message));
    }

    let video = state
        .video_repository
        .find_by_id(video_id)
        .await
        .map_err(|e| {
            error!("Failed to look up video: {}", e);
            ApiError::InternalServerError
        })?;

    if video.is_none() {
        return Err(ApiError::NotFound("Video"));
    }

    let comment = state
        .comment_repository
        .create(video_id, current.id, &payload.content)
        .await
        .map_err(|e| {
            error!("Failed to create comment: {}", e);
            ApiError::InternalServerError
        })?;

    Ok(ApiResponse::created(
        CommentResponse::from(comment),
        "Comment added",
    ))
}

/// Edit a comment's content
pub async fn update_comment(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(comment_id): Path<String>,
    Json(payload): Json<CommentContentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let comment_id = parse_object_id(&comment_id, "comment")?;

    if let Err(message) = validate_non_blank(&payload.content, "content") {
        return Err(ApiError::validation(message));
    }

    let comment = state
        .comment_repository
        .find_by_id(comment_id)
        .await
        .map_err(|e| {
            error!("Failed to look up comment: {}", e);
            ApiError::InternalServerError
        })?
        .ok_or(ApiError::NotFound("Comment"))?;

    ensure_owner(&comment.owner, &current.id)?;

    let updated = state
        .comment_repository
        .update_content(comment_id, &payload.content)
        .await
        .map_err(|e| {
            error!("Failed to update comment: {}", e);
            ApiError::InternalServerError
        })?
        .ok_or(ApiError::NotFound("Comment"))?;

    Ok(ApiResponse::ok(
        CommentResponse::from(updated),
        "Comment updated",
    ))
}

/// Delete a comment; its likes go with it
pub async fn delete_comment(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(comment_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let comment_id = parse_object_id(&comment_id, "comment")?;

    let comment = state
        .comment_repository
        .find_by_id(comment_id)
        .await
        .map_err(|e| {
            error!("Failed to look up comment: {}", e);
            ApiError::InternalServerError
        })?
        .ok_or(ApiError::NotFound("Comment"))?;

    ensure_owner(&comment.owner, &current.id)?;

    let deleted = state
        .comment_repository
        .delete(comment_id)
        .await
        .map_err(|e| {
            error!("Failed to delete comment: {}", e);
            ApiError::InternalServerError
        })?;

    if !deleted {
        return Err(ApiError::NotFound("Comment"));
    }

    Ok(ApiResponse::ok(
        serde_json::json!({}),
        "Comment deleted successfully",
    ))
}
