//! Like routes: presence toggles per target kind plus the liked-videos
//! listing

use axum::{
    Extension, Router,
    extract::{Path, State},
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;
use tracing::error;

use crate::{
    error::ApiError,
    middleware::{CurrentUser, auth_middleware},
    models::like::LikeTarget,
    response::ApiResponse,
    state::AppState,
    validation::parse_object_id,
};

/// Create the like router
pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/toggle/v/:video_id", post(toggle_video_like))
        .route("/toggle/c/:comment_id", post(toggle_comment_like))
        .route("/toggle/t/:tweet_id", post(toggle_tweet_like))
        .route("/videos", get(liked_videos))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

async fn toggle(
    state: AppState,
    current: CurrentUser,
    target: LikeTarget,
) -> Result<ApiResponse<serde_json::Value>, ApiError> {
    let liked = state
        .like_repository
        .toggle(target, current.id)
        .await
        .map_err(|e| {
            error!("Failed to toggle like: {}", e);
            ApiError::InternalServerError
        })?;

    Ok(ApiResponse::ok(
        json!({ "liked": liked }),
        "Operation successful",
    ))
}

/// Toggle a like on a video
pub async fn toggle_video_like(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(video_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let video_id = parse_object_id(&video_id, "video")?;
    toggle(state, current, LikeTarget::Video(video_id)).await
}

/// Toggle a like on a comment
pub async fn toggle_comment_like(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(comment_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let comment_id = parse_object_id(&comment_id, "comment")?;
    toggle(state, current, LikeTarget::Comment(comment_id)).await
}

/// Toggle a like on a tweet
pub async fn toggle_tweet_like(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(tweet_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let tweet_id = parse_object_id(&tweet_id, "tweet")?;
    toggle(state, current, LikeTarget::Tweet(tweet_id)).await
}

/// All videos liked by the authenticated user
pub async fn liked_videos(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let videos = state
        .like_repository
        .liked_videos(current.id)
        .await
        .map_err(|e| {
            error!("Failed to fetch liked videos: {}", e);
            ApiError::InternalServerError
        })?;

    Ok(ApiResponse::ok(
        videos,
        "Liked videos fetched successfully",
    ))
}
