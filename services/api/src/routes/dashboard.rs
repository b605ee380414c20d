//! Dashboard routes: channel statistics and the owner's video listing

use axum::{
    Router,
    extract::{Path, State},
    middleware,
    response::IntoResponse,
    routing::get,
};
use tracing::error;

use crate::{
    error::ApiError,
    middleware::auth_middleware,
    response::ApiResponse,
    state::AppState,
    validation::parse_object_id,
};

/// Create the dashboard router
pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/stats/:channel_id", get(channel_stats))
        .route("/videos/:channel_id", get(channel_videos))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Aggregate totals for a channel; an empty channel reports zeros
pub async fn channel_stats(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let channel_id = parse_object_id(&channel_id, "channel")?;

    let stats = state
        .dashboard_repository
        .channel_stats(channel_id)
        .await
        .map_err(|e| {
            error!("Failed to fetch channel stats: {}", e);
            ApiError::InternalServerError
        })?;

    Ok(ApiResponse::ok(stats, "Channel stats fetched successfully"))
}

/// The channel's own videos with engagement counts
pub async fn channel_videos(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let channel_id = parse_object_id(&channel_id, "channel")?;

    let videos = state
        .dashboard_repository
        .channel_videos(channel_id)
        .await
        .map_err(|e| {
            error!("Failed to fetch channel videos: {}", e);
            ApiError::InternalServerError
        })?;

    Ok(ApiResponse::ok(
        videos,
        "Channel videos fetched successfully",
    ))
}
