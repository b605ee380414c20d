//! Subscription routes: the toggle and both directions of the subscriber
//! graph

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
    response::ApiResponse,
    state::AppState,
    validation::parse_object_id,
};

/// Create the subscription router
pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/c/:channel_id", post(toggle_subscription).get(subscribers))
        .route("/u/:subscriber_id", get(subscribed_channels))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Flip the subscription state for the authenticated user and a channel
pub async fn toggle_subscription(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(channel_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let channel_id = parse_object_id(&channel_id, "channel")?;

    let channel = state
        .user_repository
        .find_by_id(channel_id)
        .await
        .map_err(|e| {
            error!("Failed to look up channel: {}", e);
            ApiError::InternalServerError
        })?;

    if channel.is_none() {
        return Err(ApiError::NotFound("Channel"));
    }

    let subscribed = state
        .subscription_repository
        .toggle(channel_id, current.id)
        .await
        .map_err(|e| {
            error!("Failed to toggle subscription: {}", e);
            ApiError::InternalServerError
        })?;

    Ok(ApiResponse::ok(
        json!({ "subscribed": subscribed }),
        "Operation successful",
    ))
}

/// The subscribers of a channel
pub async fn subscribers(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let channel_id = parse_object_id(&channel_id, "channel")?;

    let channel = state
        .user_repository
        .find_by_id(channel_id)
        .await
        .map_err(|e| {
            error!("Failed to look up channel: {}", e);
            ApiError::InternalServerError
        })?;

    if channel.is_none() {
        return Err(ApiError::NotFound("Channel"));
    }

    let subscribers = state
        .subscription_repository
        .subscribers_of(channel_id)
        .await
        .map_err(|e| {
            error!("Failed to fetch subscribers: {}", e);
            ApiError::InternalServerError
        })?;

    Ok(ApiResponse::ok(
        subscribers,
        "Subscribers fetched successfully",
    ))
}

/// The channels a user is subscribed to
pub async fn subscribed_channels(
    State(state): State<AppState>,
    Path(subscriber_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let subscriber_id = parse_object_id(&subscriber_id, "subscriber")?;

    let channels = state
        .subscription_repository
        .subscribed_channels(subscriber_id)
        .await
        .map_err(|e| {
            error!("Failed to fetch subscribed channels: {}", e);
            ApiError::InternalServerError
        })?;

    Ok(ApiResponse::ok(
        channels,
        "Subscribed channels fetched successfully",
    ))
}
