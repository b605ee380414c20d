//! API service routes
//!
//! One module per resource; every handler validates its inputs, performs
//! the ownership check where it mutates, and answers with the uniform
//! envelope.

use axum::{Json, Router, response::IntoResponse, routing::get};
use serde_json::json;

use crate::state::AppState;

pub mod comments;
pub mod dashboard;
pub mod likes;
pub mod playlists;
pub mod subscriptions;
pub mod tweets;
pub mod users;
pub mod videos;

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/healthcheck", get(health_check))
        .nest("/api/v1/users", users::router(state.clone()))
        .nest("/api/v1/videos", videos::router(state.clone()))
        .nest("/api/v1/comments", comments::router(state.clone()))
        .nest("/api/v1/likes", likes::router(state.clone()))
        .nest("/api/v1/tweets", tweets::router(state.clone()))
        .nest("/api/v1/playlist", playlists::router(state.clone()))
        .nest(
            "/api/v1/subscriptions",
            subscriptions::router(state.clone()),
        )
        .nest("/api/v1/dashboard", dashboard::router(state.clone()))
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "api-service"
    }))
}
