//! Tweet routes: create, per-user listing, and owner-gated mutations

use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    middleware,
    response::IntoResponse,
    routing::{get, patch, post},
};
use tracing::error;

use crate::{
    error::ApiError,
    middleware::{CurrentUser, auth_middleware},
    models::tweet::{TweetContentRequest, TweetResponse},
    response::ApiResponse,
    state::AppState,
    validation::{ensure_owner, parse_object_id, validate_non_blank},
};

/// Create the tweet router
pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", post(create_tweet))
        .route("/user/:user_id", get(user_tweets))
        .route("/:tweet_id", patch(update_tweet).delete(delete_tweet))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Post a tweet
pub async fn create_tweet(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<TweetContentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if let Err(message) = validate_non_blank(&payload.content, "content") {
        return Err(ApiError::validation(message));
    }

    let tweet = state
        .tweet_repository
        .create(current.id, &payload.content)
        .await
        .map_err(|e| {
            error!("Failed to create tweet: {}", e);
            ApiError::InternalServerError
        })?;

    Ok(ApiResponse::created(TweetResponse::from(tweet), "Tweet posted"))
}

/// All tweets of one user with like context for the viewer
pub async fn user_tweets(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = parse_object_id(&user_id, "user")?;

    let tweets = state
        .tweet_repository
        .for_user(user_id, current.id)
        .await
        .map_err(|e| {
            error!("Failed to fetch tweets: {}", e);
            ApiError::InternalServerError
        })?;

    Ok(ApiResponse::ok(tweets, "Tweets fetched successfully"))
}

/// Edit a tweet
pub async fn update_tweet(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(tweet_id): Path<String>,
    Json(payload): Json<TweetContentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let tweet_id = parse_object_id(&tweet_id, "tweet")?;

    if let Err(message) = validate_non_blank(&payload.content, "content") {
        return Err(ApiError::validation(message));
    }

    let tweet = state
        .tweet_repository
        .find_by_id(tweet_id)
        .await
        .map_err(|e| {
            error!("Failed to look up tweet: {}", e);
            ApiError::InternalServerError
        })?
        .ok_or(ApiError::NotFound("Tweet"))?;

    ensure_owner(&tweet.owner, &current.id)?;

    let updated = state
        .tweet_repository
        .update_content(tweet_id, &payload.content)
        .await
        .map_err(|e| {
            error!("Failed to update tweet: {}", e);
            ApiError::InternalServerError
        })?
        .ok_or(ApiError::NotFound("Tweet"))?;

    Ok(ApiResponse::ok(
        TweetResponse::from(updated),
        "Tweet updated successfully",
    ))
}

/// Delete a tweet; its likes go with it
pub async fn delete_tweet(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(tweet_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let tweet_id = parse_object_id(&tweet_id, "tweet")?;

    let tweet = state
        .tweet_repository
        .find_by_id(tweet_id)
        .await
        .map_err(|e| {
            error!("Failed to look up tweet: {}", e);
            ApiError::InternalServerError
        })?
        .ok_or(ApiError::NotFound("Tweet"))?;

    ensure_owner(&tweet.owner, &current.id)?;

    let deleted = state.tweet_repository.delete(tweet_id).await.map_err(|e| {
        error!("Failed to delete tweet: {}", e);
        ApiError::InternalServerError
    })?;

    if !deleted {
        return Err(ApiError::NotFound("Tweet"));
    }

    Ok(ApiResponse::ok(
        serde_json::json!({}),
        "Tweet deleted successfully",
    ))
}
