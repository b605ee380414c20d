//! Playlist routes: CRUD, membership changes, and the enriched listings

use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    middleware,
    response::IntoResponse,
    routing::{get, patch, post},
};
use mongodb::bson::oid::ObjectId;
use tracing::error;

use crate::{
    error::ApiError,
    middleware::{CurrentUser, auth_middleware},
    models::playlist::{Playlist, PlaylistRequest, PlaylistResponse},
    response::ApiResponse,
    state::AppState,
    validation::{ensure_owner, parse_object_id, validate_non_blank},
};

/// Create the playlist router
pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", post(create_playlist))
        .route(
            "/:playlist_id",
            get(get_playlist)
                .patch(update_playlist)
                .delete(delete_playlist),
        )
        .route("/add/:video_id/:playlist_id", patch(add_video))
        .route("/remove/:video_id/:playlist_id", patch(remove_video))
        .route("/user/:user_id", get(user_playlists))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

fn validate_playlist_fields(payload: &PlaylistRequest) -> Result<(), ApiError> {
    let mut errors = Vec::new();
    for check in [
        validate_non_blank(&payload.name, "name"),
        validate_non_blank(&payload.description, "description"),
    ] {
        if let Err(message) = check {
            errors.push(message);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Validation(errors))
    }
}

/// Load a playlist and confirm the actor owns it
async fn owned_playlist(
    state: &AppState,
    playlist_id: ObjectId,
    actor: ObjectId,
) -> Result<Playlist, ApiError> {
    let playlist = state
        .playlist_repository
        .find_by_id(playlist_id)
        .await
        .map_err(|e| {
            error!("Failed to look up playlist: {}", e);
            ApiError::InternalServerError
        })?
        .ok_or(ApiError::NotFound("Playlist"))?;

    ensure_owner(&playlist.owner, &actor)?;

    Ok(playlist)
}

/// Create an empty playlist
pub async fn create_playlist(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<PlaylistRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_playlist_fields(&payload)?;

    let playlist = state
        .playlist_repository
        .create(current.id, &payload.name, &payload.description)
        .await
        .map_err(|e| {
            error!("Failed to create playlist: {}", e);
            ApiError::InternalServerError
        })?;

    Ok(ApiResponse::created(
        PlaylistResponse::from(playlist),
        "Playlist created",
    ))
}

/// A playlist with its member videos joined in
pub async fn get_playlist(
    State(state): State<AppState>,
    Path(playlist_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let playlist_id = parse_object_id(&playlist_id, "playlist")?;

    let detail = state
        .playlist_repository
        .detail(playlist_id)
        .await
        .map_err(|e| {
            error!("Failed to fetch playlist: {}", e);
            ApiError::InternalServerError
        })?
        .ok_or(ApiError::NotFound("Playlist"))?;

    Ok(ApiResponse::ok(detail, "Playlist fetched successfully"))
}

/// Update name and description
pub async fn update_playlist(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(playlist_id): Path<String>,
    Json(payload): Json<PlaylistRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let playlist_id = parse_object_id(&playlist_id, "playlist")?;
    validate_playlist_fields(&payload)?;

    owned_playlist(&state, playlist_id, current.id).await?;

    let updated = state
        .playlist_repository
        .update(playlist_id, &payload.name, &payload.description)
        .await
        .map_err(|e| {
            error!("Failed to update playlist: {}", e);
            ApiError::InternalServerError
        })?
        .ok_or(ApiError::NotFound("Playlist"))?;

    Ok(ApiResponse::ok(
        PlaylistResponse::from(updated),
        "Playlist updated",
    ))
}

/// Delete a playlist
pub async fn delete_playlist(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(playlist_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let playlist_id = parse_object_id(&playlist_id, "playlist")?;

    owned_playlist(&state, playlist_id, current.id).await?;

    let deleted = state
        .playlist_repository
        .delete(playlist_id)
        .await
        .map_err(|e| {
            error!("Failed to delete playlist: {}", e);
            ApiError::InternalServerError
        })?;

    if !deleted {
        return Err(ApiError::NotFound("Playlist"));
    }

    Ok(ApiResponse::ok(
        serde_json::json!({}),
        "Playlist deleted",
    ))
}

/// Add a video to a playlist (set semantics)
pub async fn add_video(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path((video_id, playlist_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let video_id = parse_object_id(&video_id, "video")?;
    let playlist_id = parse_object_id(&playlist_id, "playlist")?;

    owned_playlist(&state, playlist_id, current.id).await?;

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

    let updated = state
        .playlist_repository
        .add_video(playlist_id, video_id)
        .await
        .map_err(|e| {
            error!("Failed to add video to playlist: {}", e);
            ApiError::InternalServerError
        })?
        .ok_or(ApiError::NotFound("Playlist"))?;

    Ok(ApiResponse::ok(
        PlaylistResponse::from(updated),
        "Video added to playlist",
    ))
}

/// Remove a video from a playlist
pub async fn remove_video(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path((video_id, playlist_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let video_id = parse_object_id(&video_id, "video")?;
    let playlist_id = parse_object_id(&playlist_id, "playlist")?;

    owned_playlist(&state, playlist_id, current.id).await?;

    let updated = state
        .playlist_repository
        .remove_video(playlist_id, video_id)
        .await
        .map_err(|e| {
            error!("Failed to remove video from playlist: {}", e);
            ApiError::InternalServerError
        })?
        .ok_or(ApiError::NotFound("Playlist"))?;

    Ok(ApiResponse::ok(
        PlaylistResponse::from(updated),
        "Video removed from playlist",
    ))
}

/// All playlists of one user with computed totals
pub async fn user_playlists(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = parse_object_id(&user_id, "user")?;

    let playlists = state
        .playlist_repository
        .for_user(user_id)
        .await
        .map_err(|e| {
            error!("Failed to fetch playlists: {}", e);
            ApiError::InternalServerError
        })?;

    Ok(ApiResponse::ok(
        playlists,
        "User playlists fetched successfully",
    ))
}
