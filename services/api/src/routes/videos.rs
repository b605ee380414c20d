//! Video routes: the composed listing, publish with media upload, and
//! owner-gated mutations

use axum::{
    Extension, Router,
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    middleware,
    response::IntoResponse,
    routing::{get, patch},
};
use tracing::{error, info};

use common::pagination::PageRequest;
use common::pipeline::SortSpec;

use crate::{
    error::ApiError,
    middleware::{CurrentUser, auth_middleware},
    models::video::{Video, VideoListQuery, VideoResponse},
    response::ApiResponse,
    state::AppState,
    storage::TempMedia,
    validation::{ensure_owner, parse_object_id, validate_non_blank},
};

/// Uploads up to this size are accepted for the publish endpoint
const MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

/// Create the video router
pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(list_videos).post(publish_video))
        .route(
            "/:video_id",
            get(get_video).patch(update_video).delete(delete_video),
        )
        .route("/toggle/publish/:video_id", patch(toggle_publish))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Sort keys accepted by the listing, mapped to their stored fields
fn resolve_sort_key(sort_by: &str) -> Result<&'static str, ApiError> {
    match sort_by {
        "views" => Ok("views"),
        "duration" => Ok("duration"),
        "createdAt" => Ok("created_at"),
        other => Err(ApiError::validation(format!(
            "Unsupported sort key: {other}"
        ))),
    }
}

/// List published videos with optional text/owner filters, sorting, and
/// pagination
pub async fn list_videos(
    State(state): State<AppState>,
    Query(query): Query<VideoListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let owner = match query.user_id.as_deref() {
        Some(user_id) => Some(parse_object_id(user_id, "user")?),
        None => None,
    };

    let sort = match (query.sort_by.as_deref(), query.sort_type.as_deref()) {
        (Some(sort_by), Some(sort_type)) => {
            let key = resolve_sort_key(sort_by)?;
            SortSpec::from_params(Some(key), Some(sort_type))
        }
        _ => None,
    };

    let request = PageRequest::new(query.page, query.limit);

    let page = state
        .video_repository
        .list(query.query.as_deref(), owner, sort, request)
        .await?;

    Ok(ApiResponse::ok(page, "Videos fetched successfully"))
}

/// Publish a video: persist the uploads, probe the duration, and create
/// the record
pub async fn publish_video(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut title = String::new();
    let mut description = String::new();
    let mut video_file: Option<TempMedia> = None;
    let mut thumbnail: Option<TempMedia> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::validation("Malformed multipart payload"))?
    {
        match field.name() {
            Some("title") => {
                title = field
                    .text()
                    .await
                    .map_err(|_| ApiError::validation("title must be text"))?;
            }
            Some("description") => {
                description = field
                    .text()
                    .await
                    .map_err(|_| ApiError::validation("description must be text"))?;
            }
            Some(name @ ("video_file" | "thumbnail")) => {
                let is_video = name == "video_file";
                let file_name = field.file_name().unwrap_or(name).to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|_| ApiError::validation("Failed to read uploaded file"))?;

                let media = TempMedia::persist(&file_name, &bytes).await.map_err(|e| {
                    error!("Failed to persist upload: {}", e);
                    ApiError::InternalServerError
                })?;

                if is_video {
                    video_file = Some(media);
                } else {
                    thumbnail = Some(media);
                }
            }
            _ => {}
        }
    }

    let mut errors = Vec::new();
    for check in [
        validate_non_blank(&title, "title"),
        validate_non_blank(&description, "description"),
    ] {
        if let Err(message) = check {
            errors.push(message);
        }
    }
    if video_file.is_none() {
        errors.push("video_file is required".to_string());
    }
    if thumbnail.is_none() {
        errors.push("thumbnail is required".to_string());
    }
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let (Some(mut video_file), Some(thumbnail)) = (video_file, thumbnail) else {
        return Err(ApiError::InternalServerError);
    };

    video_file.probe_duration();

    let uploaded_video = state
        .media_storage
        .upload(video_file, "videos")
        .await
        .ok_or(ApiError::InternalServerError)?;

    let uploaded_thumbnail = state
        .media_storage
        .upload(thumbnail, "thumbnails")
        .await
        .ok_or(ApiError::InternalServerError)?;

    let now = mongodb::bson::DateTime::now();
    let video = Video {
        id: None,
        owner: current.id,
        title,
        description,
        video_url: uploaded_video.url,
        thumbnail_url: uploaded_thumbnail.url,
        duration: uploaded_video.duration.unwrap_or(0.0),
        views: 0,
        published: true,
        created_at: now,
        updated_at: now,
    };

    let video = state.video_repository.create(video).await.map_err(|e| {
        error!("Failed to create video: {}", e);
        ApiError::InternalServerError
    })?;

    info!("Video published by {}: {}", current.username, video.title);

    Ok(ApiResponse::created(
        VideoResponse::from(video),
        "Video uploaded successfully",
    ))
}

/// Fetch one video with engagement context, counting the view and
/// recording it in the viewer's watch history
pub async fn get_video(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(video_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let video_id = parse_object_id(&video_id, "video")?;

    state
        .video_repository
        .increment_views(video_id)
        .await
        .map_err(|e| {
            error!("Failed to increment views: {}", e);
            ApiError::InternalServerError
        })?;

    state
        .user_repository
        .add_to_watch_history(current.id, video_id)
        .await
        .map_err(|e| {
            error!("Failed to record watch history: {}", e);
            ApiError::InternalServerError
        })?;

    let detail = state
        .video_repository
        .detail(video_id, current.id)
        .await
        .map_err(|e| {
            error!("Failed to fetch video: {}", e);
            ApiError::InternalServerError
        })?
        .ok_or(ApiError::NotFound("Video"))?;

    Ok(ApiResponse::ok(detail, "Video fetched successfully"))
}

/// Update title, description, and optionally the thumbnail
pub async fn update_video(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(video_id): Path<String>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let video_id = parse_object_id(&video_id, "video")?;

    let mut title = String::new();
    let mut description = String::new();
    let mut thumbnail: Option<TempMedia> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::validation("Malformed multipart payload"))?
    {
        match field.name() {
            Some("title") => {
                title = field
                    .text()
                    .await
                    .map_err(|_| ApiError::validation("title must be text"))?;
            }
            Some("description") => {
                description = field
                    .text()
                    .await
                    .map_err(|_| ApiError::validation("description must be text"))?;
            }
            Some("thumbnail") => {
                let file_name = field.file_name().unwrap_or("thumbnail").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|_| ApiError::validation("Failed to read uploaded file"))?;

                thumbnail = Some(TempMedia::persist(&file_name, &bytes).await.map_err(|e| {
                    error!("Failed to persist upload: {}", e);
                    ApiError::InternalServerError
                })?);
            }
            _ => {}
        }
    }

    let mut errors = Vec::new();
    for check in [
        validate_non_blank(&title, "title"),
        validate_non_blank(&description, "description"),
    ] {
        if let Err(message) = check {
            errors.push(message);
        }
    }
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let video = state
        .video_repository
        .find_by_id(video_id)
        .await
        .map_err(|e| {
            error!("Failed to look up video: {}", e);
            ApiError::InternalServerError
        })?
        .ok_or(ApiError::NotFound("Video"))?;

    ensure_owner(&video.owner, &current.id)?;

    let thumbnail_url = match thumbnail {
        Some(media) => Some(
            state
                .media_storage
                .upload(media, "thumbnails")
                .await
                .ok_or(ApiError::InternalServerError)?
                .url,
        ),
        None => None,
    };

    let updated = state
        .video_repository
        .update_details(video_id, &title, &description, thumbnail_url.as_deref())
        .await
        .map_err(|e| {
            error!("Failed to update video: {}", e);
            ApiError::InternalServerError
        })?
        .ok_or(ApiError::NotFound("Video"))?;

    Ok(ApiResponse::ok(
        VideoResponse::from(updated),
        "Video updated successfully",
    ))
}

/// Delete a video and its dependent records
pub async fn delete_video(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(video_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let video_id = parse_object_id(&video_id, "video")?;

    let video = state
        .video_repository
        .find_by_id(video_id)
        .await
        .map_err(|e| {
            error!("Failed to look up video: {}", e);
            ApiError::InternalServerError
        })?
        .ok_or(ApiError::NotFound("Video"))?;

    ensure_owner(&video.owner, &current.id)?;

    let deleted = state.video_repository.delete(video_id).await.map_err(|e| {
        error!("Failed to delete video: {}", e);
        ApiError::InternalServerError
    })?;

    if !deleted {
        return Err(ApiError::NotFound("Video"));
    }

    Ok(ApiResponse::ok(
        serde_json::json!({}),
        "Video deleted successfully",
    ))
}

/// Flip the publication flag
pub async fn toggle_publish(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(video_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let video_id = parse_object_id(&video_id, "video")?;

    let video = state
        .video_repository
        .find_by_id(video_id)
        .await
        .map_err(|e| {
            error!("Failed to look up video: {}", e);
            ApiError::InternalServerError
        })?
        .ok_or(ApiError::NotFound("Video"))?;

    ensure_owner(&video.owner, &current.id)?;

    let updated = state
        .video_repository
        .set_published(video_id, !video.published)
        .await
        .map_err(|e| {
            error!("Failed to toggle publish status: {}", e);
            ApiError::InternalServerError
        })?
        .ok_or(ApiError::NotFound("Video"))?;

    let message = if updated.published {
        "Video is now published"
    } else {
        "Video is now unpublished"
    };

    Ok(ApiResponse::ok(VideoResponse::from(updated), message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_keys_are_whitelisted_and_mapped() {
        assert_eq!(resolve_sort_key("views").unwrap(), "views");
        assert_eq!(resolve_sort_key("duration").unwrap(), "duration");
        assert_eq!(resolve_sort_key("createdAt").unwrap(), "created_at");
        assert!(resolve_sort_key("password_hash").is_err());
        assert!(resolve_sort_key("").is_err());
    }
}
