//! Video model and related payloads

use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use super::user::OwnerSummary;

/// Video entity as stored in the `videos` collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Video {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub owner: ObjectId,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub thumbnail_url: String,
    /// Seconds, as reported by the media probe at publish time
    pub duration: f64,
    pub views: i64,
    pub published: bool,
    pub created_at: mongodb::bson::DateTime,
    pub updated_at: mongodb::bson::DateTime,
}

/// Query parameters accepted by the video listing endpoint
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    /// Free-text filter over title and description
    pub query: Option<String>,
    pub sort_by: Option<String>,
    pub sort_type: Option<String>,
    /// Restrict the listing to one owner
    pub user_id: Option<String>,
}

/// Public video representation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoResponse {
    pub id: String,
    pub owner: String,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub thumbnail_url: String,
    pub duration: f64,
    pub views: i64,
    pub published: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Video> for VideoResponse {
    fn from(video: Video) -> Self {
        Self {
            id: video.id.map(|id| id.to_hex()).unwrap_or_default(),
            owner: video.owner.to_hex(),
            title: video.title,
            description: video.description,
            video_url: video.video_url,
            thumbnail_url: video.thumbnail_url,
            duration: video.duration,
            views: video.views,
            published: video.published,
            created_at: video.created_at.to_chrono(),
        }
    }
}

/// One row of the video listing: the public fields plus the owner summary
/// attached by the display join
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoListItem {
    #[serde(rename(deserialize = "_id"), deserialize_with = "super::object_id_hex")]
    pub id: String,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub thumbnail_url: String,
    pub duration: f64,
    pub views: i64,
    #[serde(deserialize_with = "super::bson_datetime")]
    pub created_at: DateTime<Utc>,
    pub owner: OwnerSummary,
}

/// Single-video view with engagement counts for the requesting user
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetail {
    #[serde(rename(deserialize = "_id"), deserialize_with = "super::object_id_hex")]
    pub id: String,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub thumbnail_url: String,
    pub duration: f64,
    pub views: i64,
    pub published: bool,
    #[serde(deserialize_with = "super::bson_datetime")]
    pub created_at: DateTime<Utc>,
    pub owner: OwnerSummary,
    pub likes_count: i64,
    pub comments_count: i64,
    pub is_liked: bool,
}

/// Aggregated channel statistics; all counts are zero for an empty channel
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStats {
    pub total_subs: u64,
    pub total_videos: u64,
    pub total_views: i64,
    pub total_likes: u64,
}

/// One row of the dashboard's channel-video listing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelVideo {
    #[serde(rename(deserialize = "_id"), deserialize_with = "super::object_id_hex")]
    pub id: String,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub thumbnail_url: String,
    pub views: i64,
    pub published: bool,
    #[serde(deserialize_with = "super::bson_datetime")]
    pub created_at: DateTime<Utc>,
    pub likes_count: i64,
    pub comments_count: i64,
}
