//! Playlist model and related payloads

use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Playlist entity as stored in the `playlists` collection.
///
/// `videos` is an ordered set: membership changes go through `$addToSet`
/// and `$pull`, so a video appears at most once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Playlist {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub owner: ObjectId,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub videos: Vec<ObjectId>,
    pub created_at: mongodb::bson::DateTime,
    pub updated_at: mongodb::bson::DateTime,
}

/// Request to create or update a playlist
#[derive(Debug, Deserialize)]
pub struct PlaylistRequest {
    pub name: String,
    pub description: String,
}

/// Public playlist representation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistResponse {
    pub id: String,
    pub owner: String,
    pub name: String,
    pub description: String,
    pub videos: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Playlist> for PlaylistResponse {
    fn from(playlist: Playlist) -> Self {
        Self {
            id: playlist.id.map(|id| id.to_hex()).unwrap_or_default(),
            owner: playlist.owner.to_hex(),
            name: playlist.name,
            description: playlist.description,
            videos: playlist.videos.iter().map(|id| id.to_hex()).collect(),
            created_at: playlist.created_at.to_chrono(),
        }
    }
}

/// Per-user playlist listing row with computed totals
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistSummary {
    #[serde(rename(deserialize = "_id"), deserialize_with = "super::object_id_hex")]
    pub id: String,
    pub name: String,
    pub description: String,
    pub total_videos: i64,
    pub total_views: i64,
}

/// A playlist with its member videos joined in
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistDetail {
    #[serde(rename(deserialize = "_id"), deserialize_with = "super::object_id_hex")]
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(deserialize_with = "super::bson_datetime")]
    pub created_at: DateTime<Utc>,
    pub videos: Vec<PlaylistVideo>,
}

/// A member video as projected into the playlist detail
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistVideo {
    #[serde(rename(deserialize = "_id"), deserialize_with = "super::object_id_hex")]
    pub id: String,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub thumbnail_url: String,
    pub duration: f64,
    pub views: i64,
}
