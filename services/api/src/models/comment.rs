//! Comment model and related payloads

use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use super::user::OwnerSummary;

/// Comment entity as stored in the `comments` collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub video: ObjectId,
    pub owner: ObjectId,
    pub content: String,
    pub created_at: mongodb::bson::DateTime,
    pub updated_at: mongodb::bson::DateTime,
}

/// Request to add or edit a comment
#[derive(Debug, Deserialize)]
pub struct CommentContentRequest {
    pub content: String,
}

/// Public comment representation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: String,
    pub video: String,
    pub owner: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<Comment> for CommentResponse {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id.map(|id| id.to_hex()).unwrap_or_default(),
            video: comment.video.to_hex(),
            owner: comment.owner.to_hex(),
            content: comment.content,
            created_at: comment.created_at.to_chrono(),
        }
    }
}

/// One row of the per-video comment listing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentListItem {
    #[serde(rename(deserialize = "_id"), deserialize_with = "super::object_id_hex")]
    pub id: String,
    pub content: String,
    #[serde(deserialize_with = "super::bson_datetime")]
    pub created_at: DateTime<Utc>,
    pub likes_count: i64,
    pub owner: OwnerSummary,
}
