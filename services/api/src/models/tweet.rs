//! Tweet model and related payloads

use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use super::user::OwnerSummary;

/// Tweet entity as stored in the `tweets` collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tweet {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub owner: ObjectId,
    pub content: String,
    pub created_at: mongodb::bson::DateTime,
    pub updated_at: mongodb::bson::DateTime,
}

/// Request to create or edit a tweet
#[derive(Debug, Deserialize)]
pub struct TweetContentRequest {
    pub content: String,
}

/// Public tweet representation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TweetResponse {
    pub id: String,
    pub owner: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<Tweet> for TweetResponse {
    fn from(tweet: Tweet) -> Self {
        Self {
            id: tweet.id.map(|id| id.to_hex()).unwrap_or_default(),
            owner: tweet.owner.to_hex(),
            content: tweet.content,
            created_at: tweet.created_at.to_chrono(),
        }
    }
}

/// One row of the per-user tweet listing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TweetListItem {
    #[serde(rename(deserialize = "_id"), deserialize_with = "super::object_id_hex")]
    pub id: String,
    pub content: String,
    #[serde(deserialize_with = "super::bson_datetime")]
    pub created_at: DateTime<Utc>,
    pub likes_count: i64,
    pub is_liked: bool,
    pub owner: OwnerSummary,
}
