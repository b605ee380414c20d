//! Like model: a join row whose existence is the "liked" state

use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Like entity as stored in the `likes` collection.
///
/// Exactly one of `video`, `comment`, `tweet` is set; presence of the row
/// is the liked state, so rows are only ever created or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Like {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub liked_by: ObjectId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<ObjectId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<ObjectId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tweet: Option<ObjectId>,
    pub created_at: mongodb::bson::DateTime,
}

/// The mutually exclusive target of a like
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeTarget {
    Video(ObjectId),
    Comment(ObjectId),
    Tweet(ObjectId),
}

impl LikeTarget {
    /// The document field naming this target kind
    pub fn field(&self) -> &'static str {
        match self {
            LikeTarget::Video(_) => "video",
            LikeTarget::Comment(_) => "comment",
            LikeTarget::Tweet(_) => "tweet",
        }
    }

    /// The referenced identifier
    pub fn id(&self) -> ObjectId {
        match self {
            LikeTarget::Video(id) | LikeTarget::Comment(id) | LikeTarget::Tweet(id) => *id,
        }
    }
}

/// One row of the liked-videos listing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikedVideo {
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
    #[serde(deserialize_with = "super::object_id_hex")]
    pub owner: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_target_selects_the_right_field() {
        let id = ObjectId::new();
        assert_eq!(LikeTarget::Video(id).field(), "video");
        assert_eq!(LikeTarget::Comment(id).field(), "comment");
        assert_eq!(LikeTarget::Tweet(id).field(), "tweet");
        assert_eq!(LikeTarget::Tweet(id).id(), id);
    }
}
