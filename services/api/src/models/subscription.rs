//! Subscription model: a join row between a subscriber and a channel

use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Subscription entity as stored in the `subscriptions` collection.
///
/// Presence of the row is the subscribed state; rows are only ever created
/// or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub subscriber: ObjectId,
    pub channel: ObjectId,
    pub created_at: mongodb::bson::DateTime,
}

/// One subscriber of a channel, with mutual-subscription context
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriberEntry {
    #[serde(rename(deserialize = "_id"), deserialize_with = "super::object_id_hex")]
    pub id: String,
    pub username: String,
    pub full_name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    /// Whether the listed channel is itself subscribed to this subscriber
    pub subscribed_to_subscriber: bool,
    pub subscribers_count: i64,
}

/// One channel a user is subscribed to, with its most recent video
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribedChannelEntry {
    #[serde(rename(deserialize = "_id"), deserialize_with = "super::object_id_hex")]
    pub id: String,
    pub username: String,
    pub full_name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub latest_video: Option<LatestVideo>,
}

/// The latest video projected into a subscribed-channel entry.
///
/// Deserialized straight from the stored video document, hence the
/// snake_case aliases.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestVideo {
    #[serde(rename(deserialize = "_id"), deserialize_with = "super::object_id_hex")]
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(alias = "video_url")]
    pub video_url: String,
    #[serde(alias = "thumbnail_url")]
    pub thumbnail_url: String,
    pub duration: f64,
    pub views: i64,
    #[serde(alias = "created_at", deserialize_with = "super::bson_datetime")]
    pub created_at: DateTime<Utc>,
}
