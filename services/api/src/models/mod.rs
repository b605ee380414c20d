//! API service models
//!
//! Each entity module holds the stored document shape plus the request and
//! response payloads derived from it. Stored documents keep `bson` types;
//! response payloads expose hex identifiers and RFC 3339 timestamps.

pub mod comment;
pub mod like;
pub mod playlist;
pub mod subscription;
pub mod tweet;
pub mod user;
pub mod video;

// Re-export for convenience
pub use comment::{Comment, CommentListItem, CommentResponse};
pub use like::{Like, LikeTarget, LikedVideo};
pub use playlist::{Playlist, PlaylistDetail, PlaylistResponse, PlaylistSummary};
pub use subscription::{SubscribedChannelEntry, SubscriberEntry, Subscription};
pub use tweet::{Tweet, TweetListItem, TweetResponse};
pub use user::{ChannelProfile, OwnerSummary, Role, User, UserResponse, WatchHistoryVideo};
pub use video::{ChannelStats, ChannelVideo, Video, VideoDetail, VideoListItem, VideoResponse};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

/// Deserialize a BSON datetime produced by an aggregation pipeline into a
/// `chrono` timestamp, which then serializes to RFC 3339 on the way out
pub(crate) fn bson_datetime<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    mongodb::bson::DateTime::deserialize(deserializer).map(|dt| dt.to_chrono())
}

/// Deserialize an ObjectId field from a pipeline document into its hex form
pub(crate) fn object_id_hex<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    mongodb::bson::oid::ObjectId::deserialize(deserializer).map(|id| id.to_hex())
}
