//! Dashboard repository: channel statistics and the owner's video listing
//!
//! Stats are assembled from three zero-safe reads; a channel with no
//! subscribers or videos reports all-zero counts rather than an error.

use anyhow::Result;
use futures::TryStreamExt;
use mongodb::bson::{Bson, Document, doc, from_document, oid::ObjectId};
use mongodb::{Collection, Database};

use common::pipeline::{PipelineBuilder, SortDirection, SortSpec, stage};

use crate::models::video::{ChannelStats, ChannelVideo};

/// Dashboard repository
#[derive(Clone)]
pub struct DashboardRepository {
    db: Database,
}

impl DashboardRepository {
    /// Create a new dashboard repository
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn videos(&self) -> Collection<Document> {
        self.db.collection::<Document>("videos")
    }

    fn likes(&self) -> Collection<Document> {
        self.db.collection::<Document>("likes")
    }

    fn subscriptions(&self) -> Collection<Document> {
        self.db.collection::<Document>("subscriptions")
    }

    /// Aggregate subscriber, video, view, and like totals for a channel
    pub async fn channel_stats(&self, channel: ObjectId) -> Result<ChannelStats> {
        let total_subs = self
            .subscriptions()
            .count_documents(doc! { "channel": channel })
            .await?;

        let (total_videos, total_views) = self.video_totals(channel).await?;
        let total_likes = self.like_total(channel).await?;

        Ok(ChannelStats {
            total_subs,
            total_videos,
            total_views,
            total_likes,
        })
    }

    async fn video_totals(&self, channel: ObjectId) -> Result<(u64, i64)> {
        let pipeline = video_totals_pipeline(channel);

        let mut cursor = self.videos().aggregate(pipeline).await?;

        match cursor.try_next().await? {
            Some(doc) => {
                let total_videos = read_i64(&doc, "totalVideos").max(0) as u64;
                let total_views = read_i64(&doc, "totalViews");
                Ok((total_videos, total_views))
            }
            None => Ok((0, 0)),
        }
    }

    async fn like_total(&self, channel: ObjectId) -> Result<u64> {
        let pipeline = like_total_pipeline(channel);

        let mut cursor = self.likes().aggregate(pipeline).await?;

        match cursor.try_next().await? {
            Some(doc) => Ok(read_i64(&doc, "totalLikes").max(0) as u64),
            None => Ok(0),
        }
    }

    /// The channel's own videos (published or not) with engagement counts
    pub async fn channel_videos(&self, channel: ObjectId) -> Result<Vec<ChannelVideo>> {
        let pipeline = channel_videos_pipeline(channel);

        let mut cursor = self.videos().aggregate(pipeline).await?;

        let mut videos = Vec::new();
        while let Some(doc) = cursor.try_next().await? {
            videos.push(from_document(doc)?);
        }

        Ok(videos)
    }
}

fn read_i64(doc: &Document, field: &str) -> i64 {
    match doc.get(field) {
        Some(Bson::Int32(n)) => i64::from(*n),
        Some(Bson::Int64(n)) => *n,
        Some(Bson::Double(n)) => *n as i64,
        _ => 0,
    }
}

/// Group the channel's videos into one document of totals
fn video_totals_pipeline(channel: ObjectId) -> Vec<Document> {
    PipelineBuilder::new()
        .stage(stage::match_stage(doc! { "owner": channel }))
        .stage(stage::group(
            Bson::Null,
            doc! {
                "totalVideos": { "$sum": 1 },
                "totalViews": { "$sum": "$views" },
            },
        ))
        .build()
}

/// Count likes landing on any of the channel's videos: join each like's
/// video and keep only those owned by the channel
fn like_total_pipeline(channel: ObjectId) -> Vec<Document> {
    PipelineBuilder::new()
        .stage(stage::match_stage(doc! { "video": { "$exists": true } }))
        .stage(stage::lookup("videos", "video", "_id", "liked_video"))
        .stage(stage::unwind("liked_video"))
        .stage(stage::match_stage(doc! { "liked_video.owner": channel }))
        .stage(stage::count("totalLikes"))
        .build()
}

/// The channel's video listing with like and comment counts
fn channel_videos_pipeline(channel: ObjectId) -> Vec<Document> {
    PipelineBuilder::new()
        .stage(stage::match_stage(doc! { "owner": channel }))
        .stage(stage::sort(&SortSpec::new(
            "created_at",
            SortDirection::Descending,
        )))
        .stage(stage::lookup("likes", "_id", "video", "likes"))
        .stage(stage::lookup("comments", "_id", "video", "video_comments"))
        .stage(stage::add_fields(doc! {
            "likesCount": stage::size_of("likes"),
            "commentsCount": stage::size_of("video_comments"),
        }))
        .stage(stage::project(doc! {
            "title": 1,
            "description": 1,
            "videoUrl": "$video_url",
            "thumbnailUrl": "$thumbnail_url",
            "views": 1,
            "published": 1,
            "createdAt": "$created_at",
            "likesCount": 1,
            "commentsCount": 1,
        }))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_totals_group_under_a_single_key() {
        let channel = ObjectId::new();
        let pipeline = video_totals_pipeline(channel);

        assert_eq!(pipeline[0], doc! { "$match": { "owner": channel } });
        assert_eq!(
            pipeline[1],
            doc! { "$group": {
                "_id": null,
                "totalVideos": { "$sum": 1 },
                "totalViews": { "$sum": "$views" },
            } }
        );
    }

    #[test]
    fn like_total_scopes_to_the_channel_through_the_video_join() {
        let channel = ObjectId::new();
        let pipeline = like_total_pipeline(channel);

        assert_eq!(pipeline.len(), 5);
        assert_eq!(pipeline[2], doc! { "$unwind": "$liked_video" });
        assert_eq!(
            pipeline[3],
            doc! { "$match": { "liked_video.owner": channel } }
        );
        assert_eq!(pipeline[4], doc! { "$count": "totalLikes" });
    }

    #[test]
    fn missing_totals_read_as_zero() {
        assert_eq!(read_i64(&doc! {}, "totalViews"), 0);
        assert_eq!(read_i64(&doc! { "totalViews": 7_i32 }, "totalViews"), 7);
        assert_eq!(read_i64(&doc! { "totalViews": 7_i64 }, "totalViews"), 7);
    }
}
