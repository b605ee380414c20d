//! Like repository: presence-toggle semantics over the `likes` join
//! collection

use anyhow::Result;
use futures::TryStreamExt;
use mongodb::bson::{DateTime, Document, doc, from_document, oid::ObjectId};
use mongodb::{Collection, Database};

use common::pipeline::{PipelineBuilder, stage};

use crate::models::like::{Like, LikeTarget, LikedVideo};

/// Like repository
#[derive(Clone)]
pub struct LikeRepository {
    db: Database,
}

impl LikeRepository {
    /// Create a new like repository
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn collection(&self) -> Collection<Like> {
        self.db.collection::<Like>("likes")
    }

    fn documents(&self) -> Collection<Document> {
        self.db.collection::<Document>("likes")
    }

    /// Flip the like state for one (actor, target) pair.
    ///
    /// Check-then-act: an existing row is deleted, a missing row is
    /// created. Returns the resulting state — `true` when the target is
    /// now liked.
    pub async fn toggle(&self, target: LikeTarget, actor: ObjectId) -> Result<bool> {
        let filter = doc! {
            target.field(): target.id(),
            "liked_by": actor,
        };

        match self.collection().find_one(filter.clone()).await? {
            Some(_) => {
                self.collection().delete_one(filter).await?;
                Ok(false)
            }
            None => {
                let like = Like {
                    id: None,
                    liked_by: actor,
                    video: match target {
                        LikeTarget::Video(id) => Some(id),
                        _ => None,
                    },
                    comment: match target {
                        LikeTarget::Comment(id) => Some(id),
                        _ => None,
                    },
                    tweet: match target {
                        LikeTarget::Tweet(id) => Some(id),
                        _ => None,
                    },
                    created_at: DateTime::now(),
                };

                self.collection().insert_one(&like).await?;
                Ok(true)
            }
        }
    }

    /// All videos the actor has liked, flattened out of the join rows
    pub async fn liked_videos(&self, actor: ObjectId) -> Result<Vec<LikedVideo>> {
        let pipeline = liked_videos_pipeline(actor);

        let mut cursor = self.documents().aggregate(pipeline).await?;

        let mut videos = Vec::new();
        while let Some(doc) = cursor.try_next().await? {
            videos.push(from_document(doc)?);
        }

        Ok(videos)
    }
}

/// Liked-videos aggregation: join the video, flatten it, and surface only
/// its public fields
fn liked_videos_pipeline(actor: ObjectId) -> Vec<Document> {
    PipelineBuilder::new()
        .stage(stage::match_stage(doc! {
            "liked_by": actor,
            "video": { "$exists": true },
        }))
        .stage(stage::lookup_pipeline(
            "videos",
            "video",
            "_id",
            "liked_video",
            vec![stage::project(doc! {
                "title": 1,
                "description": 1,
                "videoUrl": "$video_url",
                "thumbnailUrl": "$thumbnail_url",
                "duration": 1,
                "views": 1,
                "createdAt": "$created_at",
                "owner": 1,
            })],
        ))
        .stage(stage::unwind("liked_video"))
        .stage(stage::project(doc! {
            "_id": "$liked_video._id",
            "title": "$liked_video.title",
            "description": "$liked_video.description",
            "videoUrl": "$liked_video.videoUrl",
            "thumbnailUrl": "$liked_video.thumbnailUrl",
            "duration": "$liked_video.duration",
            "views": "$liked_video.views",
            "createdAt": "$liked_video.createdAt",
            "owner": "$liked_video.owner",
        }))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn liked_videos_pipeline_only_considers_video_likes() {
        let actor = ObjectId::new();
        let pipeline = liked_videos_pipeline(actor);

        assert_eq!(
            pipeline[0],
            doc! { "$match": { "liked_by": actor, "video": { "$exists": true } } }
        );
        // The unwind drops join rows whose video has been deleted.
        assert_eq!(pipeline[2], doc! { "$unwind": "$liked_video" });
    }
}
