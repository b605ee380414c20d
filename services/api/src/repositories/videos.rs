//! Video repository: the listing composer, single-video aggregation, and
//! CRUD with cascading deletes

use anyhow::Result;
use futures::TryStreamExt;
use mongodb::bson::{DateTime, Document, doc, from_document, oid::ObjectId};
use mongodb::options::ReturnDocument;
use mongodb::{Collection, Database};
use tracing::info;

use common::pagination::{Page, PageRequest, paginate};
use common::pipeline::{ListingPipeline, PipelineBuilder, SortSpec, stage};

use crate::models::video::{Video, VideoDetail, VideoListItem};
use crate::repositories::users::owner_summary_projection;

/// Video repository
#[derive(Clone)]
pub struct VideoRepository {
    db: Database,
}

impl VideoRepository {
    /// Create a new video repository
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn collection(&self) -> Collection<Video> {
        self.db.collection::<Video>("videos")
    }

    fn documents(&self) -> Collection<Document> {
        self.db.collection::<Document>("videos")
    }

    /// List published videos through the composed pipeline
    pub async fn list(
        &self,
        query: Option<&str>,
        owner: Option<ObjectId>,
        sort: Option<SortSpec>,
        request: PageRequest,
    ) -> Result<Page<VideoListItem>, common::error::DatabaseError> {
        let pipeline = listing_pipeline(query, owner, sort);
        paginate(&self.documents(), pipeline, request).await
    }

    /// Create a video record and read it back
    pub async fn create(&self, video: Video) -> Result<Video> {
        info!("Creating video: {}", video.title);

        let inserted = self.collection().insert_one(&video).await?;
        let id = inserted
            .inserted_id
            .as_object_id()
            .ok_or_else(|| anyhow::anyhow!("Inserted video has no object id"))?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Created video could not be read back"))
    }

    /// Find a video by ID
    pub async fn find_by_id(&self, id: ObjectId) -> Result<Option<Video>> {
        let video = self.collection().find_one(doc! { "_id": id }).await?;
        Ok(video)
    }

    /// Single-video view with engagement counts for the requesting user
    pub async fn detail(&self, id: ObjectId, viewer: ObjectId) -> Result<Option<VideoDetail>> {
        let pipeline = detail_pipeline(id, viewer);

        let mut cursor = self.documents().aggregate(pipeline).await?;

        match cursor.try_next().await? {
            Some(doc) => Ok(Some(from_document(doc)?)),
            None => Ok(None),
        }
    }

    /// Bump the view counter
    pub async fn increment_views(&self, id: ObjectId) -> Result<()> {
        self.collection()
            .update_one(doc! { "_id": id }, doc! { "$inc": { "views": 1_i64 } })
            .await?;

        Ok(())
    }

    /// Update editable fields, returning the new document
    pub async fn update_details(
        &self,
        id: ObjectId,
        title: &str,
        description: &str,
        thumbnail_url: Option<&str>,
    ) -> Result<Option<Video>> {
        let mut fields = doc! {
            "title": title,
            "description": description,
            "updated_at": DateTime::now(),
        };
        if let Some(thumbnail_url) = thumbnail_url {
            fields.insert("thumbnail_url", thumbnail_url);
        }

        let video = self
            .collection()
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": fields })
            .return_document(ReturnDocument::After)
            .await?;

        Ok(video)
    }

    /// Set the publication flag, returning the new document
    pub async fn set_published(&self, id: ObjectId, published: bool) -> Result<Option<Video>> {
        let video = self
            .collection()
            .find_one_and_update(
                doc! { "_id": id },
                doc! { "$set": { "published": published, "updated_at": DateTime::now() } },
            )
            .return_document(ReturnDocument::After)
            .await?;

        Ok(video)
    }

    /// Delete a video and everything hanging off it: its comments, all
    /// likes on the video or those comments, and its playlist memberships
    pub async fn delete(&self, id: ObjectId) -> Result<bool> {
        let comments = self.db.collection::<Document>("comments");
        let likes = self.db.collection::<Document>("likes");
        let playlists = self.db.collection::<Document>("playlists");

        let mut comment_ids: Vec<ObjectId> = Vec::new();
        let mut cursor = comments
            .find(doc! { "video": id })
            .projection(doc! { "_id": 1 })
            .await?;
        while let Some(doc) = cursor.try_next().await? {
            if let Ok(comment_id) = doc.get_object_id("_id") {
                comment_ids.push(comment_id);
            }
        }

        likes
            .delete_many(doc! {
                "$or": [
                    { "video": id },
                    { "comment": { "$in": comment_ids } },
                ]
            })
            .await?;

        comments.delete_many(doc! { "video": id }).await?;

        playlists
            .update_many(doc! {}, doc! { "$pull": { "videos": id } })
            .await?;

        let deleted = self.collection().delete_one(doc! { "_id": id }).await?;

        Ok(deleted.deleted_count > 0)
    }
}

/// The video listing pipeline: text filter, owner filter, the published
/// invariant, sort, then the owner display join
pub(crate) fn listing_pipeline(
    query: Option<&str>,
    owner: Option<ObjectId>,
    sort: Option<SortSpec>,
) -> Vec<Document> {
    ListingPipeline::new()
        .text_search(&["title", "description"], query)
        .owned_by("owner", owner)
        .require(doc! { "published": true })
        .sort(sort)
        .display_stage(stage::lookup_pipeline(
            "users",
            "owner",
            "_id",
            "owner",
            vec![stage::project(owner_summary_projection())],
        ))
        .display_stage(stage::unwind("owner"))
        .display_stage(stage::project(doc! {
            "title": 1,
            "description": 1,
            "videoUrl": "$video_url",
            "thumbnailUrl": "$thumbnail_url",
            "duration": 1,
            "views": 1,
            "createdAt": "$created_at",
            "owner": 1,
        }))
        .compose()
}

/// Single-video aggregation: like/comment counts plus the viewer's own
/// like state
fn detail_pipeline(id: ObjectId, viewer: ObjectId) -> Vec<Document> {
    PipelineBuilder::new()
        .stage(stage::match_stage(doc! { "_id": id }))
        .stage(stage::lookup("likes", "_id", "video", "likes"))
        .stage(stage::lookup("comments", "_id", "video", "video_comments"))
        .stage(stage::lookup_pipeline(
            "users",
            "owner",
            "_id",
            "owner",
            vec![stage::project(owner_summary_projection())],
        ))
        .stage(stage::unwind("owner"))
        .stage(stage::add_fields(doc! {
            "likesCount": stage::size_of("likes"),
            "commentsCount": stage::size_of("video_comments"),
            "isLiked": stage::in_array(viewer, "likes.liked_by"),
        }))
        .stage(stage::project(doc! {
            "title": 1,
            "description": 1,
            "videoUrl": "$video_url",
            "thumbnailUrl": "$thumbnail_url",
            "duration": 1,
            "views": 1,
            "published": 1,
            "createdAt": "$created_at",
            "owner": 1,
            "likesCount": 1,
            "commentsCount": 1,
            "isLiked": 1,
        }))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::pipeline::SortDirection;

    #[test]
    fn listing_applies_filters_in_spec_order() {
        let owner = ObjectId::new();
        let pipeline = listing_pipeline(
            Some("rust"),
            Some(owner),
            Some(SortSpec::new("views", SortDirection::Ascending)),
        );

        // text filter, owner filter, published invariant, sort, join,
        // unwind, projection
        assert_eq!(pipeline.len(), 7);
        assert!(pipeline[0].get_document("$match").unwrap().contains_key("$or"));
        assert_eq!(pipeline[1], doc! { "$match": { "owner": owner } });
        assert_eq!(pipeline[2], doc! { "$match": { "published": true } });
        assert_eq!(pipeline[3], doc! { "$sort": { "views": 1, "_id": 1 } });
        assert!(pipeline[4].contains_key("$lookup"));
        assert_eq!(pipeline[5], doc! { "$unwind": "$owner" });
        assert!(pipeline[6].contains_key("$project"));
    }

    #[test]
    fn listing_without_filters_keeps_only_invariant_and_default_sort() {
        let pipeline = listing_pipeline(None, None, None);

        assert_eq!(pipeline.len(), 5);
        assert_eq!(pipeline[0], doc! { "$match": { "published": true } });
        assert_eq!(
            pipeline[1],
            doc! { "$sort": { "created_at": -1, "_id": 1 } }
        );
    }

    #[test]
    fn detail_pipeline_computes_counts_and_viewer_like_state() {
        let id = ObjectId::new();
        let viewer = ObjectId::new();
        let pipeline = detail_pipeline(id, viewer);

        assert_eq!(pipeline[0], doc! { "$match": { "_id": id } });

        let add_fields = pipeline[5].get_document("$addFields").unwrap();
        assert_eq!(
            add_fields.get_document("likesCount").unwrap(),
            &doc! { "$size": "$likes" }
        );
        assert_eq!(
            add_fields.get_document("isLiked").unwrap(),
            &doc! {
                "$cond": {
                    "if": { "$in": [viewer, "$likes.liked_by"] },
                    "then": true,
                    "else": false,
                }
            }
        );
    }
}
