//! Comment repository: paginated per-video listing plus CRUD with like
//! cascade

use anyhow::Result;
use mongodb::bson::{DateTime, Document, doc, oid::ObjectId};
use mongodb::options::ReturnDocument;
use mongodb::{Collection, Database};

use common::pagination::{Page, PageRequest, paginate};
use common::pipeline::{PipelineBuilder, SortDirection, SortSpec, stage};

use crate::models::comment::{Comment, CommentListItem};
use crate::repositories::users::owner_summary_projection;

/// Comment repository
#[derive(Clone)]
pub struct CommentRepository {
    db: Database,
}

impl CommentRepository {
    /// Create a new comment repository
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn collection(&self) -> Collection<Comment> {
        self.db.collection::<Comment>("comments")
    }

    fn documents(&self) -> Collection<Document> {
        self.db.collection::<Document>("comments")
    }

    /// Paginated comments for one video, each with a like count and owner
    /// summary
    pub async fn list_for_video(
        &self,
        video_id: ObjectId,
        request: PageRequest,
    ) -> Result<Page<CommentListItem>, common::error::DatabaseError> {
        let pipeline = listing_pipeline(video_id);
        paginate(&self.documents(), pipeline, request).await
    }

    /// Attach a new comment to a video
    pub async fn create(&self, video: ObjectId, owner: ObjectId, content: &str) -> Result<Comment> {
        let now = DateTime::now();

        let comment = Comment {
            id: None,
            video,
            owner,
            content: content.to_string(),
            created_at: now,
            updated_at: now,
        };

        let inserted = self.collection().insert_one(&comment).await?;
        let id = inserted
            .inserted_id
            .as_object_id()
            .ok_or_else(|| anyhow::anyhow!("Inserted comment has no object id"))?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Created comment could not be read back"))
    }

    /// Find a comment by ID
    pub async fn find_by_id(&self, id: ObjectId) -> Result<Option<Comment>> {
        let comment = self.collection().find_one(doc! { "_id": id }).await?;
        Ok(comment)
    }

    /// Replace a comment's content, returning the new document
    pub async fn update_content(&self, id: ObjectId, content: &str) -> Result<Option<Comment>> {
        let comment = self
            .collection()
            .find_one_and_update(
                doc! { "_id": id },
                doc! { "$set": { "content": content, "updated_at": DateTime::now() } },
            )
            .return_document(ReturnDocument::After)
            .await?;

        Ok(comment)
    }

    /// Delete a comment and every like referencing it
    pub async fn delete(&self, id: ObjectId) -> Result<bool> {
        let deleted = self.collection().delete_one(doc! { "_id": id }).await?;

        self.db
            .collection::<Document>("likes")
            .delete_many(doc! { "comment": id })
            .await?;

        Ok(deleted.deleted_count > 0)
    }
}

/// Per-video comment listing: newest first, like count and owner summary
/// attached, commenters that no longer exist dropped by the unwind
fn listing_pipeline(video_id: ObjectId) -> Vec<Document> {
    PipelineBuilder::new()
        .stage(stage::match_stage(doc! { "video": video_id }))
        .stage(stage::sort(&SortSpec::new(
            "created_at",
            SortDirection::Descending,
        )))
        .stage(stage::lookup("likes", "_id", "comment", "likes"))
        .stage(stage::add_fields(doc! {
            "likesCount": stage::size_of("likes"),
        }))
        .stage(stage::lookup_pipeline(
            "users",
            "owner",
            "_id",
            "owner",
            vec![stage::project(owner_summary_projection())],
        ))
        .stage(stage::unwind("owner"))
        .stage(stage::project(doc! {
            "content": 1,
            "createdAt": "$created_at",
            "likesCount": 1,
            "owner": 1,
        }))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comment_listing_counts_likes_and_flattens_owner() {
        let video_id = ObjectId::new();
        let pipeline = listing_pipeline(video_id);

        assert_eq!(pipeline.len(), 7);
        assert_eq!(pipeline[0], doc! { "$match": { "video": video_id } });
        assert_eq!(
            pipeline[1],
            doc! { "$sort": { "created_at": -1, "_id": 1 } }
        );
        assert_eq!(
            pipeline[3],
            doc! { "$addFields": { "likesCount": { "$size": "$likes" } } }
        );
        assert_eq!(pipeline[5], doc! { "$unwind": "$owner" });
    }
}
