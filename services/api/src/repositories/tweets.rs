//! Tweet repository: CRUD plus the per-user listing with like context

use anyhow::Result;
use futures::TryStreamExt;
use mongodb::bson::{DateTime, Document, doc, from_document, oid::ObjectId};
use mongodb::options::ReturnDocument;
use mongodb::{Collection, Database};

use common::pipeline::{PipelineBuilder, SortDirection, SortSpec, stage};

use crate::models::tweet::{Tweet, TweetListItem};
use crate::repositories::users::owner_summary_projection;

/// Tweet repository
#[derive(Clone)]
pub struct TweetRepository {
    db: Database,
}

impl TweetRepository {
    /// Create a new tweet repository
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn collection(&self) -> Collection<Tweet> {
        self.db.collection::<Tweet>("tweets")
    }

    fn documents(&self) -> Collection<Document> {
        self.db.collection::<Document>("tweets")
    }

    /// Post a new tweet
    pub async fn create(&self, owner: ObjectId, content: &str) -> Result<Tweet> {
        let now = DateTime::now();

        let tweet = Tweet {
            id: None,
            owner,
            content: content.to_string(),
            created_at: now,
            updated_at: now,
        };

        let inserted = self.collection().insert_one(&tweet).await?;
        let id = inserted
            .inserted_id
            .as_object_id()
            .ok_or_else(|| anyhow::anyhow!("Inserted tweet has no object id"))?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Created tweet could not be read back"))
    }

    /// Find a tweet by ID
    pub async fn find_by_id(&self, id: ObjectId) -> Result<Option<Tweet>> {
        let tweet = self.collection().find_one(doc! { "_id": id }).await?;
        Ok(tweet)
    }

    /// All tweets of one user, newest first, with like counts and the
    /// viewer's like state
    pub async fn for_user(&self, owner: ObjectId, viewer: ObjectId) -> Result<Vec<TweetListItem>> {
        let pipeline = listing_pipeline(owner, viewer);

        let mut cursor = self.documents().aggregate(pipeline).await?;

        let mut tweets = Vec::new();
        while let Some(doc) = cursor.try_next().await? {
            tweets.push(from_document(doc)?);
        }

        Ok(tweets)
    }

    /// Replace a tweet's content, returning the new document
    pub async fn update_content(&self, id: ObjectId, content: &str) -> Result<Option<Tweet>> {
        let tweet = self
            .collection()
            .find_one_and_update(
                doc! { "_id": id },
                doc! { "$set": { "content": content, "updated_at": DateTime::now() } },
            )
            .return_document(ReturnDocument::After)
            .await?;

        Ok(tweet)
    }

    /// Delete a tweet and every like referencing it
    pub async fn delete(&self, id: ObjectId) -> Result<bool> {
        let deleted = self.collection().delete_one(doc! { "_id": id }).await?;

        self.db
            .collection::<Document>("likes")
            .delete_many(doc! { "tweet": id })
            .await?;

        Ok(deleted.deleted_count > 0)
    }
}

/// Per-user tweet listing with like count, viewer like state, and owner
/// summary
fn listing_pipeline(owner: ObjectId, viewer: ObjectId) -> Vec<Document> {
    PipelineBuilder::new()
        .stage(stage::match_stage(doc! { "owner": owner }))
        .stage(stage::sort(&SortSpec::new(
            "created_at",
            SortDirection::Descending,
        )))
        .stage(stage::lookup("likes", "_id", "tweet", "likes"))
        .stage(stage::add_fields(doc! {
            "likesCount": stage::size_of("likes"),
            "isLiked": stage::in_array(viewer, "likes.liked_by"),
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
            "isLiked": 1,
            "owner": 1,
        }))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tweet_listing_is_scoped_to_owner_and_newest_first() {
        let owner = ObjectId::new();
        let viewer = ObjectId::new();
        let pipeline = listing_pipeline(owner, viewer);

        assert_eq!(pipeline[0], doc! { "$match": { "owner": owner } });
        assert_eq!(
            pipeline[1],
            doc! { "$sort": { "created_at": -1, "_id": 1 } }
        );

        let add_fields = pipeline[3].get_document("$addFields").unwrap();
        assert!(add_fields.contains_key("likesCount"));
        assert!(add_fields.contains_key("isLiked"));
    }
}
