//! Playlist repository: CRUD, de-duplicated membership, and the enriched
//! listings

use anyhow::Result;
use futures::TryStreamExt;
use mongodb::bson::{DateTime, Document, doc, from_document, oid::ObjectId};
use mongodb::options::ReturnDocument;
use mongodb::{Collection, Database};

use common::pipeline::{PipelineBuilder, stage};

use crate::models::playlist::{Playlist, PlaylistDetail, PlaylistSummary};

/// Playlist repository
#[derive(Clone)]
pub struct PlaylistRepository {
    db: Database,
}

impl PlaylistRepository {
    /// Create a new playlist repository
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn collection(&self) -> Collection<Playlist> {
        self.db.collection::<Playlist>("playlists")
    }

    fn documents(&self) -> Collection<Document> {
        self.db.collection::<Document>("playlists")
    }

    /// Create an empty playlist
    pub async fn create(&self, owner: ObjectId, name: &str, description: &str) -> Result<Playlist> {
        let now = DateTime::now();

        let playlist = Playlist {
            id: None,
            owner,
            name: name.to_string(),
            description: description.to_string(),
            videos: vec![],
            created_at: now,
            updated_at: now,
        };

        let inserted = self.collection().insert_one(&playlist).await?;
        let id = inserted
            .inserted_id
            .as_object_id()
            .ok_or_else(|| anyhow::anyhow!("Inserted playlist has no object id"))?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Created playlist could not be read back"))
    }

    /// Find a playlist by ID
    pub async fn find_by_id(&self, id: ObjectId) -> Result<Option<Playlist>> {
        let playlist = self.collection().find_one(doc! { "_id": id }).await?;
        Ok(playlist)
    }

    /// A playlist with its member videos joined in
    pub async fn detail(&self, id: ObjectId) -> Result<Option<PlaylistDetail>> {
        let pipeline = detail_pipeline(id);

        let mut cursor = self.documents().aggregate(pipeline).await?;

        match cursor.try_next().await? {
            Some(doc) => Ok(Some(from_document(doc)?)),
            None => Ok(None),
        }
    }

    /// All playlists of one user with computed totals
    pub async fn for_user(&self, owner: ObjectId) -> Result<Vec<PlaylistSummary>> {
        let pipeline = summaries_pipeline(owner);

        let mut cursor = self.documents().aggregate(pipeline).await?;

        let mut playlists = Vec::new();
        while let Some(doc) = cursor.try_next().await? {
            playlists.push(from_document(doc)?);
        }

        Ok(playlists)
    }

    /// Update name and description, returning the new document
    pub async fn update(
        &self,
        id: ObjectId,
        name: &str,
        description: &str,
    ) -> Result<Option<Playlist>> {
        let playlist = self
            .collection()
            .find_one_and_update(
                doc! { "_id": id },
                doc! { "$set": {
                    "name": name,
                    "description": description,
                    "updated_at": DateTime::now(),
                } },
            )
            .return_document(ReturnDocument::After)
            .await?;

        Ok(playlist)
    }

    /// Delete a playlist
    pub async fn delete(&self, id: ObjectId) -> Result<bool> {
        let deleted = self.collection().delete_one(doc! { "_id": id }).await?;
        Ok(deleted.deleted_count > 0)
    }

    /// Add a video to the playlist; membership is a set, so re-adding is a
    /// no-op
    pub async fn add_video(&self, id: ObjectId, video: ObjectId) -> Result<Option<Playlist>> {
        let playlist = self
            .collection()
            .find_one_and_update(
                doc! { "_id": id },
                doc! {
                    "$addToSet": { "videos": video },
                    "$set": { "updated_at": DateTime::now() },
                },
            )
            .return_document(ReturnDocument::After)
            .await?;

        Ok(playlist)
    }

    /// Remove a video from the playlist
    pub async fn remove_video(&self, id: ObjectId, video: ObjectId) -> Result<Option<Playlist>> {
        let playlist = self
            .collection()
            .find_one_and_update(
                doc! { "_id": id },
                doc! {
                    "$pull": { "videos": video },
                    "$set": { "updated_at": DateTime::now() },
                },
            )
            .return_document(ReturnDocument::After)
            .await?;

        Ok(playlist)
    }
}

/// Playlist detail: member videos joined and projected to their public
/// fields
fn detail_pipeline(id: ObjectId) -> Vec<Document> {
    PipelineBuilder::new()
        .stage(stage::match_stage(doc! { "_id": id }))
        .stage(stage::lookup_pipeline(
            "videos",
            "videos",
            "_id",
            "videos",
            vec![stage::project(doc! {
                "title": 1,
                "description": 1,
                "videoUrl": "$video_url",
                "thumbnailUrl": "$thumbnail_url",
                "duration": 1,
                "views": 1,
            })],
        ))
        .stage(stage::project(doc! {
            "name": 1,
            "description": 1,
            "createdAt": "$created_at",
            "videos": 1,
        }))
        .build()
}

/// Per-user playlist summaries with member and view totals
fn summaries_pipeline(owner: ObjectId) -> Vec<Document> {
    PipelineBuilder::new()
        .stage(stage::match_stage(doc! { "owner": owner }))
        .stage(stage::lookup(
            "videos",
            "videos",
            "_id",
            "playlist_videos",
        ))
        .stage(stage::add_fields(doc! {
            "totalVideos": stage::size_of("playlist_videos"),
            "totalViews": stage::sum_of("playlist_videos.views"),
        }))
        .stage(stage::project(doc! {
            "name": 1,
            "description": 1,
            "totalVideos": 1,
            "totalViews": 1,
        }))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summaries_compute_totals_from_the_join() {
        let owner = ObjectId::new();
        let pipeline = summaries_pipeline(owner);

        assert_eq!(pipeline[0], doc! { "$match": { "owner": owner } });
        assert_eq!(
            pipeline[2],
            doc! { "$addFields": {
                "totalVideos": { "$size": "$playlist_videos" },
                "totalViews": { "$sum": "$playlist_videos.views" },
            } }
        );
    }

    #[test]
    fn detail_joins_member_videos_in_place() {
        let id = ObjectId::new();
        let pipeline = detail_pipeline(id);

        let lookup = pipeline[1].get_document("$lookup").unwrap();
        assert_eq!(lookup.get_str("from").unwrap(), "videos");
        assert_eq!(lookup.get_str("localField").unwrap(), "videos");
        assert_eq!(lookup.get_str("as").unwrap(), "videos");
    }
}
