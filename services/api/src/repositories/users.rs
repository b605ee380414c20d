//! User repository for database operations

use anyhow::Result;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use futures::TryStreamExt;
use mongodb::bson::{DateTime, Document, doc, from_document, oid::ObjectId};
use mongodb::options::ReturnDocument;
use mongodb::{Collection, Database};
use tracing::info;

use common::pipeline::{PipelineBuilder, stage};

use crate::models::user::{ChannelProfile, Role, User, WatchHistoryVideo};

/// User repository
#[derive(Clone)]
pub struct UserRepository {
    db: Database,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn collection(&self) -> Collection<User> {
        self.db.collection::<User>("users")
    }

    fn documents(&self) -> Collection<Document> {
        self.db.collection::<Document>("users")
    }

    /// Create a new user with a freshly hashed credential
    pub async fn create(
        &self,
        username: &str,
        email: &str,
        full_name: &str,
        password: &str,
    ) -> Result<User> {
        info!("Creating new user: {}", username);

        let password_hash = hash_password(password)?;
        let now = DateTime::now();

        let user = User {
            id: None,
            username: username.to_string(),
            email: email.to_lowercase(),
            full_name: full_name.to_string(),
            password_hash,
            role: Role::User,
            avatar_url: None,
            cover_image_url: None,
            watch_history: vec![],
            refresh_token: None,
            created_at: now,
            updated_at: now,
        };

        let inserted = self.collection().insert_one(&user).await?;
        let id = inserted
            .inserted_id
            .as_object_id()
            .ok_or_else(|| anyhow::anyhow!("Inserted user has no object id"))?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Created user could not be read back"))
    }

    /// Find a user by ID
    pub async fn find_by_id(&self, id: ObjectId) -> Result<Option<User>> {
        let user = self.collection().find_one(doc! { "_id": id }).await?;
        Ok(user)
    }

    /// Find a user by username
    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = self
            .collection()
            .find_one(doc! { "username": username })
            .await?;
        Ok(user)
    }

    /// Find a user matching either the username or the email
    pub async fn find_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Option<User>> {
        let user = self
            .collection()
            .find_one(doc! {
                "$or": [
                    { "username": username },
                    { "email": email.to_lowercase() },
                ]
            })
            .await?;
        Ok(user)
    }

    /// Verify a password against the stored credential hash
    pub fn verify_password(&self, user: &User, password: &str) -> Result<bool> {
        let parsed_hash = PasswordHash::new(&user.password_hash)
            .map_err(|e| anyhow::anyhow!("Stored credential hash is invalid: {}", e))?;

        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Replace the stored credential hash
    pub async fn change_password(&self, id: ObjectId, new_password: &str) -> Result<()> {
        let password_hash = hash_password(new_password)?;

        self.collection()
            .update_one(
                doc! { "_id": id },
                doc! { "$set": { "password_hash": password_hash, "updated_at": DateTime::now() } },
            )
            .await?;

        Ok(())
    }

    /// Store or clear the refresh token; cleared on logout
    pub async fn set_refresh_token(&self, id: ObjectId, token: Option<&str>) -> Result<()> {
        let update = match token {
            Some(token) => doc! { "$set": { "refresh_token": token } },
            None => doc! { "$unset": { "refresh_token": "" } },
        };

        self.collection()
            .update_one(doc! { "_id": id }, update)
            .await?;

        Ok(())
    }

    /// Update account details, returning the new document
    pub async fn update_account(
        &self,
        id: ObjectId,
        full_name: &str,
        email: &str,
    ) -> Result<Option<User>> {
        let user = self
            .collection()
            .find_one_and_update(
                doc! { "_id": id },
                doc! { "$set": {
                    "full_name": full_name,
                    "email": email.to_lowercase(),
                    "updated_at": DateTime::now(),
                } },
            )
            .return_document(ReturnDocument::After)
            .await?;

        Ok(user)
    }

    /// Store a newly uploaded avatar URL
    pub async fn set_avatar(&self, id: ObjectId, url: &str) -> Result<Option<User>> {
        self.set_media_field(id, "avatar_url", url).await
    }

    /// Store a newly uploaded cover image URL
    pub async fn set_cover_image(&self, id: ObjectId, url: &str) -> Result<Option<User>> {
        self.set_media_field(id, "cover_image_url", url).await
    }

    async fn set_media_field(
        &self,
        id: ObjectId,
        field: &str,
        url: &str,
    ) -> Result<Option<User>> {
        let user = self
            .collection()
            .find_one_and_update(
                doc! { "_id": id },
                doc! { "$set": { field: url, "updated_at": DateTime::now() } },
            )
            .return_document(ReturnDocument::After)
            .await?;

        Ok(user)
    }

    /// Record a watched video, de-duplicated
    pub async fn add_to_watch_history(&self, user_id: ObjectId, video_id: ObjectId) -> Result<()> {
        self.collection()
            .update_one(
                doc! { "_id": user_id },
                doc! { "$addToSet": { "watch_history": video_id } },
            )
            .await?;

        Ok(())
    }

    /// Channel profile with subscriber counts and the viewer's subscription
    /// state
    pub async fn channel_profile(
        &self,
        username: &str,
        viewer: ObjectId,
    ) -> Result<Option<ChannelProfile>> {
        let pipeline = channel_profile_pipeline(username, viewer);

        let mut cursor = self.documents().aggregate(pipeline).await?;

        match cursor.try_next().await? {
            Some(doc) => Ok(Some(from_document(doc)?)),
            None => Ok(None),
        }
    }

    /// The user's watch history with each video's owner flattened to a
    /// summary
    pub async fn watch_history(&self, user_id: ObjectId) -> Result<Vec<WatchHistoryVideo>> {
        let pipeline = watch_history_pipeline(user_id);

        let mut cursor = self.documents().aggregate(pipeline).await?;

        let Some(doc) = cursor.try_next().await? else {
            return Ok(vec![]);
        };

        let mut videos = Vec::new();
        if let Ok(entries) = doc.get_array("watch_history") {
            for entry in entries {
                if let Some(entry) = entry.as_document() {
                    videos.push(from_document(entry.clone())?);
                }
            }
        }

        Ok(videos)
    }
}

fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    let argon2 = Argon2::default();

    Ok(argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?
        .to_string())
}

/// Owner summary projection used inside display joins
pub(crate) fn owner_summary_projection() -> Document {
    doc! {
        "username": 1,
        "fullName": "$full_name",
        "avatarUrl": "$avatar_url",
    }
}

/// Channel profile aggregation: subscriber edges in both directions plus
/// the viewer's own subscription state
fn channel_profile_pipeline(username: &str, viewer: ObjectId) -> Vec<Document> {
    PipelineBuilder::new()
        .stage(stage::match_stage(doc! { "username": username }))
        .stage(stage::lookup("subscriptions", "_id", "channel", "subscribers"))
        .stage(stage::lookup(
            "subscriptions",
            "_id",
            "subscriber",
            "subscribed_to",
        ))
        .stage(stage::add_fields(doc! {
            "subscribersCount": stage::size_of("subscribers"),
            "channelsSubscribedToCount": stage::size_of("subscribed_to"),
            "isSubscribed": stage::in_array(viewer, "subscribers.subscriber"),
        }))
        .stage(stage::project(doc! {
            "username": 1,
            "fullName": "$full_name",
            "avatarUrl": "$avatar_url",
            "coverImageUrl": "$cover_image_url",
            "subscribersCount": 1,
            "channelsSubscribedToCount": 1,
            "isSubscribed": 1,
        }))
        .build()
}

/// Watch-history aggregation: join watched videos, flatten each video's
/// owner to a summary via a first-element extraction
fn watch_history_pipeline(user_id: ObjectId) -> Vec<Document> {
    PipelineBuilder::new()
        .stage(stage::match_stage(doc! { "_id": user_id }))
        .stage(stage::lookup_pipeline(
            "videos",
            "watch_history",
            "_id",
            "watch_history",
            PipelineBuilder::new()
                .stage(stage::lookup_pipeline(
                    "users",
                    "owner",
                    "_id",
                    "owner",
                    vec![stage::project(owner_summary_projection())],
                ))
                .stage(stage::add_fields(doc! { "owner": stage::first_of("owner") }))
                .stage(stage::project(doc! {
                    "title": 1,
                    "description": 1,
                    "videoUrl": "$video_url",
                    "thumbnailUrl": "$thumbnail_url",
                    "duration": 1,
                    "views": 1,
                    "createdAt": "$created_at",
                    "owner": 1,
                }))
                .build(),
        ))
        .stage(stage::project(doc! { "watch_history": 1 }))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_profile_pipeline_computes_conditional_subscription() {
        let viewer = ObjectId::new();
        let pipeline = channel_profile_pipeline("nitish", viewer);

        assert_eq!(pipeline.len(), 5);
        assert_eq!(
            pipeline[0],
            doc! { "$match": { "username": "nitish" } }
        );

        let add_fields = pipeline[3].get_document("$addFields").unwrap();
        assert!(add_fields.contains_key("subscribersCount"));
        assert!(add_fields.contains_key("isSubscribed"));

        // Credential fields never leave the store.
        let projection = pipeline[4].get_document("$project").unwrap();
        assert!(!projection.contains_key("password_hash"));
        assert!(!projection.contains_key("refresh_token"));
    }

    #[test]
    fn watch_history_pipeline_flattens_the_owner() {
        let pipeline = watch_history_pipeline(ObjectId::new());

        let lookup = pipeline[1].get_document("$lookup").unwrap();
        assert_eq!(lookup.get_str("from").unwrap(), "videos");
        assert_eq!(lookup.get_str("localField").unwrap(), "watch_history");

        let nested = lookup.get_array("pipeline").unwrap();
        let add_fields = nested[1]
            .as_document()
            .unwrap()
            .get_document("$addFields")
            .unwrap();
        assert_eq!(
            add_fields.get_document("owner").unwrap(),
            &doc! { "$first": "$owner" }
        );
    }

    #[test]
    fn password_hashing_round_trip() {
        let hash = hash_password("S3cure-pass!").unwrap();
        let parsed = PasswordHash::new(&hash).unwrap();

        assert!(
            Argon2::default()
                .verify_password(b"S3cure-pass!", &parsed)
                .is_ok()
        );
        assert!(
            Argon2::default()
                .verify_password(b"wrong-pass", &parsed)
                .is_err()
        );
    }
}
