//! User repository for database operations

use anyhow::Result;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use mongodb::bson::{DateTime, doc, oid::ObjectId};
use mongodb::{Collection, Database};
use tracing::info;

use crate::models::{Role, User};

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
        self.db.collection::<User>("auth_users")
    }

    /// Create a new user
    pub async fn create(
        &self,
        username: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<User> {
        info!("Creating new user: {}", username);

        let password_hash = hash_password(password)?;
        let now = DateTime::now();

        let user = User {
            id: None,
            username: username.to_string(),
            email: email.to_lowercase(),
            password_hash,
            role,
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
}

fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    let argon2 = Argon2::default();

    Ok(argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?
        .to_string())
}
