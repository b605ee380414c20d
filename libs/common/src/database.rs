//! Database module for handling MongoDB connections and operations
//!
//! This module provides client configuration, initialization, and health
//! checks for the MongoDB document store. The returned [`Database`] handle
//! is cheap to clone and is injected into services at startup rather than
//! referenced as ambient state.

use crate::error::{DatabaseError, DatabaseResult};
use mongodb::bson::doc;
use mongodb::{Client, Database};
use std::env;
use tracing::info;

/// Database configuration struct
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// MongoDB connection URI
    pub uri: String,
    /// Name of the database holding the application collections
    pub database: String,
}

impl DatabaseConfig {
    /// Create a new DatabaseConfig from environment variables
    pub fn from_env() -> DatabaseResult<Self> {
        let uri = env::var("MONGODB_URI")
            .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());

        let database = env::var("MONGODB_DATABASE").unwrap_or_else(|_| "cliptide".to_string());

        Ok(Self { uri, database })
    }
}

/// Initialize a MongoDB database handle
///
/// # Arguments
///
/// * `config` - Database configuration
///
/// # Returns
///
/// * `DatabaseResult<Database>` - Database handle or error
pub async fn init_database(config: &DatabaseConfig) -> DatabaseResult<Database> {
    let client = Client::with_uri_str(&config.uri)
        .await
        .map_err(DatabaseError::Connection)?;

    info!("MongoDB client initialized for database: {}", config.database);

    Ok(client.database(&config.database))
}

/// Check database connectivity
///
/// # Arguments
///
/// * `db` - Database handle
///
/// # Returns
///
/// * `DatabaseResult<bool>` - True if connection is successful, false otherwise
pub async fn health_check(db: &Database) -> DatabaseResult<bool> {
    db.run_command(doc! { "ping": 1 })
        .await
        .map_err(DatabaseError::Query)?;

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_database_config_from_env() {
        let config = DatabaseConfig::from_env().expect("Failed to create database config");
        assert_eq!(config.uri, "mongodb://localhost:27017");
        assert_eq!(config.database, "cliptide");
    }

    #[test]
    #[serial]
    fn test_database_config_honors_env_overrides() {
        unsafe {
            std::env::set_var("MONGODB_URI", "mongodb://db.internal:27017");
            std::env::set_var("MONGODB_DATABASE", "cliptide_test");
        }

        let config = DatabaseConfig::from_env().expect("Failed to create database config");
        assert_eq!(config.uri, "mongodb://db.internal:27017");
        assert_eq!(config.database, "cliptide_test");

        unsafe {
            std::env::remove_var("MONGODB_URI");
            std::env::remove_var("MONGODB_DATABASE");
        }
    }
}
