//! Custom error types for the common library
//!
//! This module defines application-specific error types that can be used
//! throughout the application.

use mongodb::error::Error as MongoError;
use thiserror::Error;

/// Custom error type for database operations
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error occurred during database connection
    #[error("Database connection error: {0}")]
    Connection(#[source] MongoError),

    /// Error occurred during query or aggregation execution
    #[error("Database query error: {0}")]
    Query(#[source] MongoError),

    /// A document could not be decoded into the expected shape
    #[error("Document decode error: {0}")]
    Decode(#[source] mongodb::bson::de::Error),

    /// Configuration error
    #[error("Database configuration error: {0}")]
    Configuration(String),
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;
