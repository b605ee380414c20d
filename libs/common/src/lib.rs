//! Common library for the Cliptide application
//!
//! This crate provides shared functionality used across the Cliptide
//! services: MongoDB connectivity, error handling, aggregation pipeline
//! construction, and pagination.

pub mod database;
pub mod error;
pub mod pagination;
pub mod pipeline;

/// Example usage of the database module
///
/// ```rust,no_run
/// use common::database::{DatabaseConfig, init_database, health_check};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = DatabaseConfig::from_env()?;
///     let db = init_database(&config).await?;
///     let is_healthy = health_check(&db).await?;
///     println!("Database health check: {}", is_healthy);
///     Ok(())
/// }
/// ```
pub fn example_usage() {}
