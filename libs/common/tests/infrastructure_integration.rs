//! Integration tests for the infrastructure components
//!
//! These tests verify that the MongoDB document store is properly
//! configured and accessible from the application. They need a live
//! `mongod` and are ignored by default; run them with
//! `cargo test -- --ignored` against a local instance.

use common::database::{DatabaseConfig, health_check, init_database};
use common::pagination::{PageRequest, paginate};
use common::pipeline::{ListingPipeline, stage};
use mongodb::bson::{Document, doc};

/// Verifies connectivity plus a round-trip through insert, aggregation
/// pagination, and cleanup
#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn test_infrastructure_integration() -> Result<(), Box<dyn std::error::Error>> {
    let db_config = DatabaseConfig::from_env()?;
    let db = init_database(&db_config).await?;

    assert!(health_check(&db).await?, "Database health check failed");

    let collection = db.collection::<Document>("integration_test_items");
    collection.delete_many(doc! {}).await?;

    for n in 0..5_i32 {
        collection
            .insert_one(doc! { "n": n, "published": n % 2 == 0 })
            .await?;
    }

    let pipeline = ListingPipeline::new()
        .require(doc! { "published": true })
        .display_stage(stage::project(doc! { "_id": 0, "n": 1 }))
        .compose();

    let page: common::pagination::Page<Document> =
        paginate(&collection, pipeline, PageRequest::new(Some(1), Some(2))).await?;

    assert_eq!(page.total_items, 3);
    assert_eq!(page.total_pages, 2);
    assert_eq!(page.items.len(), 2);
    assert!(page.has_next_page);

    collection.delete_many(doc! {}).await?;

    Ok(())
}
