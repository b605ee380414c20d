use anyhow::Result;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

mod error;
mod jwt;
mod middleware;
mod models;
mod repositories;
mod response;
mod routes;
mod state;
mod storage;
mod validation;

use common::database::{DatabaseConfig, init_database};
use std::env;
use tokio::net::TcpListener;

use crate::{
    jwt::{JwtConfig, JwtService},
    repositories::{
        CommentRepository, DashboardRepository, LikeRepository, PlaylistRepository,
        SubscriptionRepository, TweetRepository, UserRepository, VideoRepository,
    },
    state::AppState,
    storage::MediaStorage,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!("Starting API service");

    // Initialize database connection
    let db_config = DatabaseConfig::from_env()?;
    let db = init_database(&db_config).await?;

    // Check database connectivity
    if common::database::health_check(&db).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    // Initialize token and media services
    let jwt_service = JwtService::new(JwtConfig::from_env()?);
    let media_storage = MediaStorage::from_env().await;

    info!("API service initialized successfully");

    // Initialize repositories
    let app_state = AppState {
        db: db.clone(),
        user_repository: UserRepository::new(db.clone()),
        video_repository: VideoRepository::new(db.clone()),
        comment_repository: CommentRepository::new(db.clone()),
        like_repository: LikeRepository::new(db.clone()),
        tweet_repository: TweetRepository::new(db.clone()),
        playlist_repository: PlaylistRepository::new(db.clone()),
        subscription_repository: SubscriptionRepository::new(db.clone()),
        dashboard_repository: DashboardRepository::new(db),
        jwt_service,
        media_storage,
    };

    // Start the web server
    let app = routes::create_router(app_state);

    let bind_addr = env::var("API_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3001".to_string());
    let listener = TcpListener::bind(&bind_addr).await?;
    info!("API service listening on {}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
