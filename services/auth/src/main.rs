use anyhow::Result;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

mod error;
mod jwt;
mod middleware;
mod models;
mod rate_limiter;
mod repository;
mod routes;
mod state;

use common::database::{DatabaseConfig, init_database};
use std::env;
use tokio::net::TcpListener;

use crate::{
    jwt::{JwtConfig, JwtService},
    rate_limiter::{RateLimiter, RateLimiterConfig},
    repository::UserRepository,
    state::AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!("Starting auth service");

    // Initialize database connection
    let db_config = DatabaseConfig::from_env()?;
    let db = init_database(&db_config).await?;

    if common::database::health_check(&db).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    let app_state = AppState {
        user_repository: UserRepository::new(db),
        jwt_service: JwtService::new(JwtConfig::from_env()?),
        rate_limiter: RateLimiter::new(RateLimiterConfig::default()),
    };

    // Start the web server
    let app = routes::create_router(app_state);

    let bind_addr = env::var("AUTH_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3002".to_string());
    let listener = TcpListener::bind(&bind_addr).await?;
    info!("Auth service listening on {}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
