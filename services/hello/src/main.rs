//! Hello-world example service: a handful of static routes on the same
//! bootstrap skeleton the real services use.

use anyhow::Result;
use axum::{Router, response::Html, routing::get};
use std::env;
use tokio::net::TcpListener;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let app = Router::new()
        .route("/", get(|| async { "Hello World" }))
        .route("/twitter", get(|| async { "nitishGoswami" }))
        .route("/login", get(|| async { Html("<h1>Login Page</h1>") }))
        .route("/yt", get(|| async { Html("<h2>CoffeeCoder</h2>") }));

    let bind_addr = env::var("HELLO_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:4000".to_string());
    let listener = TcpListener::bind(&bind_addr).await?;
    info!("Hello service listening on {}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
