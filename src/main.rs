//! Story Forge - AI-driven interactive fiction server
//!
//! The server:
//! - Runs one in-memory game session per process
//! - Asks Gemini for each scene, its illustration and optional narration
//! - Serves the game shell a JSON projection of the session over HTTP

mod application;
mod domain;
mod infrastructure;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{routing::get, Router};
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::infrastructure::config::AppConfig;
use crate::infrastructure::http;
use crate::infrastructure::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "story_forge=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Story Forge");

    // Load configuration
    let config = AppConfig::from_env()?;
    tracing::info!("Configuration loaded");
    tracing::info!("  Gemini: {}", config.gemini_base_url);
    tracing::info!("  Text model: {}", config.story.text_model);
    tracing::info!("  Image model: {}", config.story.image_model);
    tracing::info!("  Narration: {} ({})", config.story.tts_model, config.story.tts_voice);
    tracing::info!("  Language: {}", config.story.language);
    if config.api_key.is_none() {
        tracing::warn!("GEMINI_API_KEY is not set; games will end in a fatal error");
    }

    let port = config.server_port;
    let shutdown = CancellationToken::new();
    let state = Arc::new(AppState::new(&config, shutdown.clone()));
    tracing::info!("Application state initialized");

    // Build the router
    let app = Router::new()
        .route("/health", get(health_check))
        // Merge REST API routes
        .merge(http::create_routes())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start the server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let server = axum::serve(listener, app);

    // Wait for shutdown signal (Ctrl+C)
    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received, abandoning in-flight requests");
            shutdown.cancel();
        }
    }

    Ok(())
}

async fn health_check() -> &'static str {
    "OK"
}
