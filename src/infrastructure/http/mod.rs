//! HTTP REST API routes

mod game_routes;
mod narration_routes;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::infrastructure::state::AppState;

/// Create all API routes
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        // Game routes
        .route("/api/game", get(game_routes::get_game))
        .route("/api/themes", get(game_routes::get_themes))
        .route("/api/game/start", post(game_routes::start_game))
        .route("/api/game/choice", post(game_routes::select_choice))
        .route("/api/game/reset", post(game_routes::reset_game))
        // Narration routes
        .route(
            "/api/narration/toggle",
            post(narration_routes::toggle_narration),
        )
        .route(
            "/api/narration/finished",
            post(narration_routes::narration_finished),
        )
        .route(
            "/api/narration/audio",
            get(narration_routes::get_narration_audio),
        )
}
