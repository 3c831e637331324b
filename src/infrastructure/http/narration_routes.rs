//! Narration API routes

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::application::dto::SessionView;
use crate::infrastructure::state::AppState;

/// Start narrating the current scene, or stop the active narration
pub async fn toggle_narration(State(state): State<Arc<AppState>>) -> Json<SessionView> {
    state.turns.toggle_narration().await;
    Json(state.turns.snapshot().await)
}

/// Called by the shell when playback reaches the end
pub async fn narration_finished(State(state): State<Arc<AppState>>) -> Json<SessionView> {
    state.turns.finish_narration().await;
    Json(state.turns.snapshot().await)
}

/// The current clip as a WAV file
pub async fn get_narration_audio(
    State(state): State<Arc<AppState>>,
) -> Result<Response, (StatusCode, String)> {
    let clip = state
        .turns
        .current_clip()
        .await
        .ok_or_else(|| (StatusCode::NOT_FOUND, "No narration is playing".to_string()))?;

    Ok((
        [
            (header::CONTENT_TYPE, clip.mime_type().to_string()),
            (header::CACHE_CONTROL, "no-store".to_string()),
        ],
        clip.wav.clone(),
    )
        .into_response())
}
