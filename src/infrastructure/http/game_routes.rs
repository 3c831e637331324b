//! Game API routes

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::application::dto::{SelectChoiceRequest, SessionView, StartGameRequest, ThemeCatalogDto};
use crate::application::services::TurnError;
use crate::domain::value_objects::DEFAULT_THEME;
use crate::infrastructure::state::AppState;

fn turn_error(error: TurnError) -> (StatusCode, String) {
    let status = match error {
        TurnError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        TurnError::Busy => StatusCode::CONFLICT,
    };
    (status, error.to_string())
}

/// Current session projection
pub async fn get_game(State(state): State<Arc<AppState>>) -> Json<SessionView> {
    Json(state.turns.snapshot().await)
}

/// Title and welcome-screen themes
pub async fn get_themes() -> Json<ThemeCatalogDto> {
    Json(ThemeCatalogDto::default())
}

/// Start a new game; responds once the opening scene is resolved
pub async fn start_game(
    State(state): State<Arc<AppState>>,
    Json(req): Json<StartGameRequest>,
) -> Result<Json<SessionView>, (StatusCode, String)> {
    let theme = req.theme.as_deref().unwrap_or(DEFAULT_THEME);
    state
        .turns
        .start_game(&req.player_name, theme)
        .await
        .map_err(turn_error)?;

    Ok(Json(state.turns.snapshot().await))
}

/// Submit a choice; responds once the next scene is resolved
pub async fn select_choice(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SelectChoiceRequest>,
) -> Result<Json<SessionView>, (StatusCode, String)> {
    state
        .turns
        .select_choice(&req.choice)
        .await
        .map_err(turn_error)?;

    Ok(Json(state.turns.snapshot().await))
}

pub async fn reset_game(State(state): State<Arc<AppState>>) -> Json<SessionView> {
    state.turns.reset_game().await;
    Json(state.turns.snapshot().await)
}
