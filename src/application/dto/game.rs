use serde::{Deserialize, Serialize};

use crate::application::services::NarrationStatus;
use crate::domain::entities::{Scene, SessionStatus};
use crate::domain::value_objects::{DEFAULT_THEME, GAME_TITLE, SUGGESTED_THEMES};

// ============================================================================
// Requests
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartGameRequest {
    pub player_name: String,
    #[serde(default)]
    pub theme: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SelectChoiceRequest {
    pub choice: String,
}

// ============================================================================
// Read-only projections
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneDto {
    pub id: String,
    pub narrative: String,
    pub image_prompt: String,
    pub image_location: Option<String>,
    pub created_at: String,
}

impl From<&Scene> for SceneDto {
    fn from(scene: &Scene) -> Self {
        Self {
            id: scene.id.to_string(),
            narrative: scene.narrative.clone(),
            image_prompt: scene.image_prompt.clone(),
            image_location: scene.image_location.clone(),
            created_at: scene.created_at.to_rfc3339(),
        }
    }
}

/// Everything the game shell needs to render the current state
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub status: SessionStatus,
    pub player_name: String,
    pub theme: String,
    pub scene: Option<SceneDto>,
    pub choices: Vec<String>,
    pub pending_error: Option<String>,
    pub fatal_error: Option<String>,
    pub is_busy: bool,
    pub narration: NarrationStatus,
    pub narration_error: Option<String>,
    /// Button label for the game-over screen
    pub play_again_label: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeCatalogDto {
    pub title: String,
    pub default_theme: String,
    pub themes: Vec<String>,
}

impl Default for ThemeCatalogDto {
    fn default() -> Self {
        Self {
            title: GAME_TITLE.to_string(),
            default_theme: DEFAULT_THEME.to_string(),
            themes: SUGGESTED_THEMES.iter().map(|t| t.to_string()).collect(),
        }
    }
}
