//! AI reply - the structured result of one text-generation turn

use serde::Deserialize;

/// Normalized reply from the story model, consumed right away to build a Scene.
///
/// Field names follow the JSON the prompts ask for; `story` and `gameOver`
/// are accepted from older prompt wording.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiReply {
    #[serde(alias = "story")]
    pub narrative: String,
    /// English visual description, only used to request an image
    pub image_prompt: String,
    /// Three options normally; a single "play again" option on game over
    pub choices: Vec<String>,
    #[serde(default, alias = "gameOver")]
    pub is_game_over: bool,
}

#[cfg(test)]
impl AiReply {
    pub fn new(
        narrative: impl Into<String>,
        image_prompt: impl Into<String>,
        choices: Vec<String>,
    ) -> Self {
        Self {
            narrative: narrative.into(),
            image_prompt: image_prompt.into(),
            choices,
            is_game_over: false,
        }
    }

    pub fn game_over(mut self) -> Self {
        self.is_game_over = true;
        self
    }
}
