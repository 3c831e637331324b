//! Session entity - The state of the running game
//!
//! `Session` only knows how to move between states; deciding *when* to move
//! (and talking to the story model) belongs to the turn service.

use serde::Serialize;

use crate::domain::entities::Scene;
use crate::domain::value_objects::AiReply;

/// Which view the game shell should show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionStatus {
    #[default]
    Welcome,
    Playing,
    GameOver,
    FatalError,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub player_name: String,
    pub theme: String,
    pub scene: Option<Scene>,
    /// Options for the current scene, in display order
    pub choices: Vec<String>,
    pub status: SessionStatus,
    /// Non-fatal error shown next to the current scene
    pub pending_error: Option<String>,
    /// Blocking error shown in `FatalError` status
    pub fatal_error: Option<String>,
    /// A scene request is outstanding
    pub is_busy: bool,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Back to the welcome state, whatever the current state is
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Start a fresh game and mark the opening turn as outstanding
    pub fn begin_game(&mut self, player_name: impl Into<String>, theme: impl Into<String>) {
        self.player_name = player_name.into();
        self.theme = theme.into();
        self.scene = None;
        self.fatal_error = None;
        self.status = SessionStatus::Playing;
        self.begin_turn();
    }

    /// Mark a follow-up turn as outstanding
    pub fn begin_turn(&mut self) {
        self.pending_error = None;
        self.choices.clear();
        self.is_busy = true;
    }

    /// Whether a choice can currently be submitted
    pub fn accepts_choices(&self) -> bool {
        self.status == SessionStatus::Playing
            && self.scene.is_some()
            && !self.player_name.is_empty()
    }

    /// Replace the scene with the one produced by a successful turn
    pub fn apply_reply(&mut self, reply: AiReply, image_location: Option<String>) {
        let scene = Scene::new(reply.narrative, reply.image_prompt).with_image(image_location);
        self.scene = Some(scene);
        self.choices = reply.choices;
        self.status = if reply.is_game_over {
            SessionStatus::GameOver
        } else {
            SessionStatus::Playing
        };
        self.pending_error = None;
        self.is_busy = false;
    }

    /// Record a non-fatal turn failure; status stays as it was
    pub fn fail_turn(&mut self, message: impl Into<String>) {
        self.pending_error = Some(non_empty(message.into(), "An unknown error occurred."));
        self.is_busy = false;
    }

    /// Enter the fatal state, which only a reset leaves
    pub fn fail_fatal(&mut self, message: impl Into<String>) {
        self.fatal_error = Some(non_empty(message.into(), "An unknown fatal error occurred."));
        self.pending_error = None;
        self.scene = None;
        self.choices.clear();
        self.status = SessionStatus::FatalError;
        self.is_busy = false;
    }

    /// Clear the busy flag without touching anything else
    pub fn finish_turn(&mut self) {
        self.is_busy = false;
    }
}

fn non_empty(message: String, fallback: &str) -> String {
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}
