//! Turn Service - Drives the game session through its turns
//!
//! Owns the single in-memory session. Every intent locks the session only
//! long enough to validate and record the transition; the gateway call runs
//! without the lock and its outcome is applied afterwards, provided no reset
//! happened in between.

use std::sync::Arc;

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::application::dto::{SceneDto, SessionView};
use crate::application::ports::outbound::GenerativePort;
use crate::application::services::narration::{Narration, NarrationTicket};
use crate::application::services::story_gateway::{GatewayError, StoryGateway};
use crate::domain::entities::{Session, SessionStatus};
use crate::domain::value_objects::{AiReply, AudioClip, StorySettings, CREDENTIAL_ERROR_MESSAGE};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TurnError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("A turn is already in progress")]
    Busy,
}

#[derive(Debug, Default)]
struct TurnState {
    session: Session,
    /// Bumped on every reset; results from an older epoch are discarded
    epoch: u64,
    turn_cancel: Option<CancellationToken>,
    narration: Narration,
}

/// Work captured under the lock for a scene request
struct PendingTurn {
    epoch: u64,
    cancel: CancellationToken,
    player_name: String,
    theme: String,
    previous: Option<(String, String)>,
}

pub struct TurnService<P: GenerativePort> {
    gateway: StoryGateway<P>,
    state: RwLock<TurnState>,
    shutdown: CancellationToken,
}

impl<P: GenerativePort> TurnService<P> {
    pub fn new(gateway: StoryGateway<P>) -> Self {
        Self {
            gateway,
            state: RwLock::new(TurnState::default()),
            shutdown: CancellationToken::new(),
        }
    }

    /// Parent token of every in-flight call; cancelling it abandons them all
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Start a new game and wait for its opening scene
    pub async fn start_game(&self, player_name: &str, theme: &str) -> Result<(), TurnError> {
        let player_name = required(player_name, "player name")?;
        let theme = required(theme, "theme")?;

        let pending = {
            let mut state = self.state.write().await;
            if state.session.is_busy {
                return Err(TurnError::Busy);
            }

            state.narration.stop();
            if !self.gateway.is_configured() {
                tracing::error!("Cannot start a game without an API key");
                state.session.fail_fatal(CREDENTIAL_ERROR_MESSAGE);
                return Ok(());
            }

            tracing::info!(player = %player_name, theme = %theme, "Starting new game");
            state.session.begin_game(player_name, theme);
            self.begin_pending(&mut state, None)
        };

        let outcome = self
            .gateway
            .request_initial_scene(&pending.player_name, &pending.theme, &pending.cancel)
            .await;
        self.resolve_scene(pending, outcome).await;
        Ok(())
    }

    /// Submit one of the current choices and wait for the next scene.
    ///
    /// Ignored unless a game is in progress with a scene on display.
    pub async fn select_choice(&self, choice: &str) -> Result<(), TurnError> {
        let choice = required(choice, "choice")?;

        let pending = {
            let mut state = self.state.write().await;
            if state.session.is_busy {
                return Err(TurnError::Busy);
            }
            if !state.session.accepts_choices() {
                tracing::debug!(status = ?state.session.status, "Choice ignored");
                return Ok(());
            }

            state.narration.stop();
            if !self.gateway.is_configured() {
                tracing::error!("Cannot continue the game without an API key");
                state.session.fail_fatal(CREDENTIAL_ERROR_MESSAGE);
                return Ok(());
            }

            let narrative = state
                .session
                .scene
                .as_ref()
                .map(|scene| scene.narrative.clone())
                .unwrap_or_default();

            tracing::info!(choice = %choice, "Player chose");
            state.session.begin_turn();
            self.begin_pending(&mut state, Some((narrative, choice)))
        };

        let (narrative, choice) = pending.previous.clone().unwrap_or_default();
        let outcome = self
            .gateway
            .request_next_scene(
                &narrative,
                &choice,
                &pending.player_name,
                &pending.theme,
                &pending.cancel,
            )
            .await;
        self.resolve_scene(pending, outcome).await;
        Ok(())
    }

    /// Back to the welcome state, abandoning any outstanding work
    pub async fn reset_game(&self) {
        let mut state = self.state.write().await;
        state.epoch += 1;
        if let Some(cancel) = state.turn_cancel.take() {
            cancel.cancel();
        }
        state.narration.stop();
        state.session.reset();
        tracing::info!(epoch = state.epoch, "Game reset");
    }

    fn begin_pending(
        &self,
        state: &mut TurnState,
        previous: Option<(String, String)>,
    ) -> PendingTurn {
        let cancel = self.shutdown.child_token();
        state.turn_cancel = Some(cancel.clone());

        PendingTurn {
            epoch: state.epoch,
            cancel,
            player_name: state.session.player_name.clone(),
            theme: state.session.theme.clone(),
            previous,
        }
    }

    async fn resolve_scene(&self, pending: PendingTurn, outcome: Result<AiReply, GatewayError>) {
        let outcome = match outcome {
            Ok(reply) => {
                let image = if reply.image_prompt.trim().is_empty() {
                    None
                } else {
                    Some(
                        self.gateway
                            .request_image(&reply.image_prompt, &pending.cancel)
                            .await,
                    )
                };
                Ok((reply, image))
            }
            Err(e) => Err(e),
        };

        let mut state = self.state.write().await;
        if state.epoch != pending.epoch {
            tracing::debug!("Discarding scene from a previous game");
            return;
        }
        state.turn_cancel = None;

        match outcome {
            Ok((reply, image)) => {
                tracing::info!(
                    choices = reply.choices.len(),
                    game_over = reply.is_game_over,
                    "Scene ready"
                );
                state.narration.stop();
                state.session.apply_reply(reply, image);
            }
            Err(GatewayError::Credential(message)) => {
                state.narration.stop();
                state.session.fail_fatal(message);
            }
            Err(GatewayError::Cancelled) => state.session.finish_turn(),
            Err(e) => {
                tracing::warn!("Turn failed: {}", e);
                state.session.fail_turn(e.to_string());
            }
        }
    }

    /// Stop active narration, or start narrating the current scene
    pub async fn toggle_narration(&self) {
        let active = self.state.read().await.narration.is_active();
        if active {
            self.state.write().await.narration.stop();
        } else {
            self.start_narration().await;
        }
    }

    /// Narrate the current scene, replacing any active narration
    pub async fn start_narration(&self) {
        let (ticket, text) = {
            let mut state = self.state.write().await;
            let Some(scene) = state.session.scene.as_ref() else {
                return;
            };
            let (scene_id, text) = (scene.id, scene.narrative.clone());
            (state.narration.begin(scene_id), text)
        };

        let NarrationTicket { request, cancel } = ticket;
        let outcome = self.gateway.request_narration(&text, &cancel).await;

        let mut state = self.state.write().await;
        if !state.narration.complete(request, outcome) {
            tracing::debug!("Discarding narration for a scene no longer shown");
        }
    }

    /// Playback of the current clip ended
    pub async fn finish_narration(&self) {
        self.state.write().await.narration.finish();
    }

    pub async fn current_clip(&self) -> Option<Arc<AudioClip>> {
        self.state.read().await.narration.current_clip()
    }

    /// Read-only projection of the session for the game shell
    pub async fn snapshot(&self) -> SessionView {
        let state = self.state.read().await;
        let session = &state.session;

        SessionView {
            status: session.status,
            player_name: session.player_name.clone(),
            theme: session.theme.clone(),
            scene: session.scene.as_ref().map(SceneDto::from),
            choices: session.choices.clone(),
            pending_error: session.pending_error.clone(),
            fatal_error: session.fatal_error.clone(),
            is_busy: session.is_busy,
            narration: state.narration.status(),
            narration_error: state.narration.error().map(str::to_string),
            play_again_label: play_again_label(session, self.gateway.settings()),
        }
    }
}

fn required(value: &str, field: &str) -> Result<String, TurnError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(TurnError::InvalidInput(format!("{} must not be empty", field)));
    }
    Ok(value.to_string())
}

/// The game-over button label: the model's own "play again" choice when it
/// offered one, else the configured default
fn play_again_label(session: &Session, settings: &StorySettings) -> Option<String> {
    if session.status != SessionStatus::GameOver {
        return None;
    }

    let phrase = settings.play_again_phrase.to_lowercase();
    let label = session
        .choices
        .first()
        .filter(|choice| !phrase.is_empty() && choice.to_lowercase().contains(&phrase))
        .cloned()
        .unwrap_or_else(|| settings.play_again_label.clone());
    Some(label)
}
