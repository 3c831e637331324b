//! Narration sub-state attached to the displayed scene
//!
//! `idle -> generating -> speaking -> idle`. At most one clip is alive at a
//! time; stopping drops it and cancels any synthesis still in flight.

use std::sync::Arc;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::application::services::story_gateway::GatewayError;
use crate::domain::value_objects::{AudioClip, SceneId};

const NARRATION_UNAVAILABLE: &str = "Could not generate the narration.";

/// Externally visible narration status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NarrationStatus {
    Idle,
    Generating,
    Speaking,
}

#[derive(Debug, Default)]
enum NarrationState {
    #[default]
    Idle,
    Generating {
        request: u64,
        scene_id: SceneId,
        cancel: CancellationToken,
    },
    Speaking {
        scene_id: SceneId,
        clip: Arc<AudioClip>,
    },
}

/// Narration ticket handed out by [`Narration::begin`]
#[derive(Debug, Clone)]
pub struct NarrationTicket {
    pub request: u64,
    pub cancel: CancellationToken,
}

#[derive(Debug, Default)]
pub struct Narration {
    state: NarrationState,
    next_request: u64,
    error: Option<String>,
}

impl Narration {
    pub fn status(&self) -> NarrationStatus {
        match self.state {
            NarrationState::Idle => NarrationStatus::Idle,
            NarrationState::Generating { .. } => NarrationStatus::Generating,
            NarrationState::Speaking { .. } => NarrationStatus::Speaking,
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self.state, NarrationState::Idle)
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// The clip being played, if any
    pub fn current_clip(&self) -> Option<Arc<AudioClip>> {
        match &self.state {
            NarrationState::Speaking { clip, .. } => Some(Arc::clone(clip)),
            _ => None,
        }
    }

    /// Start generating narration for `scene_id`, stopping whatever was active
    pub fn begin(&mut self, scene_id: SceneId) -> NarrationTicket {
        self.stop();

        self.next_request += 1;
        let cancel = CancellationToken::new();
        self.state = NarrationState::Generating {
            request: self.next_request,
            scene_id,
            cancel: cancel.clone(),
        };

        NarrationTicket {
            request: self.next_request,
            cancel,
        }
    }

    /// Apply the outcome of a synthesis request.
    ///
    /// Returns false when the request was stopped or superseded meanwhile; the
    /// outcome is dropped in that case.
    pub fn complete(
        &mut self,
        request: u64,
        outcome: Result<Option<AudioClip>, GatewayError>,
    ) -> bool {
        let scene_id = match &self.state {
            NarrationState::Generating {
                request: current,
                scene_id,
                ..
            } if *current == request => *scene_id,
            _ => return false,
        };

        self.state = match outcome {
            Ok(Some(clip)) => {
                tracing::debug!(
                    scene = %scene_id,
                    clip = %clip.id,
                    duration_ms = clip.duration_ms(),
                    "Narration ready"
                );
                NarrationState::Speaking {
                    scene_id,
                    clip: Arc::new(clip),
                }
            }
            Ok(None) => {
                self.error = Some(NARRATION_UNAVAILABLE.to_string());
                NarrationState::Idle
            }
            Err(GatewayError::Cancelled) => NarrationState::Idle,
            Err(e) => {
                self.error = Some(e.to_string());
                NarrationState::Idle
            }
        };
        true
    }

    /// Playback ended on its own
    pub fn finish(&mut self) {
        if let NarrationState::Speaking { scene_id, .. } = &self.state {
            tracing::debug!(scene = %scene_id, "Narration finished");
            self.state = NarrationState::Idle;
        }
    }

    /// Halt playback or synthesis and release the clip
    pub fn stop(&mut self) {
        if let NarrationState::Generating { cancel, .. } = &self.state {
            cancel.cancel();
        }
        self.state = NarrationState::Idle;
        self.error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::AudioEncoding;

    fn clip() -> AudioClip {
        AudioClip::from_pcm(&[0u8; 4], AudioEncoding::default())
    }

    #[test]
    fn test_generating_then_speaking() {
        let mut narration = Narration::default();
        let ticket = narration.begin(SceneId::new());
        assert_eq!(narration.status(), NarrationStatus::Generating);

        assert!(narration.complete(ticket.request, Ok(Some(clip()))));
        assert_eq!(narration.status(), NarrationStatus::Speaking);
        assert!(narration.current_clip().is_some());

        narration.finish();
        assert_eq!(narration.status(), NarrationStatus::Idle);
        assert!(narration.current_clip().is_none());
    }

    #[test]
    fn test_stop_cancels_generation() {
        let mut narration = Narration::default();
        let ticket = narration.begin(SceneId::new());
        narration.stop();

        assert!(ticket.cancel.is_cancelled());
        assert!(!narration.complete(ticket.request, Ok(Some(clip()))));
        assert_eq!(narration.status(), NarrationStatus::Idle);
    }

    #[test]
    fn test_restart_supersedes_previous_request() {
        let mut narration = Narration::default();
        let first = narration.begin(SceneId::new());
        let second = narration.begin(SceneId::new());

        assert!(first.cancel.is_cancelled());
        assert!(!narration.complete(first.request, Ok(Some(clip()))));
        assert!(narration.complete(second.request, Ok(Some(clip()))));
    }

    #[test]
    fn test_absent_audio_sets_error() {
        let mut narration = Narration::default();
        let ticket = narration.begin(SceneId::new());
        narration.complete(ticket.request, Ok(None));

        assert_eq!(narration.status(), NarrationStatus::Idle);
        assert_eq!(narration.error(), Some(NARRATION_UNAVAILABLE));
    }

    #[test]
    fn test_failure_sets_error_and_stop_clears_it() {
        let mut narration = Narration::default();
        let ticket = narration.begin(SceneId::new());
        narration.complete(
            ticket.request,
            Err(GatewayError::NarrationFailed("speech failed".into())),
        );
        assert_eq!(narration.error(), Some("speech failed"));

        narration.stop();
        assert!(narration.error().is_none());
    }

    #[test]
    fn test_stop_releases_clip() {
        let mut narration = Narration::default();
        let ticket = narration.begin(SceneId::new());
        narration.complete(ticket.request, Ok(Some(clip())));
        let held = narration.current_clip().unwrap();
        assert_eq!(Arc::strong_count(&held), 2);

        narration.stop();
        assert_eq!(Arc::strong_count(&held), 1);
    }
}
