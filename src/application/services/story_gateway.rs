//! Story Gateway - AI-generated scenes, illustrations and narration
//!
//! Each operation builds a prompt, makes exactly one call to the generative
//! service and normalizes the outcome:
//!
//! - Scene requests go through the response parser and fail with
//!   `GenerationFailed` (or `Credential`, which the caller treats as fatal)
//! - Image requests never fail; any problem yields the placeholder image
//! - Narration consumes the whole speech stream and wraps the PCM in a WAV
//!
//! Every call races a cancellation token so a reset can abandon it.

use std::future::Future;

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::application::ports::outbound::{
    GenerativeError, GenerativePort, ImageRequest, SpeechRequest, TextRequest,
};
use crate::application::services::llm::{
    build_continuation_prompt, build_opening_prompt, parse_reply,
};
use crate::domain::value_objects::{
    AiReply, AudioClip, AudioEncoding, StorySettings, CREDENTIAL_ERROR_MESSAGE,
};

const OPENING_FAILED: &str =
    "Failed to generate the opening scene. The AI may be busy or an error occurred.";
const CONTINUATION_FAILED: &str =
    "Failed to generate the next scene. The AI may be busy or an error occurred.";
const NARRATION_FAILED: &str = "Failed to generate the narration.";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// Missing or rejected credential; fatal for the session
    #[error("{0}")]
    Credential(String),
    #[error("{0}")]
    GenerationFailed(String),
    #[error("{0}")]
    NarrationFailed(String),
    #[error("Request cancelled")]
    Cancelled,
}

/// Gateway between the game and the generative service
pub struct StoryGateway<P: GenerativePort> {
    port: P,
    settings: StorySettings,
}

impl<P: GenerativePort> StoryGateway<P> {
    pub fn new(port: P, settings: StorySettings) -> Self {
        Self { port, settings }
    }

    pub fn settings(&self) -> &StorySettings {
        &self.settings
    }

    pub fn is_configured(&self) -> bool {
        self.port.is_configured()
    }

    /// Generate the opening scene of a new game
    pub async fn request_initial_scene(
        &self,
        player_name: &str,
        theme: &str,
        cancel: &CancellationToken,
    ) -> Result<AiReply, GatewayError> {
        let prompt = build_opening_prompt(player_name, theme, &self.settings);
        let request = TextRequest::new(&self.settings.text_model, prompt)
            .json()
            .with_temperature(self.settings.opening_temperature);

        self.request_scene(request, OPENING_FAILED, cancel).await
    }

    /// Generate the scene that follows the player's choice
    pub async fn request_next_scene(
        &self,
        previous_narrative: &str,
        chosen_option: &str,
        player_name: &str,
        theme: &str,
        cancel: &CancellationToken,
    ) -> Result<AiReply, GatewayError> {
        let prompt = build_continuation_prompt(
            previous_narrative,
            chosen_option,
            player_name,
            theme,
            &self.settings,
        );
        let request = TextRequest::new(&self.settings.text_model, prompt)
            .json()
            .with_temperature(self.settings.continuation_temperature);

        self.request_scene(request, CONTINUATION_FAILED, cancel).await
    }

    async fn request_scene(
        &self,
        request: TextRequest,
        failure_message: &str,
        cancel: &CancellationToken,
    ) -> Result<AiReply, GatewayError> {
        tracing::debug!(model = %request.model, "Requesting scene");

        let raw = cancellable(cancel, self.port.generate_text(request))
            .await?
            .map_err(|e| {
                translate(e, || {
                    GatewayError::GenerationFailed(failure_message.to_string())
                })
            })?;

        parse_reply(&raw).map_err(|e| {
            tracing::error!("Scene response rejected: {}", e);
            tracing::debug!("Raw scene response: {}", raw);
            GatewayError::GenerationFailed(failure_message.to_string())
        })
    }

    /// Generate an illustration, falling back to the placeholder on any failure
    pub async fn request_image(&self, image_prompt: &str, cancel: &CancellationToken) -> String {
        let request = ImageRequest::single_jpeg(&self.settings.image_model, image_prompt);

        let images = match cancellable(cancel, self.port.generate_images(request)).await {
            Ok(Ok(images)) => images,
            Ok(Err(e)) => {
                tracing::warn!("Image generation failed, using placeholder: {}", e);
                return self.settings.placeholder_image_url.clone();
            }
            Err(_) => return self.settings.placeholder_image_url.clone(),
        };

        let first = images.into_iter().next().and_then(|image| {
            let mime_type = image.mime_type;
            image
                .data_base64
                .filter(|data| !data.is_empty())
                .map(|data| (data, mime_type))
        });

        match first {
            Some((data, mime_type)) => {
                let mime_type = mime_type.unwrap_or_else(|| "image/jpeg".to_string());
                format!("data:{};base64,{}", mime_type, data)
            }
            None => {
                tracing::warn!("Image service returned no image data, using placeholder");
                self.settings.placeholder_image_url.clone()
            }
        }
    }

    /// Synthesize narration for `text`.
    ///
    /// Returns `Ok(None)` when the stream carried no audio.
    pub async fn request_narration(
        &self,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<AudioClip>, GatewayError> {
        let request = SpeechRequest {
            model: self.settings.tts_model.clone(),
            text: text.to_string(),
            voice: self.settings.tts_voice.clone(),
        };

        let mut stream = cancellable(cancel, self.port.generate_speech_stream(request))
            .await?
            .map_err(|e| translate(e, narration_failed))?;

        let mut pcm = Vec::new();
        let mut fragments = 0usize;
        let mut mime_type: Option<String> = None;

        while let Some(item) = cancellable(cancel, stream.next()).await? {
            let fragment = item.map_err(|e| translate(e, narration_failed))?;
            if fragment.data_base64.is_empty() {
                continue;
            }

            let bytes = BASE64_STANDARD.decode(fragment.data_base64.trim()).map_err(|e| {
                tracing::error!("Undecodable audio fragment: {}", e);
                narration_failed()
            })?;
            pcm.extend_from_slice(&bytes);
            fragments += 1;

            if mime_type.is_none() {
                mime_type = fragment.mime_type;
            }
        }

        if fragments == 0 {
            tracing::warn!("Speech stream carried no audio");
            return Ok(None);
        }

        let encoding = mime_type
            .as_deref()
            .map(AudioEncoding::from_mime_type)
            .unwrap_or_default();
        tracing::debug!(
            fragments,
            bytes = pcm.len(),
            bits = encoding.bits_per_sample,
            rate = encoding.sample_rate,
            "Narration assembled"
        );

        Ok(Some(AudioClip::from_pcm(&pcm, encoding)))
    }
}

/// Run `future` unless `cancel` fires first
async fn cancellable<F: Future>(
    cancel: &CancellationToken,
    future: F,
) -> Result<F::Output, GatewayError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(GatewayError::Cancelled),
        output = future => Ok(output),
    }
}

fn narration_failed() -> GatewayError {
    GatewayError::NarrationFailed(NARRATION_FAILED.to_string())
}

/// Credential problems are reported uniformly; everything else becomes the
/// operation's own failure
fn translate(error: GenerativeError, failure: impl FnOnce() -> GatewayError) -> GatewayError {
    if error.is_credential_failure() {
        tracing::error!("Generative service rejected the credential: {}", error);
        GatewayError::Credential(CREDENTIAL_ERROR_MESSAGE.to_string())
    } else {
        tracing::error!("Generative service call failed: {}", error);
        failure()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::outbound::{AudioFragment, GeneratedImage, MockGenerative};

    const CRYPT_REPLY: &str = r#"{"narrative":"Cold air rises from the stairs.","imagePrompt":"torch-lit crypt","choices":["Go left","Go right","Listen"],"isGameOver":false}"#;

    fn gateway(mock: &MockGenerative) -> StoryGateway<MockGenerative> {
        StoryGateway::new(mock.clone(), StorySettings::default())
    }

    #[tokio::test]
    async fn test_initial_scene_parses_reply() {
        let mock = MockGenerative::new().with_text(format!("```json\n{}\n```", CRYPT_REPLY));
        let reply = gateway(&mock)
            .request_initial_scene("Aria", "haunted crypt", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(reply.choices.len(), 3);
        assert_eq!(reply.image_prompt, "torch-lit crypt");

        let request = mock.last_text_request().unwrap();
        assert!(request.prompt.contains("Aria"));
        assert_eq!(request.temperature, Some(0.7));
    }

    #[tokio::test]
    async fn test_next_scene_uses_continuation_prompt() {
        let mock = MockGenerative::new().with_text(CRYPT_REPLY);
        gateway(&mock)
            .request_next_scene(
                "Two tunnels split ahead.",
                "Go left",
                "Aria",
                "haunted crypt",
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        let request = mock.last_text_request().unwrap();
        assert!(request.prompt.contains("Two tunnels split ahead."));
        assert!(request.prompt.contains("Go left"));
        assert_eq!(request.temperature, Some(0.75));
    }

    #[tokio::test]
    async fn test_malformed_reply_becomes_generation_failure() {
        let mock = MockGenerative::new().with_text("I cannot comply.");
        let err = gateway(&mock)
            .request_initial_scene("Aria", "haunted crypt", &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(err, GatewayError::GenerationFailed(OPENING_FAILED.to_string()));
    }

    #[tokio::test]
    async fn test_credential_failure_is_translated() {
        let mock = MockGenerative::new()
            .with_text_error(GenerativeError::RequestFailed("API key not valid".into()));
        let err = gateway(&mock)
            .request_initial_scene("Aria", "haunted crypt", &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(err, GatewayError::Credential(CREDENTIAL_ERROR_MESSAGE.to_string()));
    }

    #[tokio::test]
    async fn test_cancelled_scene_request() {
        let mock = MockGenerative::new().with_text(CRYPT_REPLY);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = gateway(&mock)
            .request_initial_scene("Aria", "haunted crypt", &cancel)
            .await
            .unwrap_err();
        assert_eq!(err, GatewayError::Cancelled);
    }

    #[tokio::test]
    async fn test_image_becomes_data_uri() {
        let mock = MockGenerative::new().with_images(vec![GeneratedImage {
            data_base64: Some("AAAA".into()),
            mime_type: None,
        }]);
        let location = gateway(&mock)
            .request_image("torch-lit crypt", &CancellationToken::new())
            .await;

        assert_eq!(location, "data:image/jpeg;base64,AAAA");
    }

    #[tokio::test]
    async fn test_image_failures_use_placeholder() {
        let placeholder = StorySettings::default().placeholder_image_url;

        let failing = MockGenerative::new()
            .with_image_error(GenerativeError::RequestFailed("quota exceeded".into()));
        let location = gateway(&failing)
            .request_image("torch-lit crypt", &CancellationToken::new())
            .await;
        assert_eq!(location, placeholder);

        let empty = MockGenerative::new().with_images(vec![]);
        let location = gateway(&empty)
            .request_image("torch-lit crypt", &CancellationToken::new())
            .await;
        assert_eq!(location, placeholder);

        let no_bytes = MockGenerative::new().with_images(vec![GeneratedImage::default()]);
        let location = gateway(&no_bytes)
            .request_image("torch-lit crypt", &CancellationToken::new())
            .await;
        assert_eq!(location, placeholder);
    }

    #[tokio::test]
    async fn test_narration_concatenates_fragments() {
        let mock = MockGenerative::new().with_speech(vec![
            Ok(AudioFragment {
                data_base64: BASE64_STANDARD.encode([1u8, 2, 3, 4]),
                mime_type: Some("audio/L16;rate=24000".into()),
            }),
            Ok(AudioFragment {
                data_base64: BASE64_STANDARD.encode([5u8, 6]),
                mime_type: None,
            }),
        ]);

        let clip = gateway(&mock)
            .request_narration("Cold air rises.", &CancellationToken::new())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(clip.pcm_len(), 6);
        assert_eq!(&clip.wav[clip.wav.len() - 6..], &[1, 2, 3, 4, 5, 6]);
        assert_eq!(clip.encoding, AudioEncoding::new(16, 24_000));
    }

    #[tokio::test]
    async fn test_narration_without_mime_type_uses_defaults() {
        let mock = MockGenerative::new().with_speech(vec![Ok(AudioFragment {
            data_base64: BASE64_STANDARD.encode([0u8; 8]),
            mime_type: None,
        })]);

        let clip = gateway(&mock)
            .request_narration("Cold air rises.", &CancellationToken::new())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(clip.encoding, AudioEncoding::default());
    }

    #[tokio::test]
    async fn test_narration_with_oversized_rate_uses_default_rate() {
        let mock = MockGenerative::new().with_speech(vec![Ok(AudioFragment {
            data_base64: BASE64_STANDARD.encode([0u8; 8]),
            mime_type: Some("audio/L16;rate=3000000000".into()),
        })]);

        let clip = gateway(&mock)
            .request_narration("Cold air rises.", &CancellationToken::new())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(clip.encoding, AudioEncoding::new(16, 24_000));
        assert_eq!(clip.encoding.byte_rate(), 48_000);
    }

    #[tokio::test]
    async fn test_narration_without_audio_is_absent() {
        let mock = MockGenerative::new().with_speech(vec![]);
        let clip = gateway(&mock)
            .request_narration("Cold air rises.", &CancellationToken::new())
            .await
            .unwrap();
        assert!(clip.is_none());
    }

    #[tokio::test]
    async fn test_narration_stream_error() {
        let mock = MockGenerative::new().with_speech(vec![Err(GenerativeError::RequestFailed(
            "connection reset".into(),
        ))]);
        let err = gateway(&mock)
            .request_narration("Cold air rises.", &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err, GatewayError::NarrationFailed(NARRATION_FAILED.to_string()));
    }
}
