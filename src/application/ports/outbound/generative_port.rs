//! Generative port - Interface to the text/image/speech generation service

use async_trait::async_trait;
use futures_util::stream::BoxStream;

/// Output format requested from the text model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    Text,
    Json,
}

impl ResponseFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Text => "text/plain",
            Self::Json => "application/json",
        }
    }
}

/// Request for a single text completion
#[derive(Debug, Clone)]
pub struct TextRequest {
    pub model: String,
    pub prompt: String,
    pub response_format: ResponseFormat,
    pub temperature: Option<f32>,
}

impl TextRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            response_format: ResponseFormat::Text,
            temperature: None,
        }
    }

    pub fn json(mut self) -> Self {
        self.response_format = ResponseFormat::Json;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Request for image generation
#[derive(Debug, Clone)]
pub struct ImageRequest {
    pub model: String,
    pub prompt: String,
    pub count: u32,
    pub output_mime_type: String,
}

impl ImageRequest {
    /// A single JPEG image, which is all the game ever asks for
    pub fn single_jpeg(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            count: 1,
            output_mime_type: "image/jpeg".to_string(),
        }
    }
}

/// One generated image as returned by the service
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratedImage {
    /// Base64-encoded image bytes; the service may omit them
    pub data_base64: Option<String>,
    pub mime_type: Option<String>,
}

/// Request for streamed speech synthesis
#[derive(Debug, Clone)]
pub struct SpeechRequest {
    pub model: String,
    pub text: String,
    pub voice: String,
}

/// One chunk of a speech stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFragment {
    /// Base64-encoded raw PCM
    pub data_base64: String,
    /// Declared encoding, e.g. `audio/L16;rate=24000`
    pub mime_type: Option<String>,
}

/// Finite, non-restartable stream of speech fragments
pub type SpeechStream = BoxStream<'static, Result<AudioFragment, GenerativeError>>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerativeError {
    /// Credential missing or rejected by the service
    #[error("Credential error: {0}")]
    Credential(String),
    #[error("Request failed: {0}")]
    RequestFailed(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl GenerativeError {
    /// Whether this failure means the credential is missing or invalid.
    ///
    /// Some services report a bad key inside an ordinary error body, so the
    /// message is checked as well as the variant.
    pub fn is_credential_failure(&self) -> bool {
        match self {
            Self::Credential(_) => true,
            Self::RequestFailed(message) | Self::InvalidResponse(message) => {
                let message = message.to_ascii_lowercase();
                message.contains("api key") || message.contains("api_key_invalid")
            }
        }
    }
}

/// Port for the external generative service
#[async_trait]
pub trait GenerativePort: Send + Sync {
    /// Whether a credential is available at all
    fn is_configured(&self) -> bool;

    /// Generate text, returning the raw model output
    async fn generate_text(&self, request: TextRequest) -> Result<String, GenerativeError>;

    /// Generate images for a prompt
    async fn generate_images(
        &self,
        request: ImageRequest,
    ) -> Result<Vec<GeneratedImage>, GenerativeError>;

    /// Start streamed speech synthesis
    async fn generate_speech_stream(
        &self,
        request: SpeechRequest,
    ) -> Result<SpeechStream, GenerativeError>;
}
