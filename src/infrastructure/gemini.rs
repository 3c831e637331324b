//! Gemini REST client
//!
//! Implements [`GenerativePort`] against the Generative Language API:
//! `:generateContent` for scenes, `:predict` (Imagen) for illustrations and
//! `:streamGenerateContent?alt=sse` for narration.

use std::collections::VecDeque;
use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::{self, BoxStream};
use futures_util::StreamExt;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::application::ports::outbound::{
    AudioFragment, GeneratedImage, GenerativeError, GenerativePort, ImageRequest, SpeechRequest,
    SpeechStream, TextRequest,
};
use crate::infrastructure::config::AppConfig;

/// Default Gemini base URL.
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Thin HTTP client for one API key
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(base_url: &str, api_key: &str, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn model_url(&self, model: &str, method: &str) -> String {
        format!("{}/models/{}:{}", self.base_url, model, method)
    }

    async fn post<B: Serialize, R: DeserializeOwned>(
        &self,
        url: String,
        body: &B,
    ) -> Result<R, GenerativeError> {
        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| GenerativeError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Gemini error body".to_string());
            return Err(map_http_error(status, &body));
        }

        response
            .json()
            .await
            .map_err(|e| GenerativeError::InvalidResponse(e.to_string()))
    }

    pub async fn generate_content(
        &self,
        request: TextRequest,
    ) -> Result<String, GenerativeError> {
        let body = GenerateContentRequest {
            contents: vec![Content::user(request.prompt)],
            generation_config: GenerationConfig {
                response_mime_type: Some(request.response_format.mime_type().to_string()),
                temperature: request.temperature,
                ..Default::default()
            },
        };

        let response: GenerateContentResponse = self
            .post(self.model_url(&request.model, "generateContent"), &body)
            .await?;
        extract_text(response)
    }

    pub async fn predict_images(
        &self,
        request: ImageRequest,
    ) -> Result<Vec<GeneratedImage>, GenerativeError> {
        let body = PredictRequest {
            instances: vec![PredictInstance {
                prompt: request.prompt,
            }],
            parameters: PredictParameters {
                sample_count: request.count,
                output_options: OutputOptions {
                    mime_type: request.output_mime_type,
                },
            },
        };

        let response: PredictResponse = self
            .post(self.model_url(&request.model, "predict"), &body)
            .await?;

        Ok(response
            .predictions
            .unwrap_or_default()
            .into_iter()
            .map(|prediction| GeneratedImage {
                data_base64: prediction.bytes_base64_encoded,
                mime_type: prediction.mime_type,
            })
            .collect())
    }

    pub async fn stream_speech(&self, request: SpeechRequest) -> Result<SpeechStream, GenerativeError> {
        let body = GenerateContentRequest {
            contents: vec![Content::user(request.text)],
            generation_config: GenerationConfig {
                response_modalities: Some(vec!["AUDIO".to_string()]),
                speech_config: Some(SpeechConfig {
                    voice_config: VoiceConfig {
                        prebuilt_voice_config: PrebuiltVoiceConfig {
                            voice_name: request.voice,
                        },
                    },
                }),
                ..Default::default()
            },
        };

        let url = format!(
            "{}?alt=sse",
            self.model_url(&request.model, "streamGenerateContent")
        );
        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerativeError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Gemini error body".to_string());
            return Err(map_http_error(status, &body));
        }

        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()))
            .boxed();
        Ok(speech_fragments(body))
    }
}

/// Lazily builds the client on first use so a missing key only fails calls
pub struct GeminiProvider {
    api_key: Option<String>,
    base_url: String,
    timeout_secs: u64,
    client: OnceLock<GeminiClient>,
}

impl GeminiProvider {
    pub fn new(api_key: Option<String>, base_url: &str, timeout_secs: u64) -> Self {
        Self {
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            base_url: base_url.to_string(),
            timeout_secs,
            client: OnceLock::new(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.api_key.clone(),
            &config.gemini_base_url,
            config.timeout_secs,
        )
    }

    fn client(&self) -> Result<&GeminiClient, GenerativeError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| GenerativeError::Credential("GEMINI_API_KEY is not set".into()))?;

        Ok(self.client.get_or_init(|| {
            tracing::debug!(base_url = %self.base_url, "Creating Gemini client");
            GeminiClient::new(&self.base_url, api_key, self.timeout_secs)
        }))
    }
}

#[async_trait]
impl GenerativePort for GeminiProvider {
    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn generate_text(&self, request: TextRequest) -> Result<String, GenerativeError> {
        self.client()?.generate_content(request).await
    }

    async fn generate_images(
        &self,
        request: ImageRequest,
    ) -> Result<Vec<GeneratedImage>, GenerativeError> {
        self.client()?.predict_images(request).await
    }

    async fn generate_speech_stream(
        &self,
        request: SpeechRequest,
    ) -> Result<SpeechStream, GenerativeError> {
        self.client()?.stream_speech(request).await
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<TextPart>,
}

impl Content {
    fn user(text: String) -> Self {
        Self {
            role: "user".to_string(),
            parts: vec![TextPart { text }],
        }
    }
}

#[derive(Serialize)]
struct TextPart {
    text: String,
}

#[derive(Serialize, Default)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_modalities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    speech_config: Option<SpeechConfig>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SpeechConfig {
    voice_config: VoiceConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceConfig {
    prebuilt_voice_config: PrebuiltVoiceConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PrebuiltVoiceConfig {
    voice_name: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
    error: Option<ErrorBody>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PartResponse {
    text: Option<String>,
    inline_data: Option<InlineData>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: Option<String>,
    data: Option<String>,
}

#[derive(Serialize)]
struct PredictRequest {
    instances: Vec<PredictInstance>,
    parameters: PredictParameters,
}

#[derive(Serialize)]
struct PredictInstance {
    prompt: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PredictParameters {
    sample_count: u32,
    output_options: OutputOptions,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OutputOptions {
    mime_type: String,
}

#[derive(Deserialize)]
struct PredictResponse {
    predictions: Option<Vec<Prediction>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    bytes_base64_encoded: Option<String>,
    mime_type: Option<String>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
    #[serde(default)]
    details: Vec<serde_json::Value>,
}

impl ErrorBody {
    fn describe(&self) -> String {
        let message = self.message.clone().unwrap_or_default();
        match self.status.as_deref() {
            Some(status) if !status.is_empty() => format!("{}: {}", status, message),
            _ => message,
        }
    }

    /// The API reports a bad key as 400 with reason `API_KEY_INVALID`
    fn is_invalid_key(&self) -> bool {
        self.details.iter().any(|detail| {
            detail.get("reason").and_then(|r| r.as_str()) == Some("API_KEY_INVALID")
        })
    }
}

fn map_http_error(status: StatusCode, body: &str) -> GenerativeError {
    let parsed = serde_json::from_str::<ErrorWrapper>(body).ok();
    let message = parsed
        .as_ref()
        .map(|wrapper| wrapper.error.describe())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| body.to_string());

    let invalid_key = parsed
        .as_ref()
        .is_some_and(|wrapper| wrapper.error.is_invalid_key());

    if invalid_key || matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
        GenerativeError::Credential(message)
    } else {
        GenerativeError::RequestFailed(format!("{} {}", status.as_u16(), message))
    }
}

fn extract_text(response: GenerateContentResponse) -> Result<String, GenerativeError> {
    if let Some(error) = response.error {
        return Err(GenerativeError::RequestFailed(error.describe()));
    }

    let text: String = response
        .candidates
        .and_then(|candidates| candidates.into_iter().next())
        .and_then(|candidate| candidate.content)
        .map(|content| content.parts.into_iter().filter_map(|part| part.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(GenerativeError::InvalidResponse(
            "Gemini API returned no text in the response candidates".into(),
        ));
    }
    Ok(text)
}

// ============================================================================
// Speech streaming
// ============================================================================

/// Audio parts carried by one SSE event
fn fragments_from_event(data: &str) -> Vec<Result<AudioFragment, GenerativeError>> {
    let response: GenerateContentResponse = match serde_json::from_str(data) {
        Ok(response) => response,
        Err(e) => return vec![Err(GenerativeError::InvalidResponse(e.to_string()))],
    };

    if let Some(error) = response.error {
        return vec![Err(GenerativeError::RequestFailed(error.describe()))];
    }

    response
        .candidates
        .unwrap_or_default()
        .into_iter()
        .filter_map(|candidate| candidate.content)
        .flat_map(|content| content.parts)
        .filter_map(|part| part.inline_data)
        .filter_map(|inline| {
            inline.data.map(|data| {
                Ok(AudioFragment {
                    data_base64: data,
                    mime_type: inline.mime_type,
                })
            })
        })
        .collect()
}

type ByteStream = BoxStream<'static, Result<Vec<u8>, reqwest::Error>>;

struct SpeechState {
    body: ByteStream,
    decoder: SseDecoder,
    ready: VecDeque<Result<AudioFragment, GenerativeError>>,
    finished: bool,
}

fn speech_fragments(body: ByteStream) -> SpeechStream {
    let state = SpeechState {
        body,
        decoder: SseDecoder::default(),
        ready: VecDeque::new(),
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.ready.pop_front() {
                return Some((item, state));
            }
            if state.finished {
                return None;
            }

            match state.body.next().await {
                Some(Ok(chunk)) => {
                    for event in state.decoder.push(&chunk) {
                        state.ready.extend(fragments_from_event(&event));
                    }
                }
                Some(Err(e)) => {
                    state.finished = true;
                    state
                        .ready
                        .push_back(Err(GenerativeError::RequestFailed(e.to_string())));
                }
                None => {
                    state.finished = true;
                    if let Some(event) = state.decoder.finish() {
                        state.ready.extend(fragments_from_event(&event));
                    }
                }
            }
        }
    })
    .boxed()
}

/// Incremental `text/event-stream` decoder yielding the `data` of each event
#[derive(Debug, Default)]
struct SseDecoder {
    buffer: Vec<u8>,
    data: Vec<String>,
}

impl SseDecoder {
    fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            if let Some(event) = self.line(line.trim_end_matches(['\n', '\r'])) {
                events.push(event);
            }
        }
        events
    }

    /// Flush whatever the stream ended on
    fn finish(&mut self) -> Option<String> {
        if !self.buffer.is_empty() {
            let rest = std::mem::take(&mut self.buffer);
            let rest = String::from_utf8_lossy(&rest).into_owned();
            if let Some(event) = self.line(rest.trim_end_matches('\r')) {
                return Some(event);
            }
        }
        self.dispatch()
    }

    fn line(&mut self, line: &str) -> Option<String> {
        if line.is_empty() {
            return self.dispatch();
        }
        if let Some(value) = line.strip_prefix("data:") {
            self.data
                .push(value.strip_prefix(' ').unwrap_or(value).to_string());
        }
        None
    }

    fn dispatch(&mut self) -> Option<String> {
        if self.data.is_empty() {
            return None;
        }
        let event = self.data.join("\n");
        self.data.clear();
        Some(event)
    }
}
