//! Scripted `GenerativePort` used by service tests

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures_util::StreamExt;

use super::{
    AudioFragment, GeneratedImage, GenerativeError, GenerativePort, ImageRequest, SpeechRequest,
    SpeechStream, TextRequest,
};

/// Cloning shares the script and the call counters
#[derive(Clone)]
pub struct MockGenerative {
    inner: Arc<Inner>,
}

struct Inner {
    configured: AtomicBool,
    text_replies: Mutex<VecDeque<Result<String, GenerativeError>>>,
    images: Mutex<Result<Vec<GeneratedImage>, GenerativeError>>,
    speech: Mutex<Result<Vec<Result<AudioFragment, GenerativeError>>, GenerativeError>>,
    text_prompts: Mutex<Vec<TextRequest>>,
    text_calls: AtomicUsize,
    image_calls: AtomicUsize,
    speech_calls: AtomicUsize,
}

impl MockGenerative {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                configured: AtomicBool::new(true),
                text_replies: Mutex::new(VecDeque::new()),
                images: Mutex::new(Ok(vec![GeneratedImage {
                    data_base64: Some("aW1hZ2U=".to_string()),
                    mime_type: Some("image/jpeg".to_string()),
                }])),
                speech: Mutex::new(Ok(Vec::new())),
                text_prompts: Mutex::new(Vec::new()),
                text_calls: AtomicUsize::new(0),
                image_calls: AtomicUsize::new(0),
                speech_calls: AtomicUsize::new(0),
            }),
        }
    }

    pub fn unconfigured(self) -> Self {
        self.set_configured(false);
        self
    }

    /// Affects every clone, including one already handed to a service
    pub fn set_configured(&self, configured: bool) {
        self.inner.configured.store(configured, Ordering::SeqCst);
    }

    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.inner.text_replies.lock().unwrap().push_back(Ok(text.into()));
        self
    }

    pub fn with_text_error(self, error: GenerativeError) -> Self {
        self.inner.text_replies.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn with_images(self, images: Vec<GeneratedImage>) -> Self {
        *self.inner.images.lock().unwrap() = Ok(images);
        self
    }

    pub fn with_image_error(self, error: GenerativeError) -> Self {
        *self.inner.images.lock().unwrap() = Err(error);
        self
    }

    pub fn with_speech(self, fragments: Vec<Result<AudioFragment, GenerativeError>>) -> Self {
        *self.inner.speech.lock().unwrap() = Ok(fragments);
        self
    }

    pub fn with_speech_error(self, error: GenerativeError) -> Self {
        *self.inner.speech.lock().unwrap() = Err(error);
        self
    }

    pub fn text_calls(&self) -> usize {
        self.inner.text_calls.load(Ordering::SeqCst)
    }

    pub fn image_calls(&self) -> usize {
        self.inner.image_calls.load(Ordering::SeqCst)
    }

    pub fn speech_calls(&self) -> usize {
        self.inner.speech_calls.load(Ordering::SeqCst)
    }

    pub fn last_text_request(&self) -> Option<TextRequest> {
        self.inner.text_prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl GenerativePort for MockGenerative {
    fn is_configured(&self) -> bool {
        self.inner.configured.load(Ordering::SeqCst)
    }

    async fn generate_text(&self, request: TextRequest) -> Result<String, GenerativeError> {
        self.inner.text_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.text_prompts.lock().unwrap().push(request);
        self.inner
            .text_replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GenerativeError::RequestFailed("no scripted reply".into())))
    }

    async fn generate_images(
        &self,
        _request: ImageRequest,
    ) -> Result<Vec<GeneratedImage>, GenerativeError> {
        self.inner.image_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.images.lock().unwrap().clone()
    }

    async fn generate_speech_stream(
        &self,
        _request: SpeechRequest,
    ) -> Result<SpeechStream, GenerativeError> {
        self.inner.speech_calls.fetch_add(1, Ordering::SeqCst);
        let fragments = self.inner.speech.lock().unwrap().clone()?;
        Ok(futures_util::stream::iter(fragments).boxed())
    }
}
