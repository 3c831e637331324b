//! Shared application state

use tokio_util::sync::CancellationToken;

use crate::application::services::{StoryGateway, TurnService};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::gemini::GeminiProvider;

/// Shared application state
pub struct AppState {
    pub turns: TurnService<GeminiProvider>,
}

impl AppState {
    /// Wire the Gemini provider into the turn service; `shutdown` cancels
    /// every in-flight generative call
    pub fn new(config: &AppConfig, shutdown: CancellationToken) -> Self {
        let provider = GeminiProvider::from_config(config);
        let gateway = StoryGateway::new(provider, config.story.clone());
        let turns = TurnService::new(gateway).with_shutdown(shutdown);

        Self { turns }
    }
}
