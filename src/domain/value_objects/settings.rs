//! Story settings value object
//!
//! Models, voice, play language and the display strings the engine falls
//! back on. Everything has a default; each field can be overridden from the
//! environment.

/// Title shown by the game shell
pub const GAME_TITLE: &str = "Gemini Chronicles";

/// Theme preselected on the welcome screen
pub const DEFAULT_THEME: &str = "Cursed crypt infested with demons";

/// Themes offered on the welcome screen
pub const SUGGESTED_THEMES: &[&str] = &[
    "Cursed crypt infested with demons",
    "Ruins of an ancient castle guarded by a dragon",
    "Dark forest full of cultists and unholy artifacts",
    "Underground dwarven city threatened by monsters from the deep",
    "Celestial sanctuary besieged by infernal hordes",
    "Desolate swamp hiding the ruins of a lost civilization",
    "Frozen mountain where an ancient evil awakens",
];

/// Shown when the credential is missing or rejected
pub const CREDENTIAL_ERROR_MESSAGE: &str = "API key is not configured or is invalid. \
     Make sure the GEMINI_API_KEY environment variable is set correctly.";

#[derive(Debug, Clone, PartialEq)]
pub struct StorySettings {
    // Models
    pub text_model: String,
    pub image_model: String,
    pub tts_model: String,
    pub tts_voice: String,

    // Sampling
    pub opening_temperature: f32,
    pub continuation_temperature: f32,

    // Narrative
    pub language: String,
    /// Phrase a game-over choice is expected to contain
    pub play_again_phrase: String,
    /// Label used when the game-over choice does not look like "play again"
    pub play_again_label: String,

    // Images
    pub placeholder_image_url: String,
}

impl Default for StorySettings {
    fn default() -> Self {
        Self {
            text_model: "gemini-2.5-flash".to_string(),
            image_model: "imagen-3.0-generate-002".to_string(),
            tts_model: "gemini-2.5-flash-preview-tts".to_string(),
            tts_voice: "Zephyr".to_string(),
            opening_temperature: 0.7,
            continuation_temperature: 0.75,
            language: "English".to_string(),
            play_again_phrase: "play again".to_string(),
            play_again_label: "Play again?".to_string(),
            placeholder_image_url: "https://picsum.photos/512/512?blur=2&grayscale".to_string(),
        }
    }
}

impl StorySettings {
    /// Load from environment variables, using defaults for missing values
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            text_model: env_or("GEMINI_TEXT_MODEL", defaults.text_model),
            image_model: env_or("GEMINI_IMAGE_MODEL", defaults.image_model),
            tts_model: env_or("GEMINI_TTS_MODEL", defaults.tts_model),
            tts_voice: env_or("GEMINI_TTS_VOICE", defaults.tts_voice),
            opening_temperature: env_or("STORY_OPENING_TEMPERATURE", defaults.opening_temperature),
            continuation_temperature: env_or(
                "STORY_CONTINUATION_TEMPERATURE",
                defaults.continuation_temperature,
            ),
            language: env_or("STORY_LANGUAGE", defaults.language),
            play_again_phrase: env_or("PLAY_AGAIN_PHRASE", defaults.play_again_phrase),
            play_again_label: env_or("PLAY_AGAIN_LABEL", defaults.play_again_label),
            placeholder_image_url: env_or("PLACEHOLDER_IMAGE_URL", defaults.placeholder_image_url),
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}
