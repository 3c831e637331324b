//! Application configuration

use std::env;

use anyhow::{Context, Result};

use crate::domain::value_objects::StorySettings;
use crate::infrastructure::gemini::DEFAULT_GEMINI_BASE_URL;

/// Application configuration loaded from environment
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Gemini API key; the server still starts without one
    pub api_key: Option<String>,
    /// Gemini REST base URL
    pub gemini_base_url: String,
    /// Per-request timeout for generative calls
    pub timeout_secs: u64,

    /// HTTP server port
    pub server_port: u16,

    pub story: StorySettings,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            api_key: env::var("GEMINI_API_KEY")
                .or_else(|_| env::var("API_KEY"))
                .ok()
                .map(|key| key.trim().to_string())
                .filter(|key| !key.is_empty()),
            gemini_base_url: env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_GEMINI_BASE_URL.to_string()),
            timeout_secs: env::var("GEMINI_TIMEOUT_SECS")
                .unwrap_or_else(|_| "120".to_string())
                .parse()
                .context("GEMINI_TIMEOUT_SECS must be a whole number of seconds")?,

            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .context("SERVER_PORT must be a valid port number")?,

            story: StorySettings::from_env(),
        })
    }
}
