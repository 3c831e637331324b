//! Scene entity - One displayed narrative unit plus its illustration

use chrono::{DateTime, Utc};

use crate::domain::value_objects::SceneId;

/// A scene is replaced wholesale on every turn, never edited in place
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub id: SceneId,
    pub narrative: String,
    /// English visual description; only used to request the image
    pub image_prompt: String,
    /// URL or `data:` URI once the image is resolved
    pub image_location: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Scene {
    pub fn new(narrative: impl Into<String>, image_prompt: impl Into<String>) -> Self {
        Self {
            id: SceneId::new(),
            narrative: narrative.into(),
            image_prompt: image_prompt.into(),
            image_location: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_image(mut self, location: Option<String>) -> Self {
        self.image_location = location;
        self
    }
}
