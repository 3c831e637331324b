//! Value objects - Immutable objects defined by their attributes

mod ai_reply;
mod audio;
mod ids;
mod settings;

pub use ai_reply::AiReply;
pub use audio::{AudioClip, AudioEncoding};
pub use ids::*;
pub use settings::{
    StorySettings, CREDENTIAL_ERROR_MESSAGE, DEFAULT_THEME, GAME_TITLE, SUGGESTED_THEMES,
};
