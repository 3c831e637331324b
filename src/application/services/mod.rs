//! Application services - Use case implementations
//!
//! The turn service is the only entry point used by the HTTP shell. It talks
//! to the generative service exclusively through the story gateway, which in
//! turn only sees the `GenerativePort` trait.

pub mod llm;
pub mod narration;
pub mod story_gateway;
pub mod turn_service;

pub use narration::NarrationStatus;
pub use story_gateway::StoryGateway;
pub use turn_service::{TurnError, TurnService};
