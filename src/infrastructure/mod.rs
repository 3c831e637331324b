//! Infrastructure layer - External adapters and implementations
//!
//! This layer contains:
//! - Gemini: REST adapter for text, image and speech generation
//! - HTTP: REST API routes for the game shell
//! - Config: Application configuration
//! - State: Shared application state

pub mod config;
pub mod gemini;
pub mod http;
pub mod state;
