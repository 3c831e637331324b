//! Data Transfer Objects - For API boundaries
//!
//! DTOs live in the application layer so the HTTP shell can serialize
//! without pulling serde into the session and scene entities.

pub mod game;

pub use game::*;
