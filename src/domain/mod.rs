//! Domain layer - Core game state with no I/O
//!
//! This layer contains:
//! - Entities: Session, Scene
//! - Value Objects: AI replies, audio encoding and WAV containers, settings, ids

pub mod entities;
pub mod value_objects;
