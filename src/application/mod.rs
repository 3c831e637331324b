//! Application layer - Use cases and the ports they depend on
//!
//! - Ports: the generative service boundary
//! - Services: prompt building, response parsing, the story gateway and the
//!   turn state machine
//! - DTOs: read-only projections handed to the game shell

pub mod dto;
pub mod ports;
pub mod services;
