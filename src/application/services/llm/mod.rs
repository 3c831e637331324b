//! Story model helpers: prompt text in, structured replies out

pub mod prompt_builder;
pub mod response_parser;

pub use prompt_builder::{build_continuation_prompt, build_opening_prompt};
pub use response_parser::parse_reply;
