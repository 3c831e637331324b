//! Response parsing for story generation output
//!
//! Models sometimes wrap JSON in a markdown fence even when told not to, so
//! the fence is stripped before decoding. Only the shape is checked; tone,
//! length and language are left to the prompt.

use serde_json::Value;

use crate::domain::value_objects::AiReply;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResponseParseError {
    /// The text is not a single JSON object
    #[error("Malformed response: {0}")]
    Malformed(String),
    /// A required field is missing, empty or of the wrong type
    #[error("Incomplete response: {0}")]
    Incomplete(String),
}

/// Parse raw model output into an `AiReply`
pub fn parse_reply(raw: &str) -> Result<AiReply, ResponseParseError> {
    let json = strip_code_fence(raw);

    let value: Value = serde_json::from_str(json)
        .map_err(|e| ResponseParseError::Malformed(format!("invalid JSON: {}", e)))?;
    if !value.is_object() {
        return Err(ResponseParseError::Malformed(
            "expected a JSON object".to_string(),
        ));
    }

    let reply: AiReply = serde_json::from_value(value)
        .map_err(|e| ResponseParseError::Incomplete(e.to_string()))?;

    require_text(&reply.narrative, "narrative")?;
    require_text(&reply.image_prompt, "imagePrompt")?;
    if reply.choices.is_empty() {
        return Err(ResponseParseError::Incomplete("choices is empty".to_string()));
    }

    Ok(reply)
}

/// Remove an optional surrounding ``` fence, optionally tagged `json`
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();

    let Some(inner) = trimmed
        .strip_prefix("```")
        .and_then(|rest| rest.strip_suffix("```"))
    else {
        return trimmed;
    };

    inner.strip_prefix("json").unwrap_or(inner).trim()
}

fn require_text(text: &str, field: &str) -> Result<(), ResponseParseError> {
    if text.trim().is_empty() {
        return Err(ResponseParseError::Incomplete(format!("{} is empty", field)));
    }
    Ok(())
}
