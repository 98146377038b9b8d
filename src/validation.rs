//! Request validation for the callable operations.
//!
//! Every check here is side-effect free and runs before any provider or
//! storage call is attempted.

use serde_json::Value;

use crate::error::{AdvisorError, Result};
use crate::models::Language;

/// Maximum question length for askGemini
pub const MAX_QUESTION_LENGTH: usize = 1000;
/// Maximum text length for synthesizeSpeech
pub const MAX_SPEECH_TEXT_LENGTH: usize = 5000;
/// Prefix every audio blob path must carry
pub const AUDIO_PATH_PREFIX: &str = "audio/";

/// Fail with every required field that is absent, null or an empty string.
pub fn validate_required_fields(data: &Value, fields: &[&str]) -> Result<()> {
    let missing: Vec<String> = fields
        .iter()
        .filter(|field| match data.get(**field) {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => s.is_empty(),
            Some(_) => false,
        })
        .map(|field| field.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(AdvisorError::MissingFields(missing))
    }
}

pub fn validate_language(code: &Value) -> Result<Language> {
    let raw = code
        .as_str()
        .ok_or_else(|| AdvisorError::UnsupportedLanguage(code.to_string()))?;
    Language::from_code(raw).ok_or_else(|| AdvisorError::UnsupportedLanguage(raw.to_string()))
}

/// Length is measured on the untrimmed text; the trimmed text is returned.
pub fn validate_text_length(text: &Value, max_length: usize) -> Result<String> {
    let text = text
        .as_str()
        .ok_or_else(|| AdvisorError::InvalidInput("Text must be a string".to_string()))?;

    let length = text.chars().count();
    if length > max_length {
        return Err(AdvisorError::TextTooLong {
            length,
            max: max_length,
        });
    }

    Ok(text.trim().to_string())
}

pub fn validate_audio_path(path: &Value) -> Result<String> {
    match path.as_str() {
        Some(p) if !p.is_empty() && p.starts_with(AUDIO_PATH_PREFIX) => Ok(p.to_string()),
        _ => Err(AdvisorError::InvalidInput(format!(
            "Audio path must be a non-empty string starting with '{AUDIO_PATH_PREFIX}'"
        ))),
    }
}
