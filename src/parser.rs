//! Recovery of a structured [`AiResponse`] from free-form model output.

use serde_json::Value;

use crate::error::{AdvisorError, Result};
use crate::models::{AiResponse, Confidence};

/// Source attributed to answers whose reply named none
pub const PROVIDER_SOURCE: &str = "Gemini AI";
/// Confidence used when the reply's label is absent or unrecognised
pub const DEFAULT_CONFIDENCE: Confidence = Confidence::Medium;

pub fn default_sources() -> Vec<String> {
    vec![PROVIDER_SOURCE.to_string()]
}

/// Slice from the first `{` to the last `}`.
///
/// A stray brace in prose before the real object breaks this; swap this
/// function out if the reply format ever gets a delimiter.
pub fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}

/// Reply that carried no parseable JSON; the whole text becomes the answer.
pub fn degraded_response(raw: &str) -> AiResponse {
    AiResponse {
        answer: raw.to_string(),
        confidence: DEFAULT_CONFIDENCE,
        sources: default_sources(),
        suggestions: Vec::new(),
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Number(n) => n.as_f64() == Some(0.0),
        _ => false,
    }
}

fn string_list(value: Option<&Value>) -> Option<Vec<String>> {
    match value {
        Some(Value::Array(items)) => Some(
            items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect(),
        ),
        _ => None,
    }
}

/// Apply the fallback defaults to a parsed reply object.
pub fn normalize_response(parsed: &Value) -> Result<AiResponse> {
    let answer = match parsed.get("answer") {
        Some(v) if !is_falsy(v) => match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        },
        _ => {
            return Err(AdvisorError::InvalidAiResponse(
                "response is missing an answer".to_string(),
            ));
        }
    };

    let confidence = parsed
        .get("confidence")
        .and_then(Value::as_str)
        .and_then(Confidence::from_label)
        .unwrap_or(DEFAULT_CONFIDENCE);

    let sources = string_list(parsed.get("sources")).unwrap_or_else(default_sources);
    let suggestions = string_list(parsed.get("suggestions")).unwrap_or_default();

    Ok(AiResponse {
        answer,
        confidence,
        sources,
        suggestions,
    })
}

/// Parse raw model text into a normalized response.
///
/// Only a parsed object without a usable answer is an error; anything that
/// fails to parse degrades to [`degraded_response`].
pub fn parse_ai_response(raw: &str) -> Result<AiResponse> {
    let parsed = match extract_json_object(raw).map(serde_json::from_str::<Value>) {
        Some(Ok(value)) => value,
        Some(Err(e)) => {
            tracing::warn!("Model reply contained malformed JSON ({}), degrading", e);
            return Ok(degraded_response(raw));
        }
        None => {
            tracing::warn!("Model reply contained no JSON object, degrading");
            return Ok(degraded_response(raw));
        }
    };

    normalize_response(&parsed)
}
