use async_trait::async_trait;
use reqwest::Client;
use std::time::Instant;

use crate::config::{GeminiConfig, is_configured_key};
use crate::error::{AdvisorError, Result};
use crate::models::{GeminiContent, GeminiPart, GeminiRequest, GeminiResponse, GenerationConfig};

/// Text generation boundary used by the askGemini handler
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Generator: Send + Sync {
    /// False when the credential is missing or still a placeholder
    fn is_configured(&self) -> bool;

    async fn generate(&self, prompt: &str) -> Result<String>;
}

pub struct GeminiTransport {
    client: Client,
    api_key: String,
    api_base: String,
    model: String,
    temperature: f32,
    max_output_tokens: u32,
}

impl GeminiTransport {
    pub fn new(cfg: &GeminiConfig) -> Result<Self> {
        Ok(Self {
            client: Client::new(),
            api_key: cfg.api_key.clone(),
            api_base: cfg.api_base.trim_end_matches('/').to_string(),
            model: cfg.model.clone(),
            temperature: cfg.temperature,
            max_output_tokens: cfg.max_output_tokens,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_base, self.model)
    }
}

/// Concatenated text parts of the first candidate
pub fn reply_text(response: GeminiResponse) -> Result<String> {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if text.is_empty() {
        return Err(AdvisorError::Internal(
            "Gemini API returned no candidates".to_string(),
        ));
    }
    Ok(text)
}

#[async_trait]
impl Generator for GeminiTransport {
    fn is_configured(&self) -> bool {
        is_configured_key(&self.api_key)
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let start_time = Instant::now();
        let req = GeminiRequest {
            contents: vec![GeminiContent {
                role: "user".to_string(),
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
                max_output_tokens: self.max_output_tokens,
            },
        };

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", &self.api_key)])
            .header("Content-Type", "application/json")
            .json(&req)
            .send()
            .await
            .map_err(|e| {
                AdvisorError::Internal(format!("Failed to send request to Gemini API: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AdvisorError::Internal(format!(
                "Gemini API error ({}): {}",
                status,
                response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string())
            )));
        }

        let body: GeminiResponse = response.json().await.map_err(|e| {
            AdvisorError::Internal(format!("Failed to parse Gemini API response: {e}"))
        })?;

        tracing::debug!(
            model = %self.model,
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "Gemini generation finished"
        );
        reply_text(body)
    }
}
