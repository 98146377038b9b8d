use serde_json::Value;

use crate::error::{AdvisorError, Result};
use crate::models::{AskResponse, CallContext, ChatRecord, FarmProfile};
use crate::parser::parse_ai_response;
use crate::prompt::build_agricultural_prompt;
use crate::validation::{
    MAX_QUESTION_LENGTH, validate_language, validate_required_fields, validate_text_length,
};

/// Trait for the question-answering operation
pub trait AskHandler {
    /// Handle askGemini
    async fn ask_gemini(&self, ctx: &CallContext, data: &Value) -> Result<AskResponse>;
}

impl AskHandler for super::Handlers {
    async fn ask_gemini(&self, ctx: &CallContext, data: &Value) -> Result<AskResponse> {
        // Identity first: nothing else runs for anonymous callers
        let identity = self.identity.resolve(ctx).await?;

        validate_required_fields(data, &["question", "farmProfile", "language"])?;
        let question = validate_text_length(&data["question"], MAX_QUESTION_LENGTH)?;
        if question.is_empty() {
            return Err(AdvisorError::InvalidInput(
                "Question cannot be blank".to_string(),
            ));
        }
        let language = validate_language(&data["language"])?;
        let profile: FarmProfile = serde_json::from_value(data["farmProfile"].clone())
            .map_err(|e| AdvisorError::InvalidInput(format!("Invalid farmProfile: {e}")))?;

        if !self.generator.is_configured() {
            tracing::error!("askGemini called without a Gemini API key configured");
            return Err(AdvisorError::Configuration(
                "Gemini API key is not configured".to_string(),
            ));
        }

        tracing::info!(
            uid = %identity.uid,
            language = %language,
            question_chars = question.chars().count(),
            "Processing askGemini request"
        );

        let prompt = build_agricultural_prompt(&profile, language.code(), &question);
        let raw = self.generator.generate(&prompt).await?;
        let response = parse_ai_response(&raw)?;

        let record = ChatRecord::new(question, &response, language, &profile);
        let chat_id = self.chats.create_chat(&identity.uid, &record).await?;

        tracing::info!(
            uid = %identity.uid,
            chat_id = %chat_id,
            confidence = response.confidence.as_str(),
            "askGemini answer stored"
        );

        Ok(AskResponse { response, chat_id })
    }
}
