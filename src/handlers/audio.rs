use serde_json::Value;

use crate::error::{AdvisorError, Result};
use crate::models::{
    CallContext, RecognitionSegment, StoredBlob, SynthesisResult, TranscriptionResult,
    UploadResult,
};
use crate::speech::{speech_locale, voice_for};
use crate::validation::{
    AUDIO_PATH_PREFIX, MAX_SPEECH_TEXT_LENGTH, validate_audio_path, validate_language,
    validate_required_fields, validate_text_length,
};

/// Trait for speech and audio storage operations
pub trait AudioHandler {
    /// Handle transcribeAudio
    async fn transcribe_audio(&self, ctx: &CallContext, data: &Value)
    -> Result<TranscriptionResult>;

    /// Handle synthesizeSpeech
    async fn synthesize_speech(&self, ctx: &CallContext, data: &Value) -> Result<SynthesisResult>;

    /// Store a recording under the caller's audio namespace
    async fn upload_audio(
        &self,
        ctx: &CallContext,
        file_name: &str,
        content_type: Option<&str>,
        bytes: &[u8],
    ) -> Result<UploadResult>;

    /// Redeem a signed URL token
    async fn open_signed_blob(&self, token: &str) -> Result<StoredBlob>;
}

fn user_audio_prefix(uid: &str) -> String {
    format!("{AUDIO_PATH_PREFIX}{uid}/")
}

/// Callers may only touch blobs under `audio/{uid}/`
pub fn ensure_owned(path: &str, uid: &str) -> Result<()> {
    if path.starts_with(&user_audio_prefix(uid)) {
        Ok(())
    } else {
        Err(AdvisorError::Authorization(path.to_string()))
    }
}

/// Joined transcript and mean confidence rounded to two decimals
pub fn summarize_segments(segments: &[RecognitionSegment]) -> TranscriptionResult {
    if segments.is_empty() {
        return TranscriptionResult {
            transcript: String::new(),
            confidence: 0.0,
        };
    }

    let transcript = segments
        .iter()
        .map(|s| s.transcript.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    let mean = segments.iter().map(|s| s.confidence).sum::<f64>() / segments.len() as f64;

    TranscriptionResult {
        transcript,
        confidence: (mean * 100.0).round() / 100.0,
    }
}

fn validate_file_name(name: &str) -> Result<()> {
    if name.trim().is_empty() || name.contains('/') || name.contains("..") {
        return Err(AdvisorError::InvalidInput(format!(
            "Invalid audio file name: '{name}'"
        )));
    }
    Ok(())
}

impl AudioHandler for super::Handlers {
    async fn transcribe_audio(
        &self,
        ctx: &CallContext,
        data: &Value,
    ) -> Result<TranscriptionResult> {
        let identity = self.identity.resolve(ctx).await?;

        validate_required_fields(data, &["audioPath", "language"])?;
        let audio_path = validate_audio_path(&data["audioPath"])?;
        let language = validate_language(&data["language"])?;
        ensure_owned(&audio_path, &identity.uid)?;

        tracing::info!(uid = %identity.uid, path = %audio_path, language = %language, "Transcribing audio");

        let blob = self
            .blobs
            .read(&audio_path)
            .await?
            .ok_or_else(|| AdvisorError::NotFound(format!("Audio file not found: {audio_path}")))?;

        let segments = self
            .recognizer
            .recognize(&blob.bytes, speech_locale(language))
            .await?;

        if segments.is_empty() {
            tracing::warn!(uid = %identity.uid, path = %audio_path, "No speech detected");
        }

        Ok(summarize_segments(&segments))
    }

    async fn synthesize_speech(&self, ctx: &CallContext, data: &Value) -> Result<SynthesisResult> {
        let identity = self.identity.resolve(ctx).await?;

        validate_required_fields(data, &["text", "language"])?;
        let text = validate_text_length(&data["text"], MAX_SPEECH_TEXT_LENGTH)?;
        let language = validate_language(&data["language"])?;

        let voice = voice_for(language);
        tracing::info!(
            uid = %identity.uid,
            voice = %voice.name,
            text_chars = text.chars().count(),
            "Synthesizing speech"
        );

        let audio = self.synthesizer.synthesize(&text, &voice).await?;
        if audio.is_empty() {
            return Err(AdvisorError::Internal(
                "No audio content returned from Text-to-Speech".to_string(),
            ));
        }

        let storage_path = format!(
            "{}tts_{}.mp3",
            user_audio_prefix(&identity.uid),
            chrono::Utc::now().timestamp_millis()
        );
        self.blobs.write(&storage_path, &audio, "audio/mpeg").await?;
        let audio_url = self
            .blobs
            .signed_url(&storage_path, self.signed_url_ttl)
            .await?;

        Ok(SynthesisResult {
            audio_url,
            storage_path,
        })
    }

    async fn upload_audio(
        &self,
        ctx: &CallContext,
        file_name: &str,
        content_type: Option<&str>,
        bytes: &[u8],
    ) -> Result<UploadResult> {
        let identity = self.identity.resolve(ctx).await?;

        validate_file_name(file_name)?;
        if bytes.is_empty() {
            return Err(AdvisorError::InvalidInput("Audio upload is empty".to_string()));
        }
        if bytes.len() > self.max_upload_bytes {
            return Err(AdvisorError::InvalidInput(format!(
                "Audio upload too large: {} bytes (maximum {})",
                bytes.len(),
                self.max_upload_bytes
            )));
        }

        let storage_path = format!("{}{}", user_audio_prefix(&identity.uid), file_name);
        self.blobs
            .write(&storage_path, bytes, content_type.unwrap_or("audio/webm"))
            .await?;

        tracing::info!(uid = %identity.uid, path = %storage_path, bytes = bytes.len(), "Audio uploaded");
        Ok(UploadResult { storage_path })
    }

    async fn open_signed_blob(&self, token: &str) -> Result<StoredBlob> {
        let path = self
            .blobs
            .resolve_signed(token)
            .await?
            .ok_or_else(|| AdvisorError::NotFound("Link expired or unknown".to_string()))?;

        self.blobs
            .read(&path)
            .await?
            .ok_or_else(|| AdvisorError::NotFound(format!("Blob not found: {path}")))
    }
}
