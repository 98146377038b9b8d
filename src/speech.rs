use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Client;

use crate::config::{SpeechConfig, is_configured_key};
use crate::error::{AdvisorError, Result};
use crate::models::{
    AudioConfig, Language, RecognitionAudio, RecognitionConfig, RecognitionSegment,
    RecognizeRequest, RecognizeResponse, SynthesisInput, SynthesizeRequest, SynthesizeResponse,
    VoiceSelection,
};

/// Provider locale used for recognition and synthesis
pub fn speech_locale(language: Language) -> &'static str {
    match language {
        Language::En => "en-IN",
        Language::Hi => "hi-IN",
        Language::Ta => "ta-IN",
        Language::Te => "te-IN",
    }
}

pub fn voice_for(language: Language) -> VoiceSelection {
    let name = match language {
        Language::En => "en-IN-Wavenet-D",
        Language::Hi => "hi-IN-Wavenet-A",
        Language::Ta => "ta-IN-Wavenet-A",
        Language::Te => "te-IN-Standard-A",
    };
    VoiceSelection {
        language_code: speech_locale(language).to_string(),
        name: name.to_string(),
        ssml_gender: "FEMALE".to_string(),
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    async fn recognize(&self, audio: &[u8], locale: &str) -> Result<Vec<RecognitionSegment>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Returns the encoded audio; empty when the provider sent nothing
    async fn synthesize(&self, text: &str, voice: &VoiceSelection) -> Result<Vec<u8>>;
}

/// Google Cloud Speech-to-Text and Text-to-Speech over REST
pub struct GoogleSpeechTransport {
    client: Client,
    cfg: SpeechConfig,
}

impl GoogleSpeechTransport {
    pub fn new(cfg: &SpeechConfig) -> Result<Self> {
        Ok(Self {
            client: Client::new(),
            cfg: cfg.clone(),
        })
    }

    fn ensure_configured(&self) -> Result<()> {
        if is_configured_key(&self.cfg.api_key) {
            Ok(())
        } else {
            Err(AdvisorError::Configuration(
                "Google speech API key is not configured".to_string(),
            ))
        }
    }

    async fn post<Req, Resp>(&self, url: &str, body: &Req, what: &str) -> Result<Resp>
    where
        Req: serde::Serialize + Sync,
        Resp: serde::de::DeserializeOwned,
    {
        let response = self
            .client
            .post(url)
            .query(&[("key", &self.cfg.api_key)])
            .json(body)
            .send()
            .await
            .map_err(|e| AdvisorError::Internal(format!("Failed to reach {what} API: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AdvisorError::Internal(format!(
                "{what} API error ({status}): {}",
                response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string())
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AdvisorError::Internal(format!("Failed to parse {what} response: {e}")))
    }
}

/// First alternative of every result, skipping results with none
pub fn segments_from(response: RecognizeResponse) -> Vec<RecognitionSegment> {
    response
        .results
        .into_iter()
        .filter_map(|r| r.alternatives.into_iter().next())
        .map(|alt| RecognitionSegment {
            transcript: alt.transcript,
            confidence: alt.confidence,
        })
        .collect()
}

pub fn decode_audio_content(response: SynthesizeResponse) -> Result<Vec<u8>> {
    match response.audio_content {
        Some(encoded) => STANDARD
            .decode(encoded.as_bytes())
            .map_err(|e| AdvisorError::Internal(format!("Invalid audio content encoding: {e}"))),
        None => Ok(Vec::new()),
    }
}

#[async_trait]
impl SpeechRecognizer for GoogleSpeechTransport {
    async fn recognize(&self, audio: &[u8], locale: &str) -> Result<Vec<RecognitionSegment>> {
        self.ensure_configured()?;
        let req = RecognizeRequest {
            config: RecognitionConfig {
                encoding: self.cfg.encoding.clone(),
                sample_rate_hertz: self.cfg.sample_rate_hertz,
                language_code: locale.to_string(),
                enable_automatic_punctuation: true,
                model: "default".to_string(),
            },
            audio: RecognitionAudio {
                content: STANDARD.encode(audio),
            },
        };

        let body: RecognizeResponse = self
            .post(&self.cfg.recognize_url, &req, "Speech-to-Text")
            .await?;
        Ok(segments_from(body))
    }
}

#[async_trait]
impl SpeechSynthesizer for GoogleSpeechTransport {
    async fn synthesize(&self, text: &str, voice: &VoiceSelection) -> Result<Vec<u8>> {
        self.ensure_configured()?;
        let req = SynthesizeRequest {
            input: SynthesisInput {
                text: text.to_string(),
            },
            voice: voice.clone(),
            audio_config: AudioConfig {
                audio_encoding: "MP3".to_string(),
                speaking_rate: self.cfg.speaking_rate,
                pitch: 0.0,
            },
        };

        let body: SynthesizeResponse = self
            .post(&self.cfg.synthesize_url, &req, "Text-to-Speech")
            .await?;
        decode_audio_content(body)
    }
}
