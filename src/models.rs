use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Languages the advisory service accepts and answers in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Hi,
    Ta,
    Te,
}

impl Language {
    pub const ALL: [Language; 4] = [Language::En, Language::Hi, Language::Ta, Language::Te];

    /// Case-sensitive lookup; "EN" is not a language code
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|lang| lang.code() == code)
    }

    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Hi => "hi",
            Language::Ta => "ta",
            Language::Te => "te",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Hi => "Hindi",
            Language::Ta => "Tamil",
            Language::Te => "Telugu",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// Farm profiles are client-owned display data. Wrongly typed fields are
// dropped instead of failing the whole request.

fn display_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn crop_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => Some(
            items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
        ),
        Value::String(s) => Some(vec![s]),
        _ => None,
    })
}

fn nested<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(serde_json::from_value(Value::deserialize(deserializer)?).ok())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    #[serde(default, deserialize_with = "display_string")]
    pub village: Option<String>,
    #[serde(default, deserialize_with = "display_string")]
    pub district: Option<String>,
    #[serde(default, deserialize_with = "display_string")]
    pub state: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FarmArea {
    /// Clients send either a number or a string here
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default, deserialize_with = "display_string")]
    pub unit: Option<String>,
}

/// Farm context supplied by the client with every question
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmProfile {
    #[serde(default, deserialize_with = "crop_list")]
    pub crops: Option<Vec<String>>,
    #[serde(default, deserialize_with = "nested")]
    pub location: Option<Location>,
    #[serde(default, deserialize_with = "display_string")]
    pub soil_type: Option<String>,
    #[serde(default, deserialize_with = "display_string")]
    pub irrigation_type: Option<String>,
    #[serde(default, deserialize_with = "nested")]
    pub area: Option<FarmArea>,
    #[serde(default, deserialize_with = "display_string")]
    pub season: Option<String>,
}

/// Self-reported certainty label attached to an answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "High" => Some(Confidence::High),
            "Medium" => Some(Confidence::Medium),
            "Low" => Some(Confidence::Low),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::High => "High",
            Confidence::Medium => "Medium",
            Confidence::Low => "Low",
        }
    }
}

/// Normalized answer returned to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiResponse {
    pub answer: String,
    pub confidence: Confidence,
    pub sources: Vec<String>,
    pub suggestions: Vec<String>,
}

/// Response from askGemini
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AskResponse {
    #[serde(flatten)]
    pub response: AiResponse,
    pub chat_id: String,
}

/// Subset of the farm profile kept alongside a chat
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmSnapshot {
    pub crops: Vec<String>,
    pub location: Option<Location>,
    pub soil_type: Option<String>,
}

impl From<&FarmProfile> for FarmSnapshot {
    fn from(profile: &FarmProfile) -> Self {
        Self {
            crops: profile.crops.clone().unwrap_or_default(),
            location: profile.location.clone(),
            soil_type: profile.soil_type.clone(),
        }
    }
}

/// One question/answer exchange persisted per askGemini call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRecord {
    pub timestamp: DateTime<Utc>,
    pub question: String,
    pub answer: String,
    pub confidence: Confidence,
    pub sources: Vec<String>,
    pub suggestions: Vec<String>,
    pub language: Language,
    pub farm_profile: FarmSnapshot,
}

impl ChatRecord {
    pub fn new(
        question: String,
        response: &AiResponse,
        language: Language,
        profile: &FarmProfile,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            question,
            answer: response.answer.clone(),
            confidence: response.confidence,
            sources: response.sources.clone(),
            suggestions: response.suggestions.clone(),
            language,
            farm_profile: FarmSnapshot::from(profile),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptionResult {
    pub transcript: String,
    pub confidence: f64,
}

/// One recognized span of speech
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionSegment {
    pub transcript: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesisResult {
    pub audio_url: String,
    pub storage_path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    pub storage_path: String,
}

/// Provider voice used for speech synthesis
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceSelection {
    pub language_code: String,
    pub name: String,
    pub ssml_gender: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredBlob {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Per-request caller information handed to the identity resolver
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    pub auth_token: Option<String>,
}

impl CallContext {
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            auth_token: Some(token.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub uid: String,
}

// Gemini API request format
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiRequest {
    pub contents: Vec<GeminiContent>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
pub struct GeminiContent {
    pub role: String,
    pub parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
pub struct GeminiPart {
    pub text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

// Gemini API response format
#[derive(Debug, Deserialize)]
pub struct GeminiResponse {
    #[serde(default)]
    pub candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
pub struct GeminiCandidate {
    #[serde(default)]
    pub content: Option<GeminiCandidateContent>,
}

#[derive(Debug, Deserialize)]
pub struct GeminiCandidateContent {
    #[serde(default)]
    pub parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
pub struct GeminiResponsePart {
    #[serde(default)]
    pub text: Option<String>,
}

// Google Speech-to-Text request format
#[derive(Debug, Serialize)]
pub struct RecognizeRequest {
    pub config: RecognitionConfig,
    pub audio: RecognitionAudio,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognitionConfig {
    pub encoding: String,
    pub sample_rate_hertz: u32,
    pub language_code: String,
    pub enable_automatic_punctuation: bool,
    pub model: String,
}

#[derive(Debug, Serialize)]
pub struct RecognitionAudio {
    pub content: String,
}

// Google Speech-to-Text response format
#[derive(Debug, Deserialize)]
pub struct RecognizeResponse {
    #[serde(default)]
    pub results: Vec<SpeechResult>,
}

#[derive(Debug, Deserialize)]
pub struct SpeechResult {
    #[serde(default)]
    pub alternatives: Vec<SpeechAlternative>,
}

#[derive(Debug, Deserialize)]
pub struct SpeechAlternative {
    #[serde(default)]
    pub transcript: String,
    #[serde(default)]
    pub confidence: f64,
}

// Google Text-to-Speech request format
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesizeRequest {
    pub input: SynthesisInput,
    pub voice: VoiceSelection,
    pub audio_config: AudioConfig,
}

#[derive(Debug, Serialize)]
pub struct SynthesisInput {
    pub text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioConfig {
    pub audio_encoding: String,
    pub speaking_rate: f32,
    pub pitch: f32,
}

// Google Text-to-Speech response format
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesizeResponse {
    #[serde(default)]
    pub audio_content: Option<String>,
}
