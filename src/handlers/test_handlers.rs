use super::*;
use crate::config::StorageConfig;
use crate::error::AdvisorError;
use crate::models::{CallContext, Confidence, Identity, RecognitionSegment, StoredBlob};
use crate::parser::PROVIDER_SOURCE;
use crate::repository_traits::{MockBlobStore, MockChatStore, MockIdentityResolver};
use crate::speech::{MockSpeechRecognizer, MockSpeechSynthesizer};
use crate::transport::MockGenerator;

use serde_json::{Value, json};

/// Mocks with no expectations: any call on them fails the test
struct Mocks {
    identity: MockIdentityResolver,
    generator: MockGenerator,
    recognizer: MockSpeechRecognizer,
    synthesizer: MockSpeechSynthesizer,
    chats: MockChatStore,
    blobs: MockBlobStore,
}

impl Mocks {
    fn new() -> Self {
        Self {
            identity: MockIdentityResolver::new(),
            generator: MockGenerator::new(),
            recognizer: MockSpeechRecognizer::new(),
            synthesizer: MockSpeechSynthesizer::new(),
            chats: MockChatStore::new(),
            blobs: MockBlobStore::new(),
        }
    }

    fn authenticated(uid: &'static str) -> Self {
        let mut mocks = Self::new();
        mocks
            .identity
            .expect_resolve()
            .times(1)
            .returning(move |_| Ok(Identity { uid: uid.to_string() }));
        mocks
    }

    fn anonymous() -> Self {
        let mut mocks = Self::new();
        mocks
            .identity
            .expect_resolve()
            .times(1)
            .returning(|_| Err(AdvisorError::Unauthenticated));
        mocks
    }

    fn into_handlers(self) -> Handlers {
        self.into_handlers_with(&StorageConfig::default())
    }

    fn into_handlers_with(self, storage: &StorageConfig) -> Handlers {
        Handlers::new(
            Arc::new(self.identity),
            Arc::new(self.generator),
            Arc::new(self.recognizer),
            Arc::new(self.synthesizer),
            Arc::new(self.chats),
            Arc::new(self.blobs),
            storage,
        )
    }
}

fn ctx() -> CallContext {
    CallContext::with_token("token")
}

fn ask_payload() -> Value {
    json!({
        "question": "  How much urea for paddy?  ",
        "farmProfile": {
            "crops": ["Paddy"],
            "location": { "village": "Kondapalli", "district": "Krishna", "state": "Andhra Pradesh" },
            "soilType": "Clay",
            "season": "Kharif"
        },
        "language": "en"
    })
}

#[tokio::test]
async fn test_ask_gemini_happy_path() {
    let mut mocks = Mocks::authenticated("u123");
    mocks.generator.expect_is_configured().return_const(true);
    mocks
        .generator
        .expect_generate()
        .withf(|prompt| prompt.contains("How much urea for paddy?") && prompt.contains("Clay"))
        .times(1)
        .returning(|_| {
            Ok(r#"Sure! {"answer":"Use urea 46-0-0.","confidence":"High","sources":["ICAR"],"suggestions":["Test soil first"]}"#.to_string())
        });
    mocks
        .chats
        .expect_create_chat()
        .withf(|uid, record| {
            uid == "u123"
                && record.question == "How much urea for paddy?"
                && record.answer == "Use urea 46-0-0."
                && record.farm_profile.soil_type.as_deref() == Some("Clay")
        })
        .times(1)
        .returning(|_, _| Ok("chat-1".to_string()));

    let handlers = mocks.into_handlers();
    let resp = handlers.ask_gemini(&ctx(), &ask_payload()).await.unwrap();

    assert_eq!(resp.chat_id, "chat-1");
    assert_eq!(resp.response.answer, "Use urea 46-0-0.");
    assert_eq!(resp.response.confidence, Confidence::High);
    assert_eq!(resp.response.sources, vec!["ICAR".to_string()]);
    assert_eq!(resp.response.suggestions, vec!["Test soil first".to_string()]);
}

#[tokio::test]
async fn test_ask_gemini_tolerates_wrongly_typed_profile_fields() {
    let mut mocks = Mocks::authenticated("u123");
    mocks.generator.expect_is_configured().return_const(true);
    mocks
        .generator
        .expect_generate()
        .withf(|prompt| prompt.contains("Rice") && prompt.contains("Not specified"))
        .times(1)
        .returning(|_| Ok(r#"{"answer":"Transplant in June."}"#.to_string()));
    mocks
        .chats
        .expect_create_chat()
        .times(1)
        .returning(|_, _| Ok("chat-3".to_string()));

    let payload = json!({
        "question": "When to transplant?",
        "farmProfile": { "crops": "Rice", "soilType": 5, "location": "Guntur" },
        "language": "en"
    });
    let resp = mocks
        .into_handlers()
        .ask_gemini(&ctx(), &payload)
        .await
        .unwrap();
    assert_eq!(resp.chat_id, "chat-3");
    assert_eq!(resp.response.answer, "Transplant in June.");
}

#[tokio::test]
async fn test_ask_gemini_degrades_prose_reply() {
    let mut mocks = Mocks::authenticated("u123");
    mocks.generator.expect_is_configured().return_const(true);
    mocks
        .generator
        .expect_generate()
        .times(1)
        .returning(|_| Ok("I recommend crop rotation.".to_string()));
    mocks
        .chats
        .expect_create_chat()
        .times(1)
        .returning(|_, _| Ok("chat-2".to_string()));

    let resp = mocks
        .into_handlers()
        .ask_gemini(&ctx(), &ask_payload())
        .await
        .unwrap();
    assert_eq!(resp.response.answer, "I recommend crop rotation.");
    assert_eq!(resp.response.confidence, Confidence::Medium);
    assert_eq!(resp.response.sources, vec![PROVIDER_SOURCE.to_string()]);
}

#[tokio::test]
async fn test_ask_gemini_unauthenticated_makes_no_calls() {
    let mocks = Mocks::anonymous();
    let err = mocks
        .into_handlers()
        .ask_gemini(&CallContext::default(), &ask_payload())
        .await
        .unwrap_err();
    assert!(matches!(err, AdvisorError::Unauthenticated));
}

#[tokio::test]
async fn test_ask_gemini_checks_auth_before_validation() {
    let mocks = Mocks::anonymous();
    let err = mocks
        .into_handlers()
        .ask_gemini(&CallContext::default(), &json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, AdvisorError::Unauthenticated));
}

#[tokio::test]
async fn test_ask_gemini_lists_all_missing_fields() {
    let mocks = Mocks::authenticated("u123");
    let err = mocks
        .into_handlers()
        .ask_gemini(&ctx(), &json!({ "farmProfile": {} }))
        .await
        .unwrap_err();
    match err {
        AdvisorError::MissingFields(fields) => {
            assert_eq!(fields, vec!["question".to_string(), "language".to_string()])
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_ask_gemini_rejects_long_question_and_bad_language() {
    let mut payload = ask_payload();
    payload["question"] = json!("x".repeat(1001));
    let err = Mocks::authenticated("u123")
        .into_handlers()
        .ask_gemini(&ctx(), &payload)
        .await
        .unwrap_err();
    assert!(matches!(err, AdvisorError::TextTooLong { .. }));

    let mut payload = ask_payload();
    payload["language"] = json!("EN");
    let err = Mocks::authenticated("u123")
        .into_handlers()
        .ask_gemini(&ctx(), &payload)
        .await
        .unwrap_err();
    assert!(matches!(err, AdvisorError::UnsupportedLanguage(_)));
}

#[tokio::test]
async fn test_ask_gemini_missing_credential_skips_model_call() {
    let mut mocks = Mocks::authenticated("u123");
    mocks.generator.expect_is_configured().return_const(false);
    mocks.generator.expect_generate().never();
    mocks.chats.expect_create_chat().never();

    let err = mocks
        .into_handlers()
        .ask_gemini(&ctx(), &ask_payload())
        .await
        .unwrap_err();
    assert!(matches!(err, AdvisorError::Configuration(_)));
    assert_eq!(err.code().as_str(), "failed-precondition");
}

#[tokio::test]
async fn test_ask_gemini_answerless_reply_is_not_persisted() {
    let mut mocks = Mocks::authenticated("u123");
    mocks.generator.expect_is_configured().return_const(true);
    mocks
        .generator
        .expect_generate()
        .times(1)
        .returning(|_| Ok(r#"{"confidence":"High"}"#.to_string()));
    mocks.chats.expect_create_chat().never();

    let err = mocks
        .into_handlers()
        .ask_gemini(&ctx(), &ask_payload())
        .await
        .unwrap_err();
    assert!(matches!(err, AdvisorError::InvalidAiResponse(_)));
}

#[tokio::test]
async fn test_ask_gemini_persistence_failure_fails_call() {
    let mut mocks = Mocks::authenticated("u123");
    mocks.generator.expect_is_configured().return_const(true);
    mocks
        .generator
        .expect_generate()
        .times(1)
        .returning(|_| Ok(r#"{"answer":"ok"}"#.to_string()));
    mocks
        .chats
        .expect_create_chat()
        .times(1)
        .returning(|_, _| Err(AdvisorError::Internal("store unavailable".to_string())));

    let err = mocks
        .into_handlers()
        .ask_gemini(&ctx(), &ask_payload())
        .await
        .unwrap_err();
    assert_eq!(err.code().as_str(), "internal");
    assert!(err.to_string().contains("store unavailable"));
}

#[tokio::test]
async fn test_ask_gemini_model_failure_is_internal() {
    let mut mocks = Mocks::authenticated("u123");
    mocks.generator.expect_is_configured().return_const(true);
    mocks
        .generator
        .expect_generate()
        .times(1)
        .returning(|_| Err(AdvisorError::Internal("Gemini API error (503)".to_string())));
    mocks.chats.expect_create_chat().never();

    let err = mocks
        .into_handlers()
        .ask_gemini(&ctx(), &ask_payload())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("503"));
}

#[tokio::test]
async fn test_transcribe_audio_happy_path() {
    let mut mocks = Mocks::authenticated("u123");
    mocks
        .blobs
        .expect_read()
        .withf(|path| path == "audio/u123/rec.webm")
        .times(1)
        .returning(|_| {
            Ok(Some(StoredBlob {
                bytes: b"webm-bytes".to_vec(),
                content_type: "audio/webm".to_string(),
            }))
        });
    mocks
        .recognizer
        .expect_recognize()
        .withf(|audio, locale| audio == b"webm-bytes" && locale == "hi-IN")
        .times(1)
        .returning(|_, _| {
            Ok(vec![
                RecognitionSegment {
                    transcript: "gehun mein".to_string(),
                    confidence: 0.8,
                },
                RecognitionSegment {
                    transcript: "khaad kab dalein".to_string(),
                    confidence: 0.95,
                },
            ])
        });

    let result = mocks
        .into_handlers()
        .transcribe_audio(
            &ctx(),
            &json!({ "audioPath": "audio/u123/rec.webm", "language": "hi" }),
        )
        .await
        .unwrap();
    assert_eq!(result.transcript, "gehun mein\nkhaad kab dalein");
    assert_eq!(result.confidence, 0.88);
}

#[tokio::test]
async fn test_transcribe_audio_no_speech_is_empty_not_error() {
    let mut mocks = Mocks::authenticated("u123");
    mocks.blobs.expect_read().returning(|_| {
        Ok(Some(StoredBlob {
            bytes: vec![0; 16],
            content_type: "audio/webm".to_string(),
        }))
    });
    mocks
        .recognizer
        .expect_recognize()
        .times(1)
        .returning(|_, _| Ok(vec![]));

    let result = mocks
        .into_handlers()
        .transcribe_audio(
            &ctx(),
            &json!({ "audioPath": "audio/u123/silence.webm", "language": "en" }),
        )
        .await
        .unwrap();
    assert_eq!(result.transcript, "");
    assert_eq!(result.confidence, 0.0);
}

#[tokio::test]
async fn test_transcribe_audio_other_users_path_is_denied_before_blob_access() {
    let mut mocks = Mocks::authenticated("u123");
    mocks.blobs.expect_read().never();
    mocks.recognizer.expect_recognize().never();

    let err = mocks
        .into_handlers()
        .transcribe_audio(
            &ctx(),
            &json!({ "audioPath": "audio/otherUser/rec.webm", "language": "en" }),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AdvisorError::Authorization(_)));
    assert_eq!(err.code().as_str(), "permission-denied");
}

#[tokio::test]
async fn test_transcribe_audio_rejects_non_audio_path() {
    let err = Mocks::authenticated("u123")
        .into_handlers()
        .transcribe_audio(
            &ctx(),
            &json!({ "audioPath": "images/foo.png", "language": "en" }),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AdvisorError::InvalidInput(_)));
}

#[tokio::test]
async fn test_transcribe_audio_missing_blob_is_not_found() {
    let mut mocks = Mocks::authenticated("u123");
    mocks.blobs.expect_read().times(1).returning(|_| Ok(None));
    mocks.recognizer.expect_recognize().never();

    let err = mocks
        .into_handlers()
        .transcribe_audio(
            &ctx(),
            &json!({ "audioPath": "audio/u123/gone.webm", "language": "ta" }),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AdvisorError::NotFound(_)));
}

#[tokio::test]
async fn test_transcribe_audio_unauthenticated_makes_no_calls() {
    let err = Mocks::anonymous()
        .into_handlers()
        .transcribe_audio(
            &CallContext::default(),
            &json!({ "audioPath": "audio/u123/rec.webm", "language": "en" }),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AdvisorError::Unauthenticated));
}

#[tokio::test]
async fn test_synthesize_speech_happy_path() {
    let mut mocks = Mocks::authenticated("u123");
    mocks
        .synthesizer
        .expect_synthesize()
        .withf(|text, voice| text == "Water twice a week." && voice.language_code == "te-IN")
        .times(1)
        .returning(|_, _| Ok(b"ID3-mp3".to_vec()));
    mocks
        .blobs
        .expect_write()
        .withf(|path, bytes, content_type| {
            path.starts_with("audio/u123/tts_")
                && path.ends_with(".mp3")
                && bytes == b"ID3-mp3"
                && content_type == "audio/mpeg"
        })
        .times(1)
        .returning(|_, _, _| Ok(()));
    mocks
        .blobs
        .expect_signed_url()
        .withf(|_, ttl| ttl.as_secs() == 3600)
        .times(1)
        .returning(|_, _| Ok("http://127.0.0.1:8080/blobs/tok".to_string()));

    let result = mocks
        .into_handlers()
        .synthesize_speech(
            &ctx(),
            &json!({ "text": " Water twice a week. ", "language": "te" }),
        )
        .await
        .unwrap();
    assert_eq!(result.audio_url, "http://127.0.0.1:8080/blobs/tok");
    assert!(result.storage_path.starts_with("audio/u123/tts_"));
}

#[tokio::test]
async fn test_synthesize_speech_uses_configured_url_lifetime() {
    let mut mocks = Mocks::authenticated("u123");
    mocks
        .synthesizer
        .expect_synthesize()
        .returning(|_, _| Ok(b"ID3-mp3".to_vec()));
    mocks.blobs.expect_write().returning(|_, _, _| Ok(()));
    mocks
        .blobs
        .expect_signed_url()
        .withf(|_, ttl| ttl.as_secs() == 600)
        .times(1)
        .returning(|_, _| Ok("http://127.0.0.1:8080/blobs/tok".to_string()));

    let storage = StorageConfig {
        signed_url_ttl_seconds: 600,
        ..StorageConfig::default()
    };
    let result = mocks
        .into_handlers_with(&storage)
        .synthesize_speech(&ctx(), &json!({ "text": "hello", "language": "en" }))
        .await
        .unwrap();
    assert_eq!(result.audio_url, "http://127.0.0.1:8080/blobs/tok");
}

#[tokio::test]
async fn test_synthesize_speech_empty_audio_fails_without_write() {
    let mut mocks = Mocks::authenticated("u123");
    mocks
        .synthesizer
        .expect_synthesize()
        .times(1)
        .returning(|_, _| Ok(Vec::new()));
    mocks.blobs.expect_write().never();
    mocks.blobs.expect_signed_url().never();

    let err = mocks
        .into_handlers()
        .synthesize_speech(&ctx(), &json!({ "text": "hello", "language": "en" }))
        .await
        .unwrap_err();
    assert!(matches!(err, AdvisorError::Internal(_)));
}

#[tokio::test]
async fn test_synthesize_speech_text_cap() {
    let mut mocks = Mocks::authenticated("u123");
    mocks.synthesizer.expect_synthesize().never();
    let err = mocks
        .into_handlers()
        .synthesize_speech(&ctx(), &json!({ "text": "x".repeat(5001), "language": "en" }))
        .await
        .unwrap_err();
    assert!(matches!(err, AdvisorError::TextTooLong { max: 5000, .. }));
}

#[tokio::test]
async fn test_synthesize_speech_unauthenticated_makes_no_calls() {
    let err = Mocks::anonymous()
        .into_handlers()
        .synthesize_speech(
            &CallContext::default(),
            &json!({ "text": "hello", "language": "en" }),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AdvisorError::Unauthenticated));
}

#[tokio::test]
async fn test_upload_audio_writes_into_callers_namespace() {
    let mut mocks = Mocks::authenticated("u123");
    mocks
        .blobs
        .expect_write()
        .withf(|path, _, content_type| path == "audio/u123/rec.webm" && content_type == "audio/ogg")
        .times(1)
        .returning(|_, _, _| Ok(()));

    let result = mocks
        .into_handlers()
        .upload_audio(&ctx(), "rec.webm", Some("audio/ogg"), b"bytes")
        .await
        .unwrap();
    assert_eq!(result.storage_path, "audio/u123/rec.webm");
}

#[tokio::test]
async fn test_upload_audio_rejects_traversal_and_empty_body() {
    let err = Mocks::authenticated("u123")
        .into_handlers()
        .upload_audio(&ctx(), "../x.webm", None, b"bytes")
        .await
        .unwrap_err();
    assert!(matches!(err, AdvisorError::InvalidInput(_)));

    let err = Mocks::authenticated("u123")
        .into_handlers()
        .upload_audio(&ctx(), "rec.webm", None, b"")
        .await
        .unwrap_err();
    assert!(matches!(err, AdvisorError::InvalidInput(_)));
}

#[tokio::test]
async fn test_open_signed_blob() {
    let mut mocks = Mocks::new();
    mocks
        .blobs
        .expect_resolve_signed()
        .returning(|token| Ok((token == "live").then(|| "audio/u123/tts_1.mp3".to_string())));
    mocks.blobs.expect_read().times(1).returning(|_| {
        Ok(Some(StoredBlob {
            bytes: b"mp3".to_vec(),
            content_type: "audio/mpeg".to_string(),
        }))
    });
    let handlers = mocks.into_handlers();

    let blob = handlers.open_signed_blob("live").await.unwrap();
    assert_eq!(blob.content_type, "audio/mpeg");

    let err = handlers.open_signed_blob("expired").await.unwrap_err();
    assert!(matches!(err, AdvisorError::NotFound(_)));
}
