//! Callable HTTP surface: `POST /{operation}` with `{"data": ...}` bodies,
//! answered with `{"result": ...}` or `{"error": {"status", "message"}}`.

use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, Path, State},
    http::{HeaderMap, header},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::error::{AdvisorError, Result};
use crate::handlers::{AskHandler, AudioHandler, Handlers};
use crate::models::CallContext;

#[derive(Debug, Deserialize)]
pub struct CallableRequest {
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Serialize)]
struct CallableResponse<T> {
    result: T,
}

/// Error rendered in the callable error envelope
pub struct CallableError(pub AdvisorError);

impl IntoResponse for CallableError {
    fn into_response(self) -> Response {
        let code = self.0.code();
        (
            code.http_status(),
            Json(json!({
                "error": {
                    "status": code.as_str(),
                    "message": self.0.to_string(),
                }
            })),
        )
            .into_response()
    }
}

/// Extract the bearer token, if any, from request headers
pub fn call_context(headers: &HeaderMap) -> CallContext {
    let auth_token = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());
    CallContext { auth_token }
}

/// Decode the `{"data": ...}` envelope. A malformed body still goes through
/// identity resolution so anonymous callers are told they are unauthenticated.
async fn callable_data(handlers: &Handlers, ctx: &CallContext, body: &Bytes) -> Result<Value> {
    match serde_json::from_slice::<CallableRequest>(body) {
        Ok(req) => Ok(req.data),
        Err(e) => {
            handlers.identity.resolve(ctx).await?;
            Err(AdvisorError::InvalidInput(format!(
                "Request body must be a JSON object with a 'data' field: {e}"
            )))
        }
    }
}

fn respond<T: Serialize>(operation: &str, result: Result<T>) -> Response {
    match result {
        Ok(result) => Json(CallableResponse { result }).into_response(),
        Err(e) => {
            if e.is_client_error() {
                tracing::warn!("{} rejected: {}", operation, e);
            } else {
                tracing::error!("{} error: {}", operation, e);
            }
            CallableError(e).into_response()
        }
    }
}

async fn ask_gemini(
    State(handlers): State<Arc<Handlers>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let ctx = call_context(&headers);
    let result = match callable_data(&handlers, &ctx, &body).await {
        Ok(data) => handlers.ask_gemini(&ctx, &data).await,
        Err(e) => Err(e),
    };
    respond("askGemini", result)
}

async fn transcribe_audio(
    State(handlers): State<Arc<Handlers>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let ctx = call_context(&headers);
    let result = match callable_data(&handlers, &ctx, &body).await {
        Ok(data) => handlers.transcribe_audio(&ctx, &data).await,
        Err(e) => Err(e),
    };
    respond("transcribeAudio", result)
}

async fn synthesize_speech(
    State(handlers): State<Arc<Handlers>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let ctx = call_context(&headers);
    let result = match callable_data(&handlers, &ctx, &body).await {
        Ok(data) => handlers.synthesize_speech(&ctx, &data).await,
        Err(e) => Err(e),
    };
    respond("synthesizeSpeech", result)
}

async fn upload_audio(
    State(handlers): State<Arc<Handlers>>,
    Path(file_name): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let ctx = call_context(&headers);
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|h| h.to_str().ok());
    respond(
        "uploadAudio",
        handlers
            .upload_audio(&ctx, &file_name, content_type, &body)
            .await,
    )
}

async fn fetch_blob(State(handlers): State<Arc<Handlers>>, Path(token): Path<String>) -> Response {
    match handlers.open_signed_blob(&token).await {
        Ok(blob) => ([(header::CONTENT_TYPE, blob.content_type)], blob.bytes).into_response(),
        Err(e) => {
            tracing::warn!("blob fetch failed: {}", e);
            CallableError(e).into_response()
        }
    }
}

pub fn router(handlers: Arc<Handlers>) -> Router {
    let body_limit = handlers.max_upload_bytes;
    Router::new()
        .route("/askGemini", post(ask_gemini))
        .route("/transcribeAudio", post(transcribe_audio))
        .route("/synthesizeSpeech", post(synthesize_speech))
        .route("/storage/audio/:file_name", put(upload_audio))
        .route("/blobs/:token", get(fetch_blob))
        .route("/health", get(|| async { "ok" }))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(handlers)
}
