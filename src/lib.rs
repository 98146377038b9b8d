pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod parser;
pub mod prompt;
pub mod redis;
pub mod repository;
pub mod repository_traits;
pub mod service;
pub mod speech;
pub mod transport;
pub mod validation;

use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;
use crate::handlers::Handlers;
use crate::redis::RedisManager;
use crate::repository::{RedisBlobStore, RedisChatStore, RedisIdentityResolver};
use crate::speech::GoogleSpeechTransport;
use crate::transport::GeminiTransport;

/// Wire the production collaborators into a handler set
pub fn build_handlers(cfg: &Config, redis: Arc<RedisManager>) -> Result<Handlers> {
    let generator = Arc::new(GeminiTransport::new(&cfg.gemini)?);
    let google_speech = Arc::new(GoogleSpeechTransport::new(&cfg.speech)?);

    Ok(Handlers::new(
        Arc::new(RedisIdentityResolver::new(Arc::clone(&redis))),
        generator,
        google_speech.clone(),
        google_speech,
        Arc::new(RedisChatStore::new(Arc::clone(&redis))),
        Arc::new(RedisBlobStore::new(redis, cfg)),
        &cfg.storage,
    ))
}
