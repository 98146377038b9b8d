use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::error::{AdvisorError, Result};
use crate::models::{CallContext, ChatRecord, Identity, StoredBlob};
use crate::redis::RedisManager;
use crate::repository_traits::{BlobStore, ChatStore, IdentityResolver};

/// Hex SHA-256 of a bearer token; raw tokens are never stored
pub fn token_digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

pub fn token_key(token: &str) -> String {
    format!("auth:tokens:{}", token_digest(token))
}

fn chat_key(uid: &str, chat_id: &str) -> String {
    format!("users:{uid}:chats:{chat_id}")
}

fn chat_index_key(uid: &str) -> String {
    format!("users:{uid}:chats")
}

fn blob_key(path: &str) -> String {
    format!("blobs:{path}")
}

fn signed_key(token: &str) -> String {
    format!("blobs:signed:{token}")
}

/// Bearer-token identity lookup backed by Redis
pub struct RedisIdentityResolver {
    redis: Arc<RedisManager>,
}

impl RedisIdentityResolver {
    pub fn new(redis: Arc<RedisManager>) -> Self {
        Self { redis }
    }

    /// Register `token` as a credential for `uid`
    pub async fn register_token(&self, token: &str, uid: &str) -> Result<()> {
        self.redis.set(&token_key(token), uid).await
    }
}

#[async_trait]
impl IdentityResolver for RedisIdentityResolver {
    async fn resolve(&self, ctx: &CallContext) -> Result<Identity> {
        let token = match ctx.auth_token.as_deref().map(str::trim) {
            Some(t) if !t.is_empty() => t,
            _ => return Err(AdvisorError::Unauthenticated),
        };

        match self.redis.get_string(&token_key(token)).await? {
            Some(uid) if !uid.is_empty() => Ok(Identity { uid }),
            _ => Err(AdvisorError::Unauthenticated),
        }
    }
}

/// Redis implementation of ChatStore
pub struct RedisChatStore {
    redis: Arc<RedisManager>,
}

impl RedisChatStore {
    pub fn new(redis: Arc<RedisManager>) -> Self {
        Self { redis }
    }
}

#[async_trait]
impl ChatStore for RedisChatStore {
    async fn create_chat(&self, uid: &str, record: &ChatRecord) -> Result<String> {
        let chat_id = uuid::Uuid::new_v4().to_string();
        self.redis
            .store_indexed_json(
                &chat_key(uid, &chat_id),
                record,
                &chat_index_key(uid),
                &chat_id,
                record.timestamp.timestamp_millis(),
            )
            .await?;
        Ok(chat_id)
    }
}

/// Redis implementation of BlobStore
pub struct RedisBlobStore {
    redis: Arc<RedisManager>,
    public_base_url: String,
    retention_seconds: i64,
}

impl RedisBlobStore {
    pub fn new(redis: Arc<RedisManager>, config: &Config) -> Self {
        Self {
            redis,
            public_base_url: config.server.public_base_url.trim_end_matches('/').to_string(),
            retention_seconds: config.storage.blob_ttl_seconds,
        }
    }

    fn signed_url_for(&self, token: &str) -> String {
        format!("{}/blobs/{}", self.public_base_url, token)
    }
}

#[async_trait]
impl BlobStore for RedisBlobStore {
    async fn write(&self, path: &str, bytes: &[u8], content_type: &str) -> Result<()> {
        self.redis
            .set_blob(&blob_key(path), bytes, content_type, self.retention_seconds)
            .await
    }

    async fn read(&self, path: &str) -> Result<Option<StoredBlob>> {
        Ok(self
            .redis
            .get_blob(&blob_key(path))
            .await?
            .map(|(bytes, content_type)| StoredBlob {
                bytes,
                content_type,
            }))
    }

    async fn signed_url(&self, path: &str, ttl: Duration) -> Result<String> {
        let token = uuid::Uuid::new_v4().simple().to_string();
        self.redis
            .set_ex(&signed_key(&token), path, ttl.as_secs().max(1))
            .await?;
        Ok(self.signed_url_for(&token))
    }

    async fn resolve_signed(&self, token: &str) -> Result<Option<String>> {
        self.redis.get_string(&signed_key(token)).await
    }
}
