use async_trait::async_trait;
use std::time::Duration;

use crate::error::Result;
use crate::models::{CallContext, ChatRecord, Identity, StoredBlob};

#[cfg(test)]
use mockall::automock;

/// Resolves the caller of a request to a stable user id
#[cfg_attr(test, automock)]
#[async_trait]
pub trait IdentityResolver: Send + Sync + 'static {
    /// Fails with `Unauthenticated` when the context carries no valid identity
    async fn resolve(&self, ctx: &CallContext) -> Result<Identity>;
}

/// Per-user ordered chat history
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ChatStore: Send + Sync + 'static {
    /// Persist a new record and return its generated id
    async fn create_chat(&self, uid: &str, record: &ChatRecord) -> Result<String>;
}

/// Binary object storage addressed by path
#[cfg_attr(test, automock)]
#[async_trait]
pub trait BlobStore: Send + Sync + 'static {
    async fn write(&self, path: &str, bytes: &[u8], content_type: &str) -> Result<()>;
    /// `None` when nothing is stored at `path`
    async fn read(&self, path: &str) -> Result<Option<StoredBlob>>;
    /// Time-limited URL granting read access to `path`
    async fn signed_url(&self, path: &str, ttl: Duration) -> Result<String>;
    /// Path behind a signed URL token, if it has not expired
    async fn resolve_signed(&self, token: &str) -> Result<Option<String>>;
}
