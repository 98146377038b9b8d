use std::sync::Arc;

use deadpool::managed::QueueMode;
use deadpool_redis::{Config as DeadpoolConfig, Pool, PoolConfig, Runtime, Timeouts};
use redis::AsyncCommands;

use crate::error::{AdvisorError, Result};

/// Redis connection manager
#[derive(Clone)]
pub struct RedisManager {
    pool: Arc<Pool>,
}

impl RedisManager {
    /// Create a new Redis manager with configuration
    pub async fn new_with_config(config: &crate::config::Config) -> Result<Self> {
        let redis_url = config.get_redis_url();

        tracing::info!(
            "Connecting to Redis at {}:{} (db: {})",
            config.redis.host,
            config.redis.port,
            config.redis.database
        );

        let mut cfg = DeadpoolConfig::from_url(&redis_url);
        cfg.pool = Some(PoolConfig {
            max_size: config.redis.pool.max_size,
            timeouts: Timeouts {
                wait: Some(config.get_pool_timeout()),
                create: Some(config.get_pool_create_timeout()),
                recycle: Some(config.get_pool_recycle_timeout()),
            },
            queue_mode: QueueMode::Fifo,
        });

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| AdvisorError::PoolCreation(e.to_string()))?;

        // Test the connection
        let mut conn = pool.get().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        tracing::info!("Redis connection established");

        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    /// Get a connection from the pool
    pub async fn get_connection(&self) -> Result<deadpool_redis::Connection> {
        Ok(self.pool.get().await?)
    }

    /// Store a JSON document and index it in a sorted set, atomically.
    /// Documents written here never expire.
    pub async fn store_indexed_json<T: serde::Serialize + Sync>(
        &self,
        key: &str,
        value: &T,
        index_key: &str,
        member: &str,
        score: i64,
    ) -> Result<()> {
        let json = serde_json::to_string(value)?;
        let mut conn = self.get_connection().await?;
        redis::pipe()
            .atomic()
            .set(key, json)
            .ignore()
            .zadd(index_key, member, score)
            .ignore()
            .query_async::<()>(&mut *conn)
            .await?;
        Ok(())
    }

    /// Store binary data with its content type under a hash, expiring after `ttl_seconds`
    pub async fn set_blob(
        &self,
        key: &str,
        bytes: &[u8],
        content_type: &str,
        ttl_seconds: i64,
    ) -> Result<()> {
        let mut conn = self.get_connection().await?;
        redis::pipe()
            .atomic()
            .hset(key, "data", bytes)
            .ignore()
            .hset(key, "content_type", content_type)
            .ignore()
            .expire(key, ttl_seconds)
            .ignore()
            .query_async::<()>(&mut *conn)
            .await?;
        Ok(())
    }

    /// Fetch binary data and content type stored by [`RedisManager::set_blob`]
    pub async fn get_blob(&self, key: &str) -> Result<Option<(Vec<u8>, String)>> {
        let mut conn = self.get_connection().await?;
        let data: Option<Vec<u8>> = conn.hget(key, "data").await?;
        let content_type: Option<String> = conn.hget(key, "content_type").await?;
        Ok(data.map(|bytes| {
            (
                bytes,
                content_type.unwrap_or_else(|| "application/octet-stream".to_string()),
            )
        }))
    }

    /// Set a string value with expiry
    pub async fn set_ex(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<()> {
        let mut conn = self.get_connection().await?;
        conn.set_ex::<_, _, ()>(key, value, ttl_seconds).await?;
        Ok(())
    }

    /// Set a string value without expiry
    pub async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut conn = self.get_connection().await?;
        conn.set::<_, _, ()>(key, value).await?;
        Ok(())
    }

    pub async fn get_string(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.get_connection().await?;
        Ok(conn.get(key).await?)
    }
}
