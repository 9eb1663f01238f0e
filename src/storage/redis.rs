// src/storage/redis.rs

use crate::error::Result;
use crate::storage::CounterStore;
use async_trait::async_trait;
use deadpool_redis::{Config, Connection as RedisConnection, Pool, Runtime};
use redis::AsyncCommands;
use std::time::Duration;
use tracing::{info, trace};

/// Native Redis store backed by a `deadpool-redis` pool.
pub struct RedisStore {
    pool: Pool,
    key_prefix: String,
}

impl RedisStore {
    pub fn new(redis_url: &str, key_prefix: Option<String>) -> Result<Self> {
        let pool = Config::from_url(redis_url).create_pool(Some(Runtime::Tokio1))?;
        let key_prefix = key_prefix.unwrap_or_default();
        info!(redis.key_prefix = %key_prefix, "Redis connection pool created");
        Ok(Self { pool, key_prefix })
    }

    fn prefix_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }

    async fn get_connection(&self) -> Result<RedisConnection> {
        self.pool.get().await.map_err(Into::into)
    }
}

#[async_trait]
impl CounterStore for RedisStore {
    fn backend_name(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.get_connection().await?;
        let value: Option<String> = conn.get(self.prefix_key(key)).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut conn = self.get_connection().await?;
        let _: () = conn.set(self.prefix_key(key), value).await?;
        Ok(())
    }

    async fn incr(&self, key: &str) -> Result<i64> {
        trace!("RedisStore::incr: start for key '{}'", key);
        let mut conn = self.get_connection().await?;
        let value: i64 = conn.incr(self.prefix_key(key), 1).await?;
        Ok(value)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        let mut conn = self.get_connection().await?;
        let secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        let applied: bool = conn.expire(self.prefix_key(key), secs).await?;
        Ok(applied)
    }

    async fn get_del(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.get_connection().await?;
        let value: Option<String> = redis::cmd("GETDEL")
            .arg(self.prefix_key(key))
            .query_async(&mut conn)
            .await?;
        Ok(value)
    }
}
