//! Redis 결과 캐시.
//!
//! 분석 결과를 JSON 문자열로 저장합니다. 값의 구조는 호출자가 정합니다.

use async_trait::async_trait;
use redis::{aio::MultiplexedConnection, AsyncCommands, Client};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

use crate::cache::ResultCache;
use crate::error::{DataError, Result};

/// Redis 연결 래퍼.
#[derive(Clone)]
pub struct RedisCache {
    connection: Arc<RwLock<MultiplexedConnection>>,
}

impl RedisCache {
    /// 새로운 Redis 캐시 연결을 생성합니다.
    pub async fn connect(url: &str) -> Result<Self> {
        info!("Connecting to Redis...");

        let client = Client::open(url).map_err(|e| DataError::CacheError(e.to_string()))?;

        let connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| DataError::CacheError(e.to_string()))?;

        info!("Redis connection established");

        Ok(Self {
            connection: Arc::new(RwLock::new(connection)),
        })
    }
}

#[async_trait]
impl ResultCache for RedisCache {
    fn backend(&self) -> &'static str {
        "redis"
    }

    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let mut conn = self.connection.write().await;
        let value: Option<String> = conn.get(key).await?;

        match value {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, value))]
    async fn set(&self, key: &str, value: &Value, ttl_secs: u64) -> Result<()> {
        let json = serde_json::to_string(value)?;

        let mut conn = self.connection.write().await;
        let _: () = conn.set_ex(key, json, ttl_secs).await?;

        debug!(key, ttl_secs, "Cached value");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut conn = self.connection.write().await;
        let deleted: i64 = conn.del(key).await?;
        Ok(deleted > 0)
    }

    async fn clear_pattern(&self, pattern: &str) -> Result<usize> {
        let mut conn = self.connection.write().await;
        let keys: Vec<String> = conn.keys(pattern).await?;

        if keys.is_empty() {
            return Ok(0);
        }

        let deleted: i64 = conn.del(&keys).await?;
        Ok(deleted as usize)
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.connection.write().await;
        let pong: std::result::Result<String, _> = redis::cmd("PING").query_async(&mut *conn).await;
        matches!(pong.as_deref(), Ok("PONG"))
    }
}
