//! 결과 캐시.
//!
//! [`CacheManager`]는 시작 시 Redis에 연결할 수 있으면 Redis를, 아니면
//! 인메모리 [`LocalCache`]를 사용합니다. 캐시 오류는 요청을 실패시키지 않고
//! 로그만 남긴 뒤 캐시 미스로 처리합니다.

pub mod keys;
pub mod local;

use async_trait::async_trait;
use flow_core::CacheConfig;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::storage::redis::RedisCache;

pub use keys::TtlPolicy;
pub use local::LocalCache;

/// 키-값 결과 캐시.
#[async_trait]
pub trait ResultCache: Send + Sync {
    /// 백엔드 이름 (`redis`, `local`).
    fn backend(&self) -> &'static str;

    /// 만료되지 않은 값을 조회합니다.
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// `ttl_secs`초 동안 유효한 값을 저장합니다.
    async fn set(&self, key: &str, value: &Value, ttl_secs: u64) -> Result<()>;

    /// 키를 삭제합니다. 삭제된 키가 있으면 `true`.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// `*` 와일드카드 패턴과 일치하는 키를 모두 삭제합니다.
    async fn clear_pattern(&self, pattern: &str) -> Result<usize>;

    async fn health_check(&self) -> bool;
}

/// 캐시 백엔드 선택과 오류 격리를 담당합니다.
#[derive(Clone)]
pub struct CacheManager {
    inner: Arc<dyn ResultCache>,
    ttl: TtlPolicy,
}

impl CacheManager {
    /// 주어진 백엔드로 생성합니다.
    pub fn new(inner: Arc<dyn ResultCache>, ttl: TtlPolicy) -> Self {
        Self { inner, ttl }
    }

    /// 인메모리 캐시만 사용합니다.
    pub fn local(config: &CacheConfig) -> Self {
        Self::new(
            Arc::new(LocalCache::new(config.local_capacity)),
            TtlPolicy::from(config),
        )
    }

    /// 설정에 Redis URL이 있고 연결·PING에 성공하면 Redis를, 아니면 로컬 캐시를 사용합니다.
    pub async fn connect(config: &CacheConfig) -> Self {
        let Some(url) = config.redis_url.as_deref() else {
            info!("Redis URL not configured, using local cache");
            return Self::local(config);
        };

        match RedisCache::connect(url).await {
            Ok(redis) if redis.health_check().await => {
                Self::new(Arc::new(redis), TtlPolicy::from(config))
            }
            Ok(_) => {
                warn!("Redis did not answer PING, falling back to local cache");
                Self::local(config)
            }
            Err(e) => {
                warn!(error = %e, "Redis unavailable, falling back to local cache");
                Self::local(config)
            }
        }
    }

    pub fn backend(&self) -> &'static str {
        self.inner.backend()
    }

    pub fn ttl(&self) -> &TtlPolicy {
        &self.ttl
    }

    /// 값을 조회해 `T`로 역직렬화합니다. 오류는 미스로 처리합니다.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = match self.inner.get(key).await {
            Ok(Some(value)) => value,
            Ok(None) => {
                debug!(key, "Cache miss");
                return None;
            }
            Err(e) => {
                warn!(key, error = %e, "Cache read failed");
                return None;
            }
        };

        match serde_json::from_value(value) {
            Ok(parsed) => {
                debug!(key, "Cache hit");
                Some(parsed)
            }
            Err(e) => {
                warn!(key, error = %e, "Cached value has unexpected shape");
                None
            }
        }
    }

    /// 값을 직렬화해 저장합니다. 오류는 로그만 남깁니다.
    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T, ttl_secs: u64) {
        let value = match serde_json::to_value(value) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "Failed to serialize cache value");
                return;
            }
        };

        if let Err(e) = self.inner.set(key, &value, ttl_secs).await {
            warn!(key, error = %e, "Cache write failed");
        }
    }

    pub async fn invalidate(&self, pattern: &str) -> usize {
        match self.inner.clear_pattern(pattern).await {
            Ok(count) => count,
            Err(e) => {
                warn!(pattern, error = %e, "Cache invalidation failed");
                0
            }
        }
    }

    pub async fn health_check(&self) -> bool {
        self.inner.health_check().await
    }
}
