//! 인메모리 TTL 캐시.
//!
//! Redis를 사용할 수 없을 때의 대체 캐시입니다. 용량이 가득 차면
//! 만료된 항목을 먼저 비우고, 그래도 부족하면 가장 먼저 만료될 항목을 버립니다.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::trace;

use super::ResultCache;
use crate::error::Result;

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Instant,
}

/// 용량 제한이 있는 인메모리 캐시.
#[derive(Debug, Clone)]
pub struct LocalCache {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
    capacity: usize,
}

impl Default for LocalCache {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl LocalCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 만료 여부와 관계없이 저장된 항목 수.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl ResultCache for LocalCache {
    fn backend(&self) -> &'static str {
        "local"
    }

    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if entry.expires_at > now => return Ok(Some(entry.value.clone())),
                Some(_) => {}
                None => return Ok(None),
            }
        }

        // 만료된 항목은 읽을 때 제거
        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(|e| e.expires_at <= now) {
            entries.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: &Value, ttl_secs: u64) -> Result<()> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;

        if !entries.contains_key(key) && entries.len() >= self.capacity {
            entries.retain(|_, e| e.expires_at > now);

            if entries.len() >= self.capacity {
                let earliest = entries
                    .iter()
                    .min_by_key(|(_, e)| e.expires_at)
                    .map(|(k, _)| k.clone());
                if let Some(evicted) = earliest {
                    trace!(key = %evicted, "Evicting local cache entry");
                    entries.remove(&evicted);
                }
            }
        }

        entries.insert(
            key.to_string(),
            Entry {
                value: value.clone(),
                expires_at: now + Duration::from_secs(ttl_secs),
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.entries.write().await.remove(key).is_some())
    }

    async fn clear_pattern(&self, pattern: &str) -> Result<usize> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|k, _| !glob_match(pattern, k));
        Ok(before - entries.len())
    }

    async fn health_check(&self) -> bool {
        true
    }
}

/// `*`만 지원하는 단순 글롭 매칭.
///
/// Redis `SCAN MATCH`와 달리 `?`와 `[...]`는 특수 문자가 아니라 그대로 비교합니다.
fn glob_match(pattern: &str, text: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();
    if parts.len() == 1 {
        return pattern == text;
    }

    let (first, last) = (parts[0], parts[parts.len() - 1]);
    if !text.starts_with(first) || text.len() < first.len() + last.len() || !text.ends_with(last) {
        return false;
    }

    let mut rest = &text[first.len()..text.len() - last.len()];
    for part in &parts[1..parts.len() - 1] {
        match rest.find(part) {
            Some(idx) => rest = &rest[idx + part.len()..],
            None => return false,
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glob_match() {
        assert!(glob_match("investor_trading:*", "investor_trading:005930:ALL:1D:ALL"));
        assert!(glob_match("*:1D:*", "investor_trading:005930:ALL:1D:ALL"));
        assert!(glob_match("*", ""));
        assert!(glob_match("exact", "exact"));
        assert!(!glob_match("price_correlation:*", "investor_trading:005930"));
        assert!(!glob_match("a*b*c", "acb"));
        assert!(!glob_match("ab*ba", "aba"));
    }

    #[test]
    fn test_glob_match_treats_other_wildcards_literally() {
        assert!(!glob_match("investor_trading:00593?:*", "investor_trading:005930:ALL"));
        assert!(glob_match("key?", "key?"));
        assert!(!glob_match("key[12]", "key1"));
        assert!(glob_match("key[12]", "key[12]"));
    }
}
