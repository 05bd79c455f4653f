//! 인메모리 캐시 만료/용량 테스트.

use flow_data::{LocalCache, ResultCache};
use serde_json::json;
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn test_entry_expires_after_ttl() {
    let cache = LocalCache::new(10);
    cache.set("k", &json!({"v": 1}), 10).await.unwrap();

    tokio::time::advance(Duration::from_secs(9)).await;
    assert_eq!(cache.get("k").await.unwrap(), Some(json!({"v": 1})));

    tokio::time::advance(Duration::from_secs(1)).await;
    assert_eq!(cache.get("k").await.unwrap(), None);
    assert!(cache.is_empty().await);
}

#[tokio::test(start_paused = true)]
async fn test_full_cache_evicts_earliest_expiry() {
    let cache = LocalCache::new(3);
    cache.set("long", &json!(1), 3600).await.unwrap();
    cache.set("short", &json!(2), 10).await.unwrap();
    cache.set("mid", &json!(3), 60).await.unwrap();

    cache.set("new", &json!(4), 60).await.unwrap();

    assert_eq!(cache.len().await, 3);
    assert_eq!(cache.get("short").await.unwrap(), None);
    assert!(cache.get("long").await.unwrap().is_some());
    assert!(cache.get("mid").await.unwrap().is_some());
    assert!(cache.get("new").await.unwrap().is_some());
}

#[tokio::test(start_paused = true)]
async fn test_expired_entries_cleared_before_eviction() {
    let cache = LocalCache::new(2);
    cache.set("stale", &json!(1), 1).await.unwrap();
    cache.set("fresh", &json!(2), 3600).await.unwrap();

    tokio::time::advance(Duration::from_secs(2)).await;
    cache.set("new", &json!(3), 5).await.unwrap();

    // 만료 항목만 정리되고 유효 항목은 남음
    assert!(cache.get("fresh").await.unwrap().is_some());
    assert!(cache.get("new").await.unwrap().is_some());
}

#[tokio::test]
async fn test_overwrite_does_not_evict() {
    let cache = LocalCache::new(2);
    cache.set("a", &json!(1), 60).await.unwrap();
    cache.set("b", &json!(2), 60).await.unwrap();
    cache.set("a", &json!(10), 60).await.unwrap();

    assert_eq!(cache.get("a").await.unwrap(), Some(json!(10)));
    assert_eq!(cache.get("b").await.unwrap(), Some(json!(2)));
}

#[tokio::test]
async fn test_clear_pattern_and_delete() {
    let cache = LocalCache::default();
    cache.set("investor_trading:005930:ALL:1D:ALL", &json!(1), 60).await.unwrap();
    cache.set("investor_trading:000660:ALL:1D:ALL", &json!(2), 60).await.unwrap();
    cache.set("price_correlation:005930:1D", &json!(3), 60).await.unwrap();

    assert_eq!(cache.clear_pattern("investor_trading:*").await.unwrap(), 2);
    assert!(cache.delete("price_correlation:005930:1D").await.unwrap());
    assert!(!cache.delete("price_correlation:005930:1D").await.unwrap());
    assert!(cache.is_empty().await);
    assert_eq!(cache.capacity(), 1000);
}
