//! 수급 이력 저장 및 결과 캐싱.
//!
//! 이 crate는 다음을 제공합니다:
//! - 분석 도구가 의존하는 협력자 trait ([`MarketDataSource`], [`HistoryStore`])
//! - PostgreSQL 수급/가격 이력 저장소
//! - Redis 캐시와 인메모리 대체 캐시, 이 둘을 고르는 [`CacheManager`]
//! - 캐시 키와 기간별 TTL 정책

pub mod cache;
pub mod error;
pub mod source;
pub mod storage;

pub use error::{DataError, Result};
pub use source::{HistoryStore, MarketDataSource};

pub use cache::keys::{investor_trading_key, price_correlation_key, TtlPolicy};
pub use cache::local::LocalCache;
pub use cache::{CacheManager, ResultCache};

pub use storage::postgres::{Database, FlowRecord, PgHistoryStore, PriceRecord};
pub use storage::redis::RedisCache;
