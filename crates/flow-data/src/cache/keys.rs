//! 캐시 키와 기간별 TTL 정책.

use flow_core::{CacheConfig, InvestorType, Market, Period, StockCode};

/// 투자자 매매 동향 결과 키.
///
/// `investor_trading:{종목|ALL}:{투자자 유형}:{기간}:{시장}`
pub fn investor_trading_key(
    stock_code: Option<&StockCode>,
    investor_type: InvestorType,
    period: Period,
    market: Market,
) -> String {
    format!(
        "investor_trading:{}:{}:{}:{}",
        stock_code.map_or("ALL", |c| c.as_str()),
        investor_type.as_str(),
        period.as_str(),
        market.as_str()
    )
}

/// 가격-수급 상관관계 결과 키.
pub fn price_correlation_key(stock_code: &StockCode, period: Period) -> String {
    format!("price_correlation:{}:{}", stock_code.as_str(), period.as_str())
}

/// 기간별 캐시 유지 시간 (초).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtlPolicy {
    pub realtime: u64,
    pub minute: u64,
    pub hourly: u64,
    pub daily: u64,
}

impl From<&CacheConfig> for TtlPolicy {
    fn from(config: &CacheConfig) -> Self {
        Self {
            realtime: config.ttl_realtime,
            minute: config.ttl_minute,
            hourly: config.ttl_hourly,
            daily: config.ttl_daily,
        }
    }
}

impl TtlPolicy {
    /// 투자자 매매 동향 결과 TTL. `ALL` 기간 결과는 캐시하지 않습니다.
    pub fn investor(&self, period: Period) -> Option<u64> {
        match period {
            Period::D1 => Some(self.realtime),
            Period::D5 => Some(self.minute),
            Period::D20 => Some(self.hourly),
            Period::D60 => Some(self.daily),
            Period::All => None,
        }
    }

    /// 가격 상관관계 결과 TTL. 5일은 분 단위 TTL의 5배입니다.
    pub fn price(&self, period: Period) -> Option<u64> {
        match period {
            Period::D5 => Some(self.minute * 5),
            other => self.investor(other),
        }
    }
}
