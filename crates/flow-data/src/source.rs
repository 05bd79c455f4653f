//! 분석 도구가 의존하는 협력자 인터페이스.
//!
//! 분석 코어는 I/O를 하지 않으므로, 현재 매매 현황과 이력은
//! 이 trait들을 통해 주입됩니다. 테스트에서는 인메모리 구현으로 대체합니다.

use async_trait::async_trait;
use flow_core::{FlowResult, FlowSample, InvestorSnapshot, Market, PricePoint, StockCode};

/// 현재 투자자별 매매 현황을 제공하는 시장 데이터 소스.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// 소스 이름 (로그 및 헬스 체크용).
    fn name(&self) -> &str;

    /// 종목(없으면 시장 전체)의 현재 매매 현황을 조회합니다.
    ///
    /// 데이터가 없으면 `Ok(None)`.
    async fn current_snapshot(
        &self,
        stock_code: Option<&StockCode>,
        market: Market,
    ) -> FlowResult<Option<InvestorSnapshot>>;

    /// 소스 사용 가능 여부.
    async fn health_check(&self) -> bool {
        true
    }
}

/// 과거 수급/가격 이력 저장소.
///
/// 모든 조회 결과는 오래된 것 → 최신 순입니다.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// 최근 `hours`시간의 수급 이력.
    async fn flow_history(
        &self,
        stock_code: Option<&StockCode>,
        market: Market,
        hours: u32,
    ) -> FlowResult<Vec<FlowSample>>;

    /// 최근 `hours`시간의 종가 이력.
    async fn price_history(&self, stock_code: &StockCode, hours: u32) -> FlowResult<Vec<PricePoint>>;

    /// 저장소 사용 가능 여부.
    async fn health_check(&self) -> bool {
        true
    }
}
