//! 모든 핸들러에서 공유되는 애플리케이션 상태.
//!
//! 시장 데이터 소스나 이력 저장소가 설정되지 않았으면 항상 실패하는 대체 구현을
//! 도구에 넣어, 서버는 뜨되 해당 요청만 실패 봉투로 응답하게 합니다.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use flow_core::{
    AnalysisConfig, FlowError, FlowResult, FlowSample, InvestorSnapshot, Market, PricePoint,
    StockCode,
};
use flow_data::{CacheManager, HistoryStore, MarketDataSource};

use crate::registry::ToolRegistry;
use crate::tools::{InvestorTradingTool, PriceAnalysisTool};

/// 애플리케이션 공유 상태.
#[derive(Clone)]
pub struct AppState {
    /// 메서드 이름 → 도구
    pub registry: ToolRegistry,

    /// 결과 캐시 (Redis 또는 로컬)
    pub cache: CacheManager,

    /// 현재 매매 현황 소스 (KIS)
    pub market_source: Option<Arc<dyn MarketDataSource>>,

    /// 수급/가격 이력 저장소 (PostgreSQL)
    pub history: Option<Arc<dyn HistoryStore>>,

    pub version: String,

    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// 협력자로 도구를 구성합니다. `None`인 협력자는 항상 실패하는 구현으로 대체됩니다.
    pub fn new(
        analysis: AnalysisConfig,
        market_source: Option<Arc<dyn MarketDataSource>>,
        history: Option<Arc<dyn HistoryStore>>,
        cache: CacheManager,
    ) -> Self {
        let source_for_tools: Arc<dyn MarketDataSource> = match &market_source {
            Some(source) => Arc::clone(source),
            None => Arc::new(Unconfigured),
        };
        let history_for_tools: Arc<dyn HistoryStore> = match &history {
            Some(store) => Arc::clone(store),
            None => Arc::new(Unconfigured),
        };

        let investor = InvestorTradingTool::new(
            source_for_tools,
            Arc::clone(&history_for_tools),
            cache.clone(),
            analysis.clone(),
        );
        let price = PriceAnalysisTool::new(history_for_tools, cache.clone(), analysis);

        Self {
            registry: ToolRegistry::new(investor, price),
            cache,
            market_source,
            history,
            version: env!("CARGO_PKG_VERSION").to_string(),
            started_at: Utc::now(),
        }
    }

    pub fn uptime_secs(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }

    pub fn has_market_source(&self) -> bool {
        self.market_source.is_some()
    }

    pub fn has_history(&self) -> bool {
        self.history.is_some()
    }
}

/// 설정되지 않은 협력자.
struct Unconfigured;

#[async_trait]
impl MarketDataSource for Unconfigured {
    fn name(&self) -> &str {
        "not_configured"
    }

    async fn current_snapshot(
        &self,
        _stock_code: Option<&StockCode>,
        _market: Market,
    ) -> FlowResult<Option<InvestorSnapshot>> {
        Err(FlowError::DataUnavailable(
            "market data source is not configured".to_string(),
        ))
    }

    async fn health_check(&self) -> bool {
        false
    }
}

#[async_trait]
impl HistoryStore for Unconfigured {
    async fn flow_history(
        &self,
        _stock_code: Option<&StockCode>,
        _market: Market,
        _hours: u32,
    ) -> FlowResult<Vec<FlowSample>> {
        Err(FlowError::Upstream("history store is not configured".to_string()))
    }

    async fn price_history(&self, _stock_code: &StockCode, _hours: u32) -> FlowResult<Vec<PricePoint>> {
        Err(FlowError::Upstream("history store is not configured".to_string()))
    }

    async fn health_check(&self) -> bool {
        false
    }
}
