//! 투자자 매매 동향 도구.
//!
//! 종목을 지정하면 해당 종목의 추세, 강도, 시장 영향도, 스마트 머니 신호를,
//! 지정하지 않으면 시장 전체의 개요, 추세, 심리, 투자자 그룹 분석을 돌려줍니다.
//! `ALL` 기간은 네 구체 기간을 동시에 분석해 기간별 결과를 모읍니다.

use std::sync::Arc;

use chrono::Utc;
use flow_analytics::market::{
    investor_groups, market_impact, market_overview, market_sentiment, InvestorGroupAnalysis,
    MarketImpact, MarketSentiment,
};
use flow_analytics::{
    IntensityClassifier, IntensityScore, SignalEngine, SmartMoneySignal, TrendAnalyzer,
    TrendResult,
};
use flow_core::{
    AnalysisConfig, FlowError, FlowResult, FlowSample, InvestorSnapshot, InvestorType, Market,
    Period, StockCode,
};
use flow_data::{investor_trading_key, CacheManager, HistoryStore, MarketDataSource};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, error, info, instrument, warn};

use super::optional_stock_code;
use crate::envelope;

/// 추세 분석에 쓰는 최근 이력 수.
const TREND_WINDOW: usize = 10;
/// 신호 신뢰도에 쓰는 최근 이력 수.
const SIGNAL_WINDOW: usize = 5;

/// `get_investor_trading` 요청 파라미터.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InvestorTradingRequest {
    /// 종목 코드. 없으면 시장 전체
    pub stock_code: Option<String>,
    pub investor_type: String,
    pub period: String,
    pub market: String,
    pub include_analysis: bool,
    pub use_cache: bool,
}

impl Default for InvestorTradingRequest {
    fn default() -> Self {
        Self {
            stock_code: None,
            investor_type: InvestorType::All.as_str().to_string(),
            period: Period::D1.as_str().to_string(),
            market: Market::All.as_str().to_string(),
            include_analysis: true,
            use_cache: true,
        }
    }
}

impl InvestorTradingRequest {
    /// 종목 요청.
    pub fn for_stock(stock_code: impl Into<String>) -> Self {
        Self {
            stock_code: Some(stock_code.into()),
            ..Default::default()
        }
    }

    pub fn with_period(mut self, period: Period) -> Self {
        self.period = period.as_str().to_string();
        self
    }

    pub fn with_investor_type(mut self, investor_type: InvestorType) -> Self {
        self.investor_type = investor_type.as_str().to_string();
        self
    }

    pub fn with_market(mut self, market: Market) -> Self {
        self.market = market.as_str().to_string();
        self
    }

    pub fn without_cache(mut self) -> Self {
        self.use_cache = false;
        self
    }

    fn validate(&self) -> FlowResult<InvestorQuery> {
        Ok(InvestorQuery {
            stock_code: optional_stock_code(self.stock_code.as_deref())?,
            investor_type: self.investor_type.parse()?,
            period: self.period.parse()?,
            market: self.market.parse()?,
            include_analysis: self.include_analysis,
            use_cache: self.use_cache,
        })
    }
}

/// 검증된 요청.
#[derive(Debug, Clone)]
struct InvestorQuery {
    stock_code: Option<StockCode>,
    investor_type: InvestorType,
    period: Period,
    market: Market,
    include_analysis: bool,
    use_cache: bool,
}

/// 개별 종목 분석 결과.
#[derive(Debug, Clone, Serialize)]
pub struct StockAnalysis {
    pub trend_analysis: TrendResult,
    pub intensity_score: IntensityScore,
    pub market_impact: MarketImpact,
    pub smart_money_signal: SmartMoneySignal,
}

impl StockAnalysis {
    pub fn compute(snapshot: &InvestorSnapshot, history: &[FlowSample], config: &AnalysisConfig) -> Self {
        let smart_history = smart_money_series(history);
        let current = snapshot.smart_money_net() as f64;

        Self {
            trend_analysis: TrendAnalyzer::new(TREND_WINDOW).analyze(current, &smart_history),
            intensity_score: IntensityClassifier::new(config.intensity_thresholds).score(snapshot),
            market_impact: market_impact(snapshot, config),
            smart_money_signal: SignalEngine::from_config(config)
                .with_window(SIGNAL_WINDOW)
                .evaluate(snapshot.foreign_net, snapshot.institution_net, &smart_history),
        }
    }

    /// 투자자 유형에 해당하는 항목만 남깁니다.
    ///
    /// 외국인/기관 외의 유형은 전체 분석을 그대로 돌려줍니다.
    pub fn view(&self, investor_type: InvestorType) -> FlowResult<Value> {
        let view = match investor_type {
            InvestorType::Foreign => json!({
                "trend_analysis": self.trend_analysis,
                "intensity_score": {
                    "foreign_intensity": self.intensity_score.foreign_intensity,
                },
                "smart_money_signal": {
                    "foreign_flow": self.smart_money_signal.foreign_flow,
                },
            }),
            InvestorType::Institution => json!({
                "trend_analysis": self.trend_analysis,
                "intensity_score": {
                    "institution_intensity": self.intensity_score.institution_intensity,
                },
                "smart_money_signal": {
                    "institutional_flow": self.smart_money_signal.institutional_flow,
                },
            }),
            _ => serde_json::to_value(self)?,
        };
        Ok(view)
    }
}

/// 시장 전체 분석 결과.
#[derive(Debug, Clone, Serialize)]
pub struct MarketAnalysis {
    pub market_trend: TrendResult,
    pub market_sentiment: MarketSentiment,
    pub investor_group_analysis: InvestorGroupAnalysis,
}

impl MarketAnalysis {
    pub fn compute(snapshot: &InvestorSnapshot, history: &[FlowSample], config: &AnalysisConfig) -> Self {
        let smart_history = smart_money_series(history);
        let classifier = IntensityClassifier::new(config.intensity_thresholds);

        Self {
            market_trend: TrendAnalyzer::new(TREND_WINDOW)
                .analyze(snapshot.smart_money_net() as f64, &smart_history),
            market_sentiment: market_sentiment(snapshot),
            investor_group_analysis: investor_groups(snapshot, history, &classifier),
        }
    }
}

/// 기간 응답 봉투의 `analysis` 항목. 분석을 생략했으면 `null`.
fn analysis_of(envelope: &Value) -> Value {
    envelope.get("analysis").cloned().unwrap_or(Value::Null)
}

fn smart_money_series(history: &[FlowSample]) -> Vec<f64> {
    history.iter().map(|s| s.smart_money_net() as f64).collect()
}

/// 투자자 매매 동향 도구.
#[derive(Clone)]
pub struct InvestorTradingTool {
    source: Arc<dyn MarketDataSource>,
    history: Arc<dyn HistoryStore>,
    cache: CacheManager,
    config: AnalysisConfig,
}

impl InvestorTradingTool {
    pub fn new(
        source: Arc<dyn MarketDataSource>,
        history: Arc<dyn HistoryStore>,
        cache: CacheManager,
        config: AnalysisConfig,
    ) -> Self {
        Self {
            source,
            history,
            cache,
            config,
        }
    }

    /// 투자자 매매 동향을 조회하고 분석합니다.
    ///
    /// 항상 응답 봉투를 돌려주며, 실패는 `success: false` 봉투로 표현됩니다.
    #[instrument(skip(self, request), fields(stock_code = ?request.stock_code, period = %request.period))]
    pub async fn get_investor_trading(&self, request: InvestorTradingRequest) -> Value {
        match self.execute(&request).await {
            Ok(envelope) => envelope,
            Err(e) => {
                error!(error = %e, kind = e.kind(), "get_investor_trading failed");
                envelope::failure(&e)
            }
        }
    }

    async fn execute(&self, request: &InvestorTradingRequest) -> FlowResult<Value> {
        let query = request.validate()?;

        if query.period.is_concrete() {
            self.period_envelope(&query, query.period).await
        } else {
            self.multi_period(&query).await
        }
    }

    /// 구체 기간 하나의 응답 봉투. 캐시를 먼저 확인하고 결과를 기록합니다.
    async fn period_envelope(&self, query: &InvestorQuery, period: Period) -> FlowResult<Value> {
        let (key, ttl) = self.cache_slot(query, period);
        if let Some(cached) = self.cached_envelope(&key, ttl).await {
            return Ok(envelope::mark_cached(cached));
        }

        let snapshot = self.fetch_snapshot(query).await?;
        self.analyze_and_store(query, period, snapshot.as_ref(), &key, ttl).await
    }

    /// 네 구체 기간을 동시에 분석합니다. 실패한 기간은 로그만 남기고 제외합니다.
    ///
    /// 캐시에 없는 기간이 있을 때만 현재 매매 동향을 한 번 조회해 함께 씁니다.
    async fn multi_period(&self, query: &InvestorQuery) -> FlowResult<Value> {
        let lookups = Period::CONCRETE.into_iter().map(|period| async move {
            let (key, ttl) = self.cache_slot(query, period);
            let cached = self.cached_envelope(&key, ttl).await;
            (period, key, ttl, cached)
        });

        let mut per_period = Map::new();
        let mut pending = Vec::new();
        for (period, key, ttl, cached) in join_all(lookups).await {
            match cached {
                Some(envelope) => {
                    per_period.insert(period.as_str().to_string(), analysis_of(&envelope));
                }
                None => pending.push((period, key, ttl)),
            }
        }

        if !pending.is_empty() {
            match self.fetch_snapshot(query).await {
                Ok(snapshot) => {
                    let snapshot = snapshot.as_ref();
                    let tasks = pending.iter().map(|(period, key, ttl)| async move {
                        let result = self.analyze_and_store(query, *period, snapshot, key, *ttl).await;
                        (*period, result)
                    });

                    for (period, result) in join_all(tasks).await {
                        match result {
                            Ok(envelope) => {
                                per_period.insert(period.as_str().to_string(), analysis_of(&envelope));
                            }
                            Err(e) => error!(period = %period, error = %e, "Period analysis failed"),
                        }
                    }
                }
                Err(e) => error!(
                    periods = pending.len(),
                    error = %e,
                    "Current trading data unavailable, skipping uncached periods"
                ),
            }
        }

        Ok(envelope::success(json!({
            "stock_code": query.stock_code,
            "market": query.market,
            "investor_type": query.investor_type,
            "period": Period::All,
            "multi_period_analysis": per_period,
        })))
    }

    /// 기간별 캐시 키와 TTL(초). 캐시를 쓰지 않는 요청이면 TTL은 `None`.
    fn cache_slot(&self, query: &InvestorQuery, period: Period) -> (String, Option<u64>) {
        let key = investor_trading_key(
            query.stock_code.as_ref(),
            query.investor_type,
            period,
            query.market,
        );
        let ttl = self.cache.ttl().investor(period).filter(|_| query.use_cache);
        (key, ttl)
    }

    async fn cached_envelope(&self, key: &str, ttl: Option<u64>) -> Option<Value> {
        if ttl.is_none() {
            return None;
        }
        let cached = self.cache.get_json::<Value>(key).await?;
        info!(key = %key, "Cache hit for investor trading");
        Some(cached)
    }

    /// 현재 매매 동향 조회. 실패는 `DataUnavailable`.
    async fn fetch_snapshot(&self, query: &InvestorQuery) -> FlowResult<Option<InvestorSnapshot>> {
        self.source
            .current_snapshot(query.stock_code.as_ref(), query.market)
            .await
            .map_err(|e| {
                warn!(source = self.source.name(), error = %e, "Failed to fetch current trading data");
                FlowError::DataUnavailable(e.to_string())
            })
    }

    async fn analyze_and_store(
        &self,
        query: &InvestorQuery,
        period: Period,
        snapshot: Option<&InvestorSnapshot>,
        key: &str,
        ttl: Option<u64>,
    ) -> FlowResult<Value> {
        let envelope = envelope::success(self.analyze_period(query, period, snapshot).await?);
        if let Some(ttl) = ttl {
            self.cache.set_json(key, &envelope, ttl).await;
        }
        Ok(envelope)
    }

    async fn analyze_period(
        &self,
        query: &InvestorQuery,
        period: Period,
        snapshot: Option<&InvestorSnapshot>,
    ) -> FlowResult<Value> {
        let hours = period.history_hours().ok_or_else(|| {
            FlowError::Internal(format!("period {} has no history window", period))
        })?;

        let history = match self
            .history
            .flow_history(query.stock_code.as_ref(), query.market, hours)
            .await
        {
            Ok(history) => history,
            Err(e) => {
                warn!(error = %e, "Failed to load flow history, continuing without it");
                Vec::new()
            }
        };
        debug!(history = history.len(), has_snapshot = snapshot.is_some(), "Loaded trading data");

        let mut payload = Map::new();
        payload.insert("stock_code".to_string(), serde_json::to_value(&query.stock_code)?);
        payload.insert("market".to_string(), serde_json::to_value(query.market)?);
        payload.insert("period".to_string(), serde_json::to_value(period)?);
        payload.insert("investor_type".to_string(), serde_json::to_value(query.investor_type)?);

        match &query.stock_code {
            Some(_) => {
                payload.insert("current_data".to_string(), serde_json::to_value(snapshot)?);
                if let (true, Some(current)) = (query.include_analysis, snapshot) {
                    let analysis = StockAnalysis::compute(current, &history, &self.config);
                    payload.insert("analysis".to_string(), analysis.view(query.investor_type)?);
                }
            }
            None => {
                let current = snapshot
                    .cloned()
                    .unwrap_or_else(|| InvestorSnapshot::empty(Utc::now()));
                payload.insert(
                    "market_overview".to_string(),
                    serde_json::to_value(market_overview(&current))?,
                );
                if let (true, Some(current)) = (query.include_analysis, snapshot) {
                    let analysis = MarketAnalysis::compute(current, &history, &self.config);
                    payload.insert("analysis".to_string(), serde_json::to_value(analysis)?);
                }
            }
        }

        payload.insert("historical_data".to_string(), serde_json::to_value(&history)?);
        Ok(Value::Object(payload))
    }
}
