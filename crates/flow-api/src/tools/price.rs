//! 가격-수급 분석 도구.
//!
//! 한 종목의 가격 이력과 투자자 수급 이력을 가져와 상관관계를 계산하고,
//! 종합 분석에서는 가격 영향도, 예측, 타이밍, 이상 패턴, 스마트 머니 지표를 더합니다.

use std::sync::Arc;

use flow_analytics::{CorrelationEngine, PriceAnalyzer};
use flow_core::{
    AnalysisConfig, FlowError, FlowResult, FlowSample, Market, Period, PricePoint, StockCode,
};
use flow_data::{price_correlation_key, CacheManager, HistoryStore};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, error, info, instrument, warn};

use super::{merge_object, required_stock_code};
use crate::envelope;

/// 가격 분석 요청 파라미터.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PriceAnalysisRequest {
    pub stock_code: String,
    pub period: String,
    pub use_cache: bool,
}

impl Default for PriceAnalysisRequest {
    fn default() -> Self {
        Self {
            stock_code: String::new(),
            period: Period::D1.as_str().to_string(),
            use_cache: true,
        }
    }
}

impl PriceAnalysisRequest {
    pub fn new(stock_code: impl Into<String>, period: Period) -> Self {
        Self {
            stock_code: stock_code.into(),
            period: period.as_str().to_string(),
            use_cache: true,
        }
    }

    pub fn without_cache(mut self) -> Self {
        self.use_cache = false;
        self
    }

    fn validate(&self) -> FlowResult<(StockCode, Period)> {
        let stock_code = required_stock_code(&self.stock_code)?;
        let period: Period = self.period.parse()?;
        if !period.is_concrete() {
            return Err(FlowError::validation(
                "period",
                "price analysis requires one of 1D, 5D, 20D, 60D",
            ));
        }
        Ok((stock_code, period))
    }
}

/// 한 종목의 가격/수급 시계열.
struct Series {
    prices: Vec<PricePoint>,
    flows: Vec<FlowSample>,
}

/// 가격-수급 분석 도구.
#[derive(Clone)]
pub struct PriceAnalysisTool {
    history: Arc<dyn HistoryStore>,
    cache: CacheManager,
    config: AnalysisConfig,
}

impl PriceAnalysisTool {
    pub fn new(history: Arc<dyn HistoryStore>, cache: CacheManager, config: AnalysisConfig) -> Self {
        Self {
            history,
            cache,
            config,
        }
    }

    /// 가격과 투자자 수급의 상관관계를 계산합니다. 결과는 기간별 TTL로 캐시됩니다.
    #[instrument(skip(self, request), fields(stock_code = %request.stock_code, period = %request.period))]
    pub async fn calculate_price_correlation(&self, request: PriceAnalysisRequest) -> Value {
        match self.correlation_envelope(&request).await {
            Ok(envelope) => envelope,
            Err(e) => {
                error!(error = %e, kind = e.kind(), "calculate_price_correlation failed");
                envelope::failure(&e)
            }
        }
    }

    /// 상관관계와 가격 영향도, 예측, 타이밍, 이상 패턴, 스마트 머니 지표를 묶은 보고서.
    #[instrument(skip(self, request), fields(stock_code = %request.stock_code, period = %request.period))]
    pub async fn generate_comprehensive_analysis(&self, request: PriceAnalysisRequest) -> Value {
        match self.comprehensive_envelope(&request).await {
            Ok(envelope) => envelope,
            Err(e) => {
                error!(error = %e, kind = e.kind(), "generate_comprehensive_analysis failed");
                envelope::failure(&e)
            }
        }
    }

    async fn correlation_envelope(&self, request: &PriceAnalysisRequest) -> FlowResult<Value> {
        let (stock_code, period) = request.validate()?;
        let key = price_correlation_key(&stock_code, period);
        let ttl = self.cache.ttl().price(period).filter(|_| request.use_cache);

        if ttl.is_some() {
            if let Some(cached) = self.cache.get_json::<Value>(&key).await {
                info!(key = %key, "Cache hit for price correlation");
                return Ok(envelope::mark_cached(cached));
            }
        }

        let series = self.load_series(&stock_code, period).await?;
        let correlation =
            CorrelationEngine::from_config(&self.config).analyze(&series.prices, &series.flows)?;

        let mut payload = header(&stock_code, period, &series);
        payload.insert(
            "correlation_analysis".to_string(),
            serde_json::to_value(&correlation)?,
        );
        let envelope = envelope::success(Value::Object(payload));

        if let Some(ttl) = ttl {
            self.cache.set_json(&key, &envelope, ttl).await;
        }
        Ok(envelope)
    }

    async fn comprehensive_envelope(&self, request: &PriceAnalysisRequest) -> FlowResult<Value> {
        let (stock_code, period) = request.validate()?;

        let series = self.load_series(&stock_code, period).await?;
        let correlation =
            CorrelationEngine::from_config(&self.config).analyze(&series.prices, &series.flows)?;
        let analysis = PriceAnalyzer::new(self.config.clone()).comprehensive(
            &series.prices,
            &series.flows,
            &correlation,
        );

        let mut payload = header(&stock_code, period, &series);
        payload.insert(
            "correlation_analysis".to_string(),
            serde_json::to_value(&correlation)?,
        );
        merge_object(&mut payload, serde_json::to_value(&analysis)?);
        Ok(envelope::success(Value::Object(payload)))
    }

    /// 가격과 수급 이력을 함께 가져옵니다.
    ///
    /// 어느 쪽이든 `min_data_points`보다 적으면 `InsufficientData`.
    async fn load_series(&self, stock_code: &StockCode, period: Period) -> FlowResult<Series> {
        let hours = period.history_hours().ok_or_else(|| {
            FlowError::Internal(format!("period {} has no history window", period))
        })?;

        let (prices, flows) = tokio::try_join!(
            self.history.price_history(stock_code, hours),
            self.history.flow_history(Some(stock_code), Market::All, hours),
        )
        .map_err(|e| {
            warn!(error = %e, "Failed to load price/flow history");
            FlowError::DataUnavailable(e.to_string())
        })?;
        debug!(prices = prices.len(), flows = flows.len(), "Loaded price and flow history");

        let required = self.config.min_data_points;
        let actual = prices.len().min(flows.len());
        if actual < required {
            return Err(FlowError::insufficient(
                required,
                actual,
                format!("price/flow history for {}", stock_code),
            ));
        }

        Ok(Series { prices, flows })
    }
}

fn header(stock_code: &StockCode, period: Period, series: &Series) -> Map<String, Value> {
    let mut payload = Map::new();
    payload.insert("stock_code".to_string(), Value::from(stock_code.as_str()));
    payload.insert("period".to_string(), Value::from(period.as_str()));
    payload.insert("data_points".to_string(), Value::from(series.prices.len()));
    payload
}
