//! 가격 중심 종합 분석.
//!
//! 상관관계 분석 결과 위에 가격 영향도, 방향 예측, 시간대별 타이밍,
//! 스마트 머니 지표, 거래량-가격 관계, 이상 패턴, 요약을 더합니다.

use std::collections::BTreeMap;

use chrono::{Duration, Timelike};
use chrono_tz::Asia::Seoul;
use flow_core::{AnalysisConfig, FlowSample, PricePoint};
use serde::{Deserialize, Serialize};

use crate::anomaly::{AnomalyDetector, AnomalyReport};
use crate::correlation::{lead_lag, price_change_pairs, CorrelationAnalysis, Leader};
use crate::stats::{align, mean, pearson_or_zero, stdev};

/// 가격/수급 방향.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MoveDirection {
    Up,
    Down,
    Neutral,
}

impl MoveDirection {
    fn of(value: f64) -> Self {
        if value > 0.0 {
            MoveDirection::Up
        } else if value < 0.0 {
            MoveDirection::Down
        } else {
            MoveDirection::Neutral
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Consistency {
    Consistent,
    Inconsistent,
}

/// 직전 대비 가격 변화와 스마트 머니의 관계.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceImpact {
    pub price_change: f64,
    pub price_change_percent: f64,
    /// 0 ~ 10
    pub impact_intensity: f64,
    pub directional_consistency: Consistency,
    pub predicted_direction: MoveDirection,
    pub smart_money_flow: i64,
}

/// 예측 방향.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Outlook {
    Bullish,
    Bearish,
    Neutral,
}

impl Outlook {
    fn as_str(&self) -> &'static str {
        match self {
            Outlook::Bullish => "bullish",
            Outlook::Bearish => "bearish",
            Outlook::Neutral => "neutral",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Momentum {
    Strong,
    Moderate,
    Weak,
}

/// 지지/저항 수준. 가격이 5개 미만이면 모두 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SupportResistance {
    pub support: f64,
    pub resistance: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_level: Option<f64>,
}

/// 가격 방향 예측.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub predicted_direction: Outlook,
    /// 0 ~ 1
    pub confidence_score: f64,
    pub momentum_indicator: Momentum,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub support_resistance: Option<SupportResistance>,
    pub correlation_strength: f64,
}

impl Prediction {
    fn neutral() -> Self {
        Self {
            predicted_direction: Outlook::Neutral,
            confidence_score: 0.0,
            momentum_indicator: Momentum::Weak,
            support_resistance: None,
            correlation_strength: 0.0,
        }
    }
}

/// 한 구간의 시간대, 외국인 순매수, 가격 변화율(%).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimingPattern {
    pub hour: u32,
    pub foreign_net: i64,
    pub price_change: f64,
}

/// 시간대별 수급-가격 일치 효율.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingAnalysis {
    pub optimal_trading_hours: Vec<u32>,
    pub timing_efficiency: f64,
    pub pattern_strength: Momentum,
    pub hour_analysis: BTreeMap<u32, f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Leadership {
    Leading,
    Lagging,
    Coincident,
}

/// 스마트 머니의 가격 방향 적중률 기반 지표.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmartMoneyIndicator {
    /// 0 ~ 100
    pub smart_money_index: f64,
    pub accuracy_rate: f64,
    pub signal_strength: f64,
    pub market_leadership: Leadership,
    pub correlation: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrendConfirmation {
    Confirmed,
    Weak,
    NotConfirmed,
}

/// 거래량과 가격의 관계.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumePriceRelationship {
    pub volume_price_correlation: f64,
    pub trend_confirmation: TrendConfirmation,
    /// 가격과 거래량 변화 방향이 엇갈린 구간 인덱스
    pub divergence_signals: Vec<usize>,
    pub confirmation_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Quality {
    High,
    Moderate,
    Low,
}

/// 종합 분석 요약.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub key_insights: Vec<String>,
    pub recommendation: String,
    pub overall_sentiment: Outlook,
    pub confidence_level: f64,
    pub analysis_quality: Quality,
}

/// 종합 분석 결과. 데이터가 부족한 항목은 `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComprehensiveAnalysis {
    pub price_impact_analysis: Option<PriceImpact>,
    pub prediction_analysis: Option<Prediction>,
    pub timing_analysis: Option<TimingAnalysis>,
    pub anomaly_detection: AnomalyReport,
    pub smart_money_indicator: Option<SmartMoneyIndicator>,
    pub volume_price_relationship: Option<VolumePriceRelationship>,
    pub summary: AnalysisSummary,
}

/// 가격 분석기.
#[derive(Debug, Clone)]
pub struct PriceAnalyzer {
    config: AnalysisConfig,
}

impl PriceAnalyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    /// 가격/수급 이력(오래된 것 → 최신)과 상관관계 결과로 종합 분석을 만듭니다.
    pub fn comprehensive(
        &self,
        prices: &[PricePoint],
        flows: &[FlowSample],
        correlation: &CorrelationAnalysis,
    ) -> ComprehensiveAnalysis {
        let closes: Vec<f64> = prices.iter().map(|p| p.close_price).collect();
        let latest_flow = flows.last();

        let price_impact_analysis = match (prices.len() >= 2, latest_flow) {
            (true, Some(current)) => Some(self.price_impact(
                closes[closes.len() - 2],
                closes[closes.len() - 1],
                current,
            )),
            _ => None,
        };

        let prediction_analysis = match latest_flow {
            Some(current) if prices.len() >= 3 && flows.len() >= 3 => {
                let smart_flows: Vec<f64> =
                    flows.iter().map(|f| f.smart_money_net() as f64).collect();
                Some(self.predict(&closes, &smart_flows, current.smart_money_net() as f64))
            }
            _ => None,
        };

        let timing_analysis = (prices.len() >= 3 && flows.len() >= 3)
            .then(|| market_timing(&timing_patterns(prices, flows)));

        let anomaly_detection = AnomalyDetector::from_config(&self.config).detect_series(prices, flows);

        let smart_money_indicator = (prices.len() >= 3 && flows.len() >= 3).then(|| {
            let tolerance = Duration::seconds(self.config.alignment_tolerance_secs);
            let pairs = price_change_pairs(&align(prices, flows, tolerance));
            let changes: Vec<f64> = pairs.iter().map(|(c, _)| *c).collect();
            let smart: Vec<f64> = pairs.iter().map(|(_, p)| p.smart_money_net() as f64).collect();
            self.smart_money_indicator(&changes, &smart)
        });

        let volumes: Option<Vec<f64>> = prices.iter().map(|p| p.volume.map(|v| v as f64)).collect();
        let volume_price_relationship =
            volumes.and_then(|v| volume_price_relationship(&closes, &v));

        let summary = summarize(
            correlation,
            price_impact_analysis.as_ref(),
            prediction_analysis.as_ref(),
            &anomaly_detection,
        );

        ComprehensiveAnalysis {
            price_impact_analysis,
            prediction_analysis,
            timing_analysis,
            anomaly_detection,
            smart_money_indicator,
            volume_price_relationship,
            summary,
        }
    }

    /// 직전 대비 가격 변화와 현재 스마트 머니의 방향 일치 여부.
    pub fn price_impact(&self, previous_price: f64, current_price: f64, current: &FlowSample) -> PriceImpact {
        let threshold = self.config.smart_money_threshold;
        let change = current_price - previous_price;
        let change_pct = if previous_price != 0.0 {
            change / previous_price * 100.0
        } else {
            0.0
        };
        let smart_money = current.smart_money_net();
        let flow = smart_money as f64;

        let consistent = MoveDirection::of(change) == MoveDirection::of(flow);
        let predicted_direction = if flow.abs() > threshold {
            MoveDirection::of(flow)
        } else {
            MoveDirection::Neutral
        };

        PriceImpact {
            price_change: change,
            price_change_percent: change_pct,
            impact_intensity: (flow.abs() / threshold * 5.0).min(10.0),
            directional_consistency: if consistent {
                Consistency::Consistent
            } else {
                Consistency::Inconsistent
            },
            predicted_direction,
            smart_money_flow: smart_money,
        }
    }

    /// 가격 변화와 스마트 머니의 상관계수, 현재 스마트 머니로 방향을 예측합니다.
    ///
    /// `smart_flows[i]`는 `prices[i]` 시점의 값이어야 합니다. 신뢰도가
    /// `pattern_confidence_threshold` 미만이면 방향은 `NEUTRAL`입니다.
    pub fn predict(&self, prices: &[f64], smart_flows: &[f64], current_smart: f64) -> Prediction {
        if prices.len() < 3 {
            return Prediction::neutral();
        }

        let threshold = self.config.smart_money_threshold;
        let deltas: Vec<f64> = prices.windows(2).map(|w| w[1] - w[0]).collect();
        let corr = pearson_or_zero(&deltas, smart_flows.get(1..).unwrap_or_default());

        let confidence_score = (corr.abs() * (current_smart.abs() / threshold)).min(1.0);
        let confident = confidence_score >= self.config.pattern_confidence_threshold;

        let predicted_direction = if confident && corr.abs() > 0.5 && current_smart.abs() > threshold {
            if (corr > 0.0) == (current_smart > 0.0) {
                Outlook::Bullish
            } else {
                Outlook::Bearish
            }
        } else {
            Outlook::Neutral
        };

        let recent = if deltas.len() >= 3 {
            mean(&deltas[deltas.len() - 3..]).unwrap_or(0.0)
        } else {
            0.0
        };
        let momentum_indicator = match stdev(&deltas) {
            Ok(sd) if recent.abs() > sd => Momentum::Strong,
            Ok(sd) if recent.abs() > sd * 0.5 => Momentum::Moderate,
            _ => Momentum::Weak,
        };

        Prediction {
            predicted_direction,
            confidence_score,
            momentum_indicator,
            support_resistance: Some(support_resistance(prices)),
            correlation_strength: corr.abs(),
        }
    }

    /// `large_order_threshold`를 넘는 구간에서 스마트 머니 방향이 가격 방향과 맞은 비율.
    pub fn smart_money_indicator(&self, price_changes: &[f64], smart_flows: &[f64]) -> SmartMoneyIndicator {
        if price_changes.len() != smart_flows.len() || price_changes.len() < 3 {
            return SmartMoneyIndicator {
                smart_money_index: 50.0,
                accuracy_rate: 0.0,
                signal_strength: 1.0,
                market_leadership: Leadership::Coincident,
                correlation: 0.0,
            };
        }

        let threshold = self.config.smart_money_threshold;
        let cutoff = self.config.large_order_threshold;
        let (mut correct, mut total) = (0usize, 0usize);
        for (&change, &flow) in price_changes.iter().zip(smart_flows) {
            if flow.abs() > cutoff {
                total += 1;
                if (change > 0.0 && flow > 0.0) || (change < 0.0 && flow < 0.0) {
                    correct += 1;
                }
            }
        }
        let accuracy = if total > 0 {
            correct as f64 / total as f64
        } else {
            0.0
        };

        let correlation = pearson_or_zero(price_changes, smart_flows).abs();
        let avg_flow = smart_flows.iter().map(|f| f.abs()).sum::<f64>() / smart_flows.len() as f64;

        let market_leadership = match lead_lag(price_changes, smart_flows).leader {
            Leader::SmartMoney => Leadership::Leading,
            Leader::Price => Leadership::Lagging,
            Leader::Coincident => Leadership::Coincident,
        };

        SmartMoneyIndicator {
            smart_money_index: correlation * accuracy * 100.0,
            accuracy_rate: accuracy,
            signal_strength: (avg_flow / threshold * 5.0).min(10.0),
            market_leadership,
            correlation,
        }
    }
}

/// 최근 최대 10개 가격의 최저/최고.
pub fn support_resistance(prices: &[f64]) -> SupportResistance {
    if prices.len() < 5 {
        return SupportResistance {
            support: 0.0,
            resistance: 0.0,
            current_level: None,
        };
    }
    let recent = &prices[prices.len().saturating_sub(10)..];
    SupportResistance {
        support: recent.iter().copied().fold(f64::INFINITY, f64::min),
        resistance: recent.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        current_level: prices.last().copied(),
    }
}

/// 같은 인덱스의 가격과 수급을 짝지어 구간별 패턴을 만듭니다.
///
/// 시간대는 가격 시각의 한국 시간 기준입니다.
pub fn timing_patterns(prices: &[PricePoint], flows: &[FlowSample]) -> Vec<TimingPattern> {
    prices
        .windows(2)
        .zip(flows.iter().skip(1))
        .map(|(w, flow)| {
            let (prev, curr) = (w[0].close_price, w[1].close_price);
            TimingPattern {
                hour: w[1].timestamp.with_timezone(&Seoul).hour(),
                foreign_net: flow.foreign_net,
                price_change: if prev > 0.0 {
                    (curr - prev) / prev * 100.0
                } else {
                    0.0
                },
            }
        })
        .collect()
}

/// 시간대별 효율 = |가격 변화율| × (외국인 순매수와 방향이 같으면 +1, 아니면 -1).
pub fn market_timing(patterns: &[TimingPattern]) -> TimingAnalysis {
    if patterns.len() < 3 {
        return TimingAnalysis {
            optimal_trading_hours: Vec::new(),
            timing_efficiency: 0.0,
            pattern_strength: Momentum::Weak,
            hour_analysis: BTreeMap::new(),
        };
    }

    let mut by_hour: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
    let mut all = Vec::with_capacity(patterns.len());
    for p in patterns {
        let sign = if p.foreign_net as f64 * p.price_change > 0.0 {
            1.0
        } else {
            -1.0
        };
        let efficiency = p.price_change.abs() * sign;
        by_hour.entry(p.hour).or_default().push(efficiency);
        all.push(efficiency);
    }

    let hour_analysis: BTreeMap<u32, f64> = by_hour
        .iter()
        .map(|(hour, effs)| (*hour, effs.iter().sum::<f64>() / effs.len() as f64))
        .collect();

    let mut ranked: Vec<(u32, f64)> = hour_analysis.iter().map(|(h, e)| (*h, *e)).collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    let optimal_trading_hours = ranked
        .into_iter()
        .take(3)
        .filter(|(_, e)| *e > 0.0)
        .map(|(h, _)| h)
        .collect();

    let timing_efficiency = (all.iter().sum::<f64>() / all.len() as f64).max(0.0);
    let pattern_strength = if timing_efficiency > 1.0 {
        Momentum::Strong
    } else if timing_efficiency > 0.5 {
        Momentum::Moderate
    } else {
        Momentum::Weak
    };

    TimingAnalysis {
        optimal_trading_hours,
        timing_efficiency,
        pattern_strength,
        hour_analysis,
    }
}

/// 거래량-가격 상관계수와 추세 확인율.
///
/// 길이가 다르거나 2개 미만이면 `None`.
pub fn volume_price_relationship(prices: &[f64], volumes: &[f64]) -> Option<VolumePriceRelationship> {
    if prices.len() != volumes.len() || prices.len() < 2 {
        return None;
    }

    let price_changes: Vec<f64> = prices.windows(2).map(|w| w[1] - w[0]).collect();
    let volume_changes: Vec<f64> = volumes.windows(2).map(|w| w[1] - w[0]).collect();

    let up_prices = price_changes.iter().filter(|&&c| c > 0.0).count();
    let up_volumes = volume_changes.iter().filter(|&&c| c > 0.0).count();
    let rate = up_prices.min(up_volumes) as f64 / price_changes.len() as f64;

    let trend_confirmation = if rate > 0.7 {
        TrendConfirmation::Confirmed
    } else if rate > 0.4 {
        TrendConfirmation::Weak
    } else {
        TrendConfirmation::NotConfirmed
    };

    let divergence_signals = price_changes
        .iter()
        .zip(&volume_changes)
        .enumerate()
        .filter(|(_, (p, v))| (**p > 0.0 && **v < 0.0) || (**p < 0.0 && **v > 0.0))
        .map(|(i, _)| i)
        .collect();

    Some(VolumePriceRelationship {
        volume_price_correlation: pearson_or_zero(prices, volumes),
        trend_confirmation,
        divergence_signals,
        confirmation_rate: rate,
    })
}

/// 주요 인사이트와 권고를 정리합니다.
pub fn summarize(
    correlation: &CorrelationAnalysis,
    impact: Option<&PriceImpact>,
    prediction: Option<&Prediction>,
    anomalies: &AnomalyReport,
) -> AnalysisSummary {
    let mut insights = Vec::new();

    let smart_corr = correlation.correlations.smart_money_correlation;
    if smart_corr.abs() > 0.7 {
        insights.push(format!(
            "Strong correlation ({:.2}) between smart money flow and price movement",
            smart_corr
        ));
    }

    if impact.is_some_and(|i| i.directional_consistency == Consistency::Consistent) {
        insights.push("Price movement aligns with smart money flow direction".to_string());
    }

    let direction = prediction.map_or(Outlook::Neutral, |p| p.predicted_direction);
    let confidence = prediction.map_or(0.0, |p| p.confidence_score);
    if confidence > 0.7 {
        insights.push(format!(
            "High confidence {} prediction ({:.1}%)",
            direction.as_str(),
            confidence * 100.0
        ));
    }

    if anomalies.anomaly_detected {
        insights.push(format!(
            "Anomaly detected: {}",
            anomalies.anomaly_type.as_str()
        ));
    }

    let recommendation = match direction {
        Outlook::Bullish if confidence > 0.6 => "POSITIVE: Strong upward signals detected",
        Outlook::Bearish if confidence > 0.6 => "NEGATIVE: Strong downward signals detected",
        _ if anomalies.anomaly_detected => "CAUTION: Unusual patterns require careful monitoring",
        _ => "NEUTRAL: Mixed or weak signals",
    };

    let analysis_quality = match insights.len() {
        0 => Quality::Low,
        1 => Quality::Moderate,
        _ => Quality::High,
    };

    AnalysisSummary {
        key_insights: insights,
        recommendation: recommendation.to_string(),
        overall_sentiment: direction,
        confidence_level: confidence,
        analysis_quality,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anomaly::AnomalyKind;
    use crate::correlation::{CorrelationStrengths, GroupCorrelations, LeadLag, Significance};
    use chrono::{DateTime, TimeZone, Utc};

    fn analyzer() -> PriceAnalyzer {
        PriceAnalyzer::new(AnalysisConfig::default())
    }

    fn ts(hour: i64) -> DateTime<Utc> {
        // 2024-03-04 09:00 KST
        Utc.with_ymd_and_hms(2024, 3, 4, 0, 0, 0).unwrap() + Duration::hours(hour)
    }

    fn correlation_with(smart: f64) -> CorrelationAnalysis {
        let correlations = GroupCorrelations {
            foreign_correlation: smart,
            institution_correlation: smart,
            individual_correlation: -smart,
            smart_money_correlation: smart,
        };
        CorrelationAnalysis {
            correlation_strength: CorrelationStrengths::from(&correlations),
            correlations,
            lead_lag_analysis: LeadLag {
                leader: Leader::Coincident,
                lag_periods: 0,
                max_correlation: smart.abs(),
            },
            statistical_significance: Significance {
                significant: false,
                p_value: 1.0,
                confidence_level: 0.0,
                t_statistic: Some(0.0),
            },
            aligned_points: 5,
        }
    }

    #[test]
    fn test_price_impact_consistent_up() {
        let current = FlowSample::new(ts(0), 3_000_000_000, 0, 0);
        let impact = analyzer().price_impact(100.0, 102.0, &current);
        assert_eq!(impact.price_change, 2.0);
        assert!((impact.price_change_percent - 2.0).abs() < 1e-9);
        assert_eq!(impact.impact_intensity, 10.0);
        assert_eq!(impact.directional_consistency, Consistency::Consistent);
        assert_eq!(impact.predicted_direction, MoveDirection::Up);
    }

    #[test]
    fn test_price_impact_small_flow_is_neutral() {
        let current = FlowSample::new(ts(0), -400_000_000, 0, 0);
        let impact = analyzer().price_impact(0.0, 5.0, &current);
        assert_eq!(impact.price_change_percent, 0.0);
        assert!((impact.impact_intensity - 2.0).abs() < 1e-9);
        assert_eq!(impact.directional_consistency, Consistency::Inconsistent);
        assert_eq!(impact.predicted_direction, MoveDirection::Neutral);
    }

    #[test]
    fn test_predict_bullish_with_positive_correlation() {
        let prices = [100.0, 101.0, 103.0, 106.0, 110.0, 115.0];
        let flows = [0.0, 1e9, 2e9, 3e9, 4e9, 5e9];
        let prediction = analyzer().predict(&prices, &flows, 5e9);
        assert_eq!(prediction.predicted_direction, Outlook::Bullish);
        assert_eq!(prediction.confidence_score, 1.0);
        assert_eq!(prediction.momentum_indicator, Momentum::Strong);
        let levels = prediction.support_resistance.unwrap();
        assert_eq!(levels.support, 100.0);
        assert_eq!(levels.resistance, 115.0);
        assert_eq!(levels.current_level, Some(115.0));
    }

    #[test]
    fn test_predict_inverse_correlation_flips_direction() {
        let prices = [100.0, 99.0, 97.0, 94.0, 90.0];
        let flows = [0.0, 1e9, 2e9, 3e9, 4e9];
        let prediction = analyzer().predict(&prices, &flows, 4e9);
        assert_eq!(prediction.predicted_direction, Outlook::Bearish);
    }

    #[test]
    fn test_predict_low_confidence_stays_neutral() {
        let prices = [100.0, 101.0, 103.0, 106.0, 110.0, 115.0];
        let flows = [0.0, 1e9, 2e9, 3e9, 4e9, 5e9];
        // 상관계수 ≈ 1, 현재 12억 → 신뢰도 1.0
        let confident = analyzer().predict(&prices, &flows, 1.2e9);
        assert_eq!(confident.predicted_direction, Outlook::Bullish);

        // 상관계수 ≈ 0.63, 현재 11억 → 신뢰도 ≈ 0.69
        let weak_prices = [100.0, 102.0, 101.0, 106.0, 107.0, 115.0];

        let lenient = PriceAnalyzer::new(AnalysisConfig {
            pattern_confidence_threshold: 0.5,
            ..AnalysisConfig::default()
        });
        let prediction = lenient.predict(&weak_prices, &flows, 1.1e9);
        assert_eq!(prediction.predicted_direction, Outlook::Bullish);

        let prediction = analyzer().predict(&weak_prices, &flows, 1.1e9);
        assert!((prediction.confidence_score - 0.689).abs() < 1e-3);
        assert_eq!(prediction.predicted_direction, Outlook::Neutral);
        assert!(prediction.correlation_strength > 0.5);
    }

    #[test]
    fn test_predict_short_series() {
        let prediction = analyzer().predict(&[1.0, 2.0], &[1.0, 2.0], 1e12);
        assert_eq!(prediction.predicted_direction, Outlook::Neutral);
        assert_eq!(prediction.confidence_score, 0.0);
        assert_eq!(prediction.momentum_indicator, Momentum::Weak);
    }

    #[test]
    fn test_support_resistance_window() {
        assert_eq!(support_resistance(&[1.0, 2.0, 3.0, 4.0]).support, 0.0);
        let prices: Vec<f64> = (1..=12).map(|p| p as f64).collect();
        let levels = support_resistance(&prices);
        assert_eq!(levels.support, 3.0);
        assert_eq!(levels.resistance, 12.0);
    }

    #[test]
    fn test_market_timing() {
        let patterns = [
            TimingPattern { hour: 9, foreign_net: 10, price_change: 2.0 },
            TimingPattern { hour: 9, foreign_net: 10, price_change: 1.0 },
            TimingPattern { hour: 10, foreign_net: -10, price_change: 1.0 },
            TimingPattern { hour: 11, foreign_net: -10, price_change: -0.5 },
        ];
        let timing = market_timing(&patterns);
        assert_eq!(timing.hour_analysis[&9], 1.5);
        assert_eq!(timing.hour_analysis[&10], -1.0);
        assert_eq!(timing.optimal_trading_hours, vec![9, 11]);
        // (2 + 1 - 1 + 0.5) / 4
        assert!((timing.timing_efficiency - 0.625).abs() < 1e-12);
        assert_eq!(timing.pattern_strength, Momentum::Moderate);
    }

    #[test]
    fn test_market_timing_needs_three_patterns() {
        let timing = market_timing(&[]);
        assert!(timing.optimal_trading_hours.is_empty());
        assert_eq!(timing.pattern_strength, Momentum::Weak);
    }

    #[test]
    fn test_timing_patterns_use_seoul_hour() {
        let prices = [PricePoint::new(ts(0), 100.0), PricePoint::new(ts(1), 101.0)];
        let flows = [FlowSample::new(ts(0), 1, 0, 0), FlowSample::new(ts(1), 2, 0, 0)];
        let patterns = timing_patterns(&prices, &flows);
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].hour, 10);
        assert_eq!(patterns[0].foreign_net, 2);
        assert!((patterns[0].price_change - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_smart_money_indicator() {
        let changes = [1.0, -1.0, 2.0, -0.5];
        let flows = [2e9, -1e9, 3e9, 5e7];
        let indicator = analyzer().smart_money_indicator(&changes, &flows);
        // 마지막 구간은 대량 주문 기준 이하라 제외
        assert_eq!(indicator.accuracy_rate, 1.0);
        assert!(indicator.correlation > 0.8);
        assert!((indicator.smart_money_index - indicator.correlation * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_smart_money_indicator_honors_large_order_threshold() {
        let changes = [1.0, -1.0, 2.0, 1.0];
        let flows = [2e9, -1e9, 3e9, -8e8];

        // 기본 5억: -8억 구간도 집계되어 4개 중 3개 적중
        let indicator = analyzer().smart_money_indicator(&changes, &flows);
        assert_eq!(indicator.accuracy_rate, 0.75);

        let strict = PriceAnalyzer::new(AnalysisConfig {
            large_order_threshold: 1e9,
            ..AnalysisConfig::default()
        });
        // 10억 초과만 집계: 2e9, 3e9 두 구간 모두 적중
        let indicator = strict.smart_money_indicator(&changes, &flows);
        assert_eq!(indicator.accuracy_rate, 1.0);
    }

    #[test]
    fn test_smart_money_indicator_defaults() {
        let indicator = analyzer().smart_money_indicator(&[1.0, 2.0], &[1.0]);
        assert_eq!(indicator.smart_money_index, 50.0);
        assert_eq!(indicator.signal_strength, 1.0);
        assert_eq!(indicator.market_leadership, Leadership::Coincident);
    }

    #[test]
    fn test_volume_price_relationship() {
        let prices = [10.0, 11.0, 12.0, 11.0, 13.0];
        let volumes = [100.0, 120.0, 110.0, 130.0, 150.0];
        let rel = volume_price_relationship(&prices, &volumes).unwrap();
        assert_eq!(rel.divergence_signals, vec![1, 2]);
        // min(3 up prices, 3 up volumes) / 4
        assert_eq!(rel.confirmation_rate, 0.75);
        assert_eq!(rel.trend_confirmation, TrendConfirmation::Confirmed);
        assert!(volume_price_relationship(&prices, &volumes[..3]).is_none());
    }

    #[test]
    fn test_summary_quality_and_recommendation() {
        let prediction = Prediction {
            predicted_direction: Outlook::Bullish,
            confidence_score: 0.8,
            momentum_indicator: Momentum::Strong,
            support_resistance: None,
            correlation_strength: 0.9,
        };
        let summary = summarize(
            &correlation_with(0.9),
            None,
            Some(&prediction),
            &AnomalyReport::none(),
        );
        assert_eq!(summary.key_insights.len(), 2);
        assert_eq!(summary.key_insights[1], "High confidence bullish prediction (80.0%)");
        assert!(summary.recommendation.starts_with("POSITIVE"));
        assert_eq!(summary.analysis_quality, Quality::High);
    }

    #[test]
    fn test_summary_caution_on_anomaly() {
        let mut anomalies = AnomalyReport::none();
        anomalies.anomaly_detected = true;
        anomalies.anomaly_type = AnomalyKind::FlowSpike;

        let summary = summarize(&correlation_with(0.1), None, None, &anomalies);
        assert_eq!(summary.key_insights, vec!["Anomaly detected: FLOW_SPIKE".to_string()]);
        assert!(summary.recommendation.starts_with("CAUTION"));
        assert_eq!(summary.overall_sentiment, Outlook::Neutral);
        assert_eq!(summary.analysis_quality, Quality::Moderate);
    }

    #[test]
    fn test_comprehensive_handles_short_input() {
        let prices = [PricePoint::new(ts(0), 100.0)];
        let flows = [FlowSample::new(ts(0), 1, 1, 1)];
        let analysis = analyzer().comprehensive(&prices, &flows, &correlation_with(0.0));
        assert!(analysis.price_impact_analysis.is_none());
        assert!(analysis.prediction_analysis.is_none());
        assert!(analysis.timing_analysis.is_none());
        assert!(analysis.smart_money_indicator.is_none());
        assert!(!analysis.anomaly_detection.anomaly_detected);
        assert_eq!(analysis.summary.analysis_quality, Quality::Low);
    }
}
