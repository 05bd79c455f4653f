//! 가격/수급 이상 패턴 감지.

use flow_core::{AnalysisConfig, FlowSample, PricePoint};
use serde::{Deserialize, Serialize};

use crate::stats::{mean, pearson_or_zero, stdev};

/// 감지에 필요한 최소 데이터 수 (가격, 수급 각각).
pub const MIN_ANOMALY_POINTS: usize = 5;

/// 최근 구간과 전체 구간 상관계수 차이의 패턴 이탈 기준.
const PATTERN_BREAK_GAP: f64 = 0.5;

/// 이상 패턴 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnomalyKind {
    PriceSpike,
    PriceDrop,
    FlowSpike,
    PatternBreak,
    None,
}

impl AnomalyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnomalyKind::PriceSpike => "PRICE_SPIKE",
            AnomalyKind::PriceDrop => "PRICE_DROP",
            AnomalyKind::FlowSpike => "FLOW_SPIKE",
            AnomalyKind::PatternBreak => "PATTERN_BREAK",
            AnomalyKind::None => "NONE",
        }
    }
}

/// 개별 이상 패턴.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    pub kind: AnomalyKind,
    pub period: usize,
    pub severity: f64,
}

/// 감지 결과.
///
/// 대표 이상(`anomaly_type`, `anomaly_score`)은 심각도가 가장 높은 항목이며,
/// 전체 목록은 `anomalies`에 남아 있습니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyReport {
    pub anomaly_detected: bool,
    pub anomaly_type: AnomalyKind,
    /// 0 ~ 10
    pub anomaly_score: f64,
    pub affected_periods: Vec<usize>,
    pub total_anomalies: usize,
    pub anomalies: Vec<Anomaly>,
}

impl AnomalyReport {
    pub fn none() -> Self {
        Self {
            anomaly_detected: false,
            anomaly_type: AnomalyKind::None,
            anomaly_score: 0.0,
            affected_periods: Vec::new(),
            total_anomalies: 0,
            anomalies: Vec::new(),
        }
    }

    fn from_anomalies(anomalies: Vec<Anomaly>) -> Self {
        let headline = anomalies.iter().fold(None::<&Anomaly>, |best, a| match best {
            Some(b) if a.severity <= b.severity => Some(b),
            _ => Some(a),
        });

        match headline {
            None => Self::none(),
            Some(top) => Self {
                anomaly_detected: true,
                anomaly_type: top.kind,
                anomaly_score: top.severity.min(10.0),
                affected_periods: anomalies.iter().map(|a| a.period).collect(),
                total_anomalies: anomalies.len(),
                anomalies,
            },
        }
    }
}

/// 표준편차 배수 기반 이상 감지기.
#[derive(Debug, Clone, Copy)]
pub struct AnomalyDetector {
    multiplier: f64,
}

impl Default for AnomalyDetector {
    fn default() -> Self {
        Self::new(2.5)
    }
}

impl AnomalyDetector {
    pub fn new(multiplier: f64) -> Self {
        Self { multiplier }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(config.anomaly_sensitivity)
    }

    /// 가격/수급 레코드에서 이상 패턴을 찾습니다.
    pub fn detect_series(&self, prices: &[PricePoint], flows: &[FlowSample]) -> AnomalyReport {
        let prices: Vec<f64> = prices.iter().map(|p| p.close_price).collect();
        let flows: Vec<f64> = flows.iter().map(|f| f.smart_money_net() as f64).collect();
        self.detect(&prices, &flows)
    }

    /// 가격 수준과 샘플별 스마트 머니 순매수에서 이상 패턴을 찾습니다.
    ///
    /// 어느 한쪽이라도 5개 미만이면 감지하지 않습니다.
    pub fn detect(&self, prices: &[f64], flows: &[f64]) -> AnomalyReport {
        if prices.len() < MIN_ANOMALY_POINTS || flows.len() < MIN_ANOMALY_POINTS {
            return AnomalyReport::none();
        }

        let deltas: Vec<f64> = prices.windows(2).map(|w| w[1] - w[0]).collect();
        let mut anomalies = Vec::new();

        // 가격 급등/급락, 기간은 변화가 끝나는 가격 인덱스
        for (i, dev, sd, value) in self.outliers(&deltas) {
            anomalies.push(Anomaly {
                kind: if value > 0.0 {
                    AnomalyKind::PriceSpike
                } else {
                    AnomalyKind::PriceDrop
                },
                period: i + 1,
                severity: dev / sd,
            });
        }

        for (i, dev, sd, _) in self.outliers(flows) {
            anomalies.push(Anomaly {
                kind: AnomalyKind::FlowSpike,
                period: i,
                severity: dev / sd,
            });
        }

        if let Some(anomaly) = pattern_break(&deltas, flows) {
            anomalies.push(anomaly);
        }

        AnomalyReport::from_anomalies(anomalies)
    }

    /// 평균에서 `multiplier × stdev`보다 멀리 떨어진 값.
    ///
    /// (인덱스, 편차, 표준편차, 값)을 반환하며 표준편차가 0이면 비어 있습니다.
    fn outliers(&self, xs: &[f64]) -> Vec<(usize, f64, f64, f64)> {
        let (Ok(m), Ok(sd)) = (mean(xs), stdev(xs)) else {
            return Vec::new();
        };
        if sd <= 0.0 {
            return Vec::new();
        }

        xs.iter()
            .enumerate()
            .filter_map(|(i, &x)| {
                let dev = (x - m).abs();
                (dev > self.multiplier * sd).then_some((i, dev, sd, x))
            })
            .collect()
    }
}

/// 최근 3구간과 전체 구간의 가격 변화-수급 상관계수가 크게 다르면 패턴 이탈.
///
/// 각 가격 변화는 변화가 끝나는 시점의 수급과 짝지어집니다.
/// 보고하는 기간은 가격 변화 목록의 마지막 인덱스(`n - 1`)입니다. 가격 급등/급락은
/// 가격 목록 인덱스(`i + 1`)를 쓰므로, 같은 시점이라도 패턴 이탈 쪽이 1 작습니다.
fn pattern_break(deltas: &[f64], flows: &[f64]) -> Option<Anomaly> {
    let n = deltas.len().min(flows.len());
    if n < 3 {
        return None;
    }
    let deltas = &deltas[deltas.len() - n..];
    let flows = &flows[flows.len() - n..];

    let recent = pearson_or_zero(&deltas[n - 3..], &flows[n - 3..]);
    let overall = pearson_or_zero(deltas, flows);
    let gap = (recent - overall).abs();

    (gap > PATTERN_BREAK_GAP).then_some(Anomaly {
        kind: AnomalyKind::PatternBreak,
        period: n - 1,
        severity: gap,
    })
}
