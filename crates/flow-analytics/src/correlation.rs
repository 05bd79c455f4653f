//! 가격-수급 상관관계 분석.
//!
//! 처리 순서:
//! 1. 가격과 수급을 시각 기준으로 정렬 ([`stats::align`])
//! 2. 정렬된 포인트가 최소 개수 미만이면 `InsufficientData`
//! 3. 인접 포인트 간 가격 변화율(%) 계산, 직전 가격이 0인 구간은 제외
//! 4. 그룹별 순매수와 가격 변화율의 Pearson 상관계수
//! 5. 상관계수 절대값에 따른 강도 라벨
//! 6. -2 ~ +2 시차의 선행/후행 분석
//! 7. t-통계량 근사에 의한 유의성 판정
//!
//! 각 가격 변화율은 그 변화가 끝나는 시점의 수급과 짝지어집니다.

use chrono::Duration;
use flow_core::{AnalysisConfig, FlowSample, PricePoint};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AnalyticsError, Result};
use crate::stats::{align, pearson_or_zero, AlignedPoint};

/// 상관계수 강도 라벨.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CorrelationStrength {
    VeryStrong,
    Strong,
    Moderate,
    Weak,
    VeryWeak,
}

impl CorrelationStrength {
    pub fn from_coefficient(r: f64) -> Self {
        let abs = r.abs();
        if abs >= 0.8 {
            CorrelationStrength::VeryStrong
        } else if abs >= 0.6 {
            CorrelationStrength::Strong
        } else if abs >= 0.4 {
            CorrelationStrength::Moderate
        } else if abs >= 0.2 {
            CorrelationStrength::Weak
        } else {
            CorrelationStrength::VeryWeak
        }
    }
}

/// 그룹별 상관계수.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroupCorrelations {
    pub foreign_correlation: f64,
    pub institution_correlation: f64,
    pub individual_correlation: f64,
    pub smart_money_correlation: f64,
}

/// 그룹별 상관계수 강도.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrelationStrengths {
    pub foreign_strength: CorrelationStrength,
    pub institution_strength: CorrelationStrength,
    pub individual_strength: CorrelationStrength,
    pub smart_money_strength: CorrelationStrength,
}

impl From<&GroupCorrelations> for CorrelationStrengths {
    fn from(c: &GroupCorrelations) -> Self {
        Self {
            foreign_strength: CorrelationStrength::from_coefficient(c.foreign_correlation),
            institution_strength: CorrelationStrength::from_coefficient(c.institution_correlation),
            individual_strength: CorrelationStrength::from_coefficient(c.individual_correlation),
            smart_money_strength: CorrelationStrength::from_coefficient(c.smart_money_correlation),
        }
    }
}

/// 선행 주체.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Leader {
    SmartMoney,
    Price,
    Coincident,
}

/// 선행/후행 분석 결과.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LeadLag {
    pub leader: Leader,
    pub lag_periods: usize,
    pub max_correlation: f64,
}

impl LeadLag {
    fn coincident() -> Self {
        Self {
            leader: Leader::Coincident,
            lag_periods: 0,
            max_correlation: 0.0,
        }
    }
}

/// 유의성 근사 검정 결과.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Significance {
    pub significant: bool,
    pub p_value: f64,
    pub confidence_level: f64,
    /// `|r| == 1`이면 t가 발산하므로 `None`
    pub t_statistic: Option<f64>,
}

/// 상관관계 분석 결과.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationAnalysis {
    #[serde(flatten)]
    pub correlations: GroupCorrelations,
    pub correlation_strength: CorrelationStrengths,
    pub lead_lag_analysis: LeadLag,
    pub statistical_significance: Significance,
    pub aligned_points: usize,
}

/// 상관관계 분석 엔진.
#[derive(Debug, Clone, Copy)]
pub struct CorrelationEngine {
    min_data_points: usize,
    tolerance: Duration,
    alpha: f64,
}

impl CorrelationEngine {
    pub fn new(min_data_points: usize, tolerance: Duration, alpha: f64) -> Self {
        Self {
            min_data_points,
            tolerance,
            alpha,
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(
            config.min_data_points,
            Duration::seconds(config.alignment_tolerance_secs),
            config.correlation_significance_alpha,
        )
    }

    pub fn tolerance(&self) -> Duration {
        self.tolerance
    }

    /// 가격과 수급 시계열의 상관관계를 분석합니다.
    ///
    /// 정렬된 포인트가 `min_data_points` 미만이면 `InsufficientData`.
    pub fn analyze(&self, prices: &[PricePoint], flows: &[FlowSample]) -> Result<CorrelationAnalysis> {
        let aligned = align(prices, flows, self.tolerance);
        if aligned.len() < self.min_data_points {
            return Err(AnalyticsError::InsufficientData {
                required: self.min_data_points,
                actual: aligned.len(),
            });
        }

        let pairs = price_change_pairs(&aligned);
        let changes: Vec<f64> = pairs.iter().map(|(c, _)| *c).collect();
        let series = |f: fn(&AlignedPoint) -> i64| -> Vec<f64> {
            pairs.iter().map(|(_, p)| f(p) as f64).collect()
        };
        let smart_money = series(AlignedPoint::smart_money_net);

        let correlations = GroupCorrelations {
            foreign_correlation: pearson_or_zero(&changes, &series(|p| p.foreign_net)),
            institution_correlation: pearson_or_zero(&changes, &series(|p| p.institution_net)),
            individual_correlation: pearson_or_zero(&changes, &series(|p| p.individual_net)),
            smart_money_correlation: pearson_or_zero(&changes, &smart_money),
        };

        debug!(
            aligned = aligned.len(),
            changes = changes.len(),
            smart_money_correlation = correlations.smart_money_correlation,
            "correlation computed"
        );

        Ok(CorrelationAnalysis {
            correlation_strength: CorrelationStrengths::from(&correlations),
            correlations,
            lead_lag_analysis: lead_lag(&changes, &smart_money),
            statistical_significance: significance(&changes, &smart_money, self.alpha),
            aligned_points: aligned.len(),
        })
    }
}

/// 인접 정렬 포인트 간 가격 변화율(%)과 변화 종료 시점의 포인트.
///
/// 직전 가격이 0인 구간은 제외됩니다.
pub fn price_change_pairs(aligned: &[AlignedPoint]) -> Vec<(f64, AlignedPoint)> {
    aligned
        .windows(2)
        .filter(|w| w[0].price != 0.0)
        .map(|w| ((w[1].price - w[0].price) / w[0].price * 100.0, w[1]))
        .collect()
}

/// 인접 정렬 포인트 간 가격 변화율(%).
pub fn price_changes_pct(aligned: &[AlignedPoint]) -> Vec<f64> {
    price_change_pairs(aligned).into_iter().map(|(c, _)| c).collect()
}

/// -2 ~ +2 시차에서 |상관계수|가 가장 큰 시차를 찾습니다.
///
/// 양수 시차는 수급이 가격을 선행, 음수 시차는 가격이 수급을 선행함을 뜻합니다.
/// 동률이면 먼저 평가된(더 음수인) 시차가 남습니다.
pub fn lead_lag(price_changes: &[f64], flows: &[f64]) -> LeadLag {
    if price_changes.len() < 3 || flows.len() < 3 {
        return LeadLag::coincident();
    }

    let mut max_corr = 0.0;
    let mut best_lag: i32 = 0;

    for lag in -2i32..=2 {
        let shift = lag.unsigned_abs() as usize;
        let corr = if lag == 0 {
            pearson_or_zero(price_changes, flows).abs()
        } else if lag > 0 {
            if flows.len() <= shift {
                continue;
            }
            pearson_or_zero(&price_changes[shift..], &flows[..flows.len() - shift]).abs()
        } else {
            if price_changes.len() <= shift {
                continue;
            }
            pearson_or_zero(&price_changes[..price_changes.len() - shift], &flows[shift..]).abs()
        };

        if corr > max_corr {
            max_corr = corr;
            best_lag = lag;
        }
    }

    let leader = match best_lag.cmp(&0) {
        std::cmp::Ordering::Greater => Leader::SmartMoney,
        std::cmp::Ordering::Less => Leader::Price,
        std::cmp::Ordering::Equal => Leader::Coincident,
    };

    LeadLag {
        leader,
        lag_periods: best_lag.unsigned_abs() as usize,
        max_correlation: max_corr,
    }
}

/// t-통계량 근사에 의한 유의성 판정.
///
/// |t| 임계값 2.57 / 1.96 / 1.64를 신뢰수준 0.99 / 0.95 / 0.90에 대응시킵니다.
/// 정확한 t-분포 조회가 아닌 근사입니다.
pub fn significance(xs: &[f64], ys: &[f64], alpha: f64) -> Significance {
    let n = xs.len();
    if n < 3 {
        return Significance {
            significant: false,
            p_value: 1.0,
            confidence_level: 0.0,
            t_statistic: Some(0.0),
        };
    }

    let r = pearson_or_zero(xs, ys);
    let t = (r.abs() < 1.0).then(|| r * ((n - 2) as f64 / (1.0 - r * r)).sqrt());

    let (confidence_level, p_value) = match t.map_or(f64::INFINITY, f64::abs) {
        v if v > 2.57 => (0.99, 0.01),
        v if v > 1.96 => (0.95, 0.05),
        v if v > 1.64 => (0.90, 0.10),
        _ => (0.0, 1.0),
    };

    Significance {
        significant: p_value < alpha,
        p_value,
        confidence_level,
        t_statistic: t,
    }
}
