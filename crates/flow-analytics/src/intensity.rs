//! 금액 기반 수급 강도 분류.

use flow_core::{IntensityThresholds, InvestorSnapshot};
use serde::{Deserialize, Serialize};

/// 네 개의 임계값으로 금액을 1~10 강도로 분류합니다.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntensityClassifier {
    thresholds: IntensityThresholds,
}

/// 현재 매매 현황의 강도 점수.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntensityScore {
    pub overall_intensity: u8,
    pub foreign_intensity: u8,
    pub institution_intensity: u8,
    pub smart_money_intensity: u8,
    /// 네 그룹 순매수 절대값의 합
    pub total_activity_amount: f64,
    /// 외국인과 기관 순매수 절대값의 합
    pub smart_money_activity_amount: f64,
}

impl IntensityClassifier {
    pub fn new(thresholds: IntensityThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &IntensityThresholds {
        &self.thresholds
    }

    /// 금액의 절대값에 대한 강도 (1~10).
    ///
    /// `low` 미만 구간은 `low` 대비 비율에 비례해 1~3을 반환합니다.
    pub fn level(&self, amount: f64) -> u8 {
        let a = amount.abs();
        let t = &self.thresholds;

        if a >= t.very_high {
            10
        } else if a >= t.high {
            8
        } else if a >= t.medium {
            6
        } else if a >= t.low {
            4
        } else {
            ((a / t.low * 4.0).floor() as u8).max(1)
        }
    }

    /// 현재 매매 현황의 전체/그룹별 강도.
    pub fn score(&self, snapshot: &InvestorSnapshot) -> IntensityScore {
        let foreign = (snapshot.foreign_net as f64).abs();
        let institution = (snapshot.institution_net as f64).abs();
        let total = snapshot.total_activity();
        let smart_money = foreign + institution;

        IntensityScore {
            overall_intensity: self.level(total),
            foreign_intensity: self.level(foreign),
            institution_intensity: self.level(institution),
            smart_money_intensity: self.level(smart_money).max(1),
            total_activity_amount: total,
            smart_money_activity_amount: smart_money,
        }
    }
}

impl Default for IntensityClassifier {
    fn default() -> Self {
        Self::new(IntensityThresholds::default())
    }
}
