//! 스마트 머니 매수/매도 신호.

use flow_core::AnalysisConfig;
use serde::{Deserialize, Serialize};

/// 기본 이력 창 크기.
pub const DEFAULT_SIGNAL_WINDOW: usize = 5;

/// 신호 방향.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalDirection {
    Buy,
    Sell,
    Neutral,
}

/// 스마트 머니 신호.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmartMoneySignal {
    pub signal_direction: SignalDirection,
    /// 1 ~ 10
    pub signal_strength: f64,
    /// 0 ~ 1
    pub confidence_level: f64,
    pub foreign_flow: i64,
    pub institutional_flow: i64,
    pub total_smart_money_flow: i64,
}

/// 외국인/기관 순매수로 신호를 만드는 엔진.
#[derive(Debug, Clone, Copy)]
pub struct SignalEngine {
    threshold: f64,
    scale_unit: f64,
    window: usize,
}

impl SignalEngine {
    /// # 인자
    ///
    /// * `threshold` - 매수/매도 판정 임계값
    /// * `scale_unit` - 강도 환산 단위 (강도 분류의 `low` 구간)
    pub fn new(threshold: f64, scale_unit: f64) -> Self {
        Self {
            threshold,
            scale_unit,
            window: DEFAULT_SIGNAL_WINDOW,
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(
            config.smart_money_threshold,
            config.intensity_thresholds.low,
        )
    }

    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    /// 현재 순매수와 최근 스마트 머니 이력으로 신호를 계산합니다.
    pub fn evaluate(&self, foreign_net: i64, institution_net: i64, history: &[f64]) -> SmartMoneySignal {
        let smart_money = foreign_net.saturating_add(institution_net);
        let flow = smart_money as f64;
        let recent = &history[history.len().saturating_sub(self.window)..];

        SmartMoneySignal {
            signal_direction: self.direction(flow),
            signal_strength: self.strength(flow),
            confidence_level: confidence(flow, recent),
            foreign_flow: foreign_net,
            institutional_flow: institution_net,
            total_smart_money_flow: smart_money,
        }
    }

    pub fn direction(&self, flow: f64) -> SignalDirection {
        if flow > self.threshold {
            SignalDirection::Buy
        } else if flow < -self.threshold {
            SignalDirection::Sell
        } else {
            SignalDirection::Neutral
        }
    }

    pub fn strength(&self, flow: f64) -> f64 {
        (flow.abs() / self.scale_unit * 2.0).clamp(1.0, 10.0)
    }
}

/// 방향 일치 비율(0.6)과 크기 비율(0.4)의 가중 평균.
///
/// 이력이 없으면 0.5.
pub fn confidence(current: f64, history: &[f64]) -> f64 {
    if history.is_empty() {
        return 0.5;
    }

    let n = history.len() as f64;
    let same_direction = history
        .iter()
        .filter(|&&f| (f > 0.0) == (current > 0.0))
        .count() as f64;
    let avg_magnitude = history.iter().map(|f| f.abs()).sum::<f64>() / n;
    let magnitude = (current.abs() / avg_magnitude.max(1.0)).min(1.0);

    (same_direction / n * 0.6 + magnitude * 0.4).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> SignalEngine {
        SignalEngine::from_config(&AnalysisConfig::default())
    }

    #[test]
    fn test_direction_thresholds() {
        let e = engine();
        assert_eq!(
            e.evaluate(2_000_000_000, 0, &[]).signal_direction,
            SignalDirection::Buy
        );
        assert_eq!(
            e.evaluate(-2_000_000_000, 0, &[]).signal_direction,
            SignalDirection::Sell
        );
        assert_eq!(
            e.evaluate(500_000_000, 400_000_000, &[]).signal_direction,
            SignalDirection::Neutral
        );
        // 임계값과 같으면 중립
        assert_eq!(
            e.evaluate(1_000_000_000, 0, &[]).signal_direction,
            SignalDirection::Neutral
        );
    }

    #[test]
    fn test_strength_scaling() {
        let e = engine();
        assert_eq!(e.strength(0.0), 1.0);
        assert_eq!(e.strength(2e9), 4.0);
        assert_eq!(e.strength(-1e11), 10.0);
    }

    #[test]
    fn test_confidence_without_history() {
        assert_eq!(confidence(5e9, &[]), 0.5);
    }

    #[test]
    fn test_confidence_blend() {
        // 방향 2/4 일치, 크기 비율 min(1, 4/2) = 1
        let c = confidence(4.0, &[1.0, -1.0, 3.0, -3.0]);
        assert!((c - (0.5 * 0.6 + 0.4)).abs() < 1e-12);
    }

    #[test]
    fn test_evaluate_uses_recent_window() {
        let history = [-9e9, -9e9, -9e9, 1e9, 1e9, 1e9, 1e9, 1e9];
        let signal = engine().evaluate(1_000_000_000, 1_000_000_000, &history);
        assert_eq!(signal.confidence_level, 1.0);
        assert_eq!(signal.total_smart_money_flow, 2_000_000_000);
        assert_eq!(signal.foreign_flow, 1_000_000_000);
        assert_eq!(signal.institutional_flow, 1_000_000_000);
    }
}
