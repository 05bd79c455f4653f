//! 스마트 머니 추세 분석.
//!
//! 현재 스마트 머니 순매수와 최근 이력(오래된 것 → 최신)으로
//! 방향, 강도, 일관성, 모멘텀을 각각 독립적으로 계산합니다.

use serde::{Deserialize, Serialize};

/// 기본 이력 창 크기.
pub const DEFAULT_TREND_WINDOW: usize = 10;

/// 추세 방향.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrendDirection {
    /// 매집
    Accumulating,
    /// 분산
    Distributing,
    Neutral,
}

/// 추세 분석 결과. 모든 값은 선언된 범위로 잘려 있습니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendResult {
    pub trend_direction: TrendDirection,
    /// 1 ~ 10
    pub trend_strength: f64,
    /// 0 ~ 1
    pub consistency_score: f64,
    /// 1 ~ 10
    pub momentum_score: f64,
}

impl TrendResult {
    /// 이력이 없을 때의 중립 결과.
    pub fn neutral() -> Self {
        Self {
            trend_direction: TrendDirection::Neutral,
            trend_strength: 1.0,
            consistency_score: 0.0,
            momentum_score: 1.0,
        }
    }
}

/// 추세 분석기.
#[derive(Debug, Clone, Copy)]
pub struct TrendAnalyzer {
    window: usize,
}

impl Default for TrendAnalyzer {
    fn default() -> Self {
        Self::new(DEFAULT_TREND_WINDOW)
    }
}

impl TrendAnalyzer {
    /// 최근 `window`개의 이력만 사용하는 분석기.
    pub fn new(window: usize) -> Self {
        Self {
            window: window.max(1),
        }
    }

    /// 이력의 마지막 `window`개와 현재 값으로 추세를 계산합니다.
    pub fn analyze(&self, current: f64, history: &[f64]) -> TrendResult {
        let start = history.len().saturating_sub(self.window);
        let recent = &history[start..];

        if recent.is_empty() {
            return TrendResult::neutral();
        }

        TrendResult {
            trend_direction: direction(current, recent),
            trend_strength: strength(current, recent).clamp(1.0, 10.0),
            consistency_score: consistency(recent).clamp(0.0, 1.0),
            momentum_score: momentum(current, recent).clamp(1.0, 10.0),
        }
    }
}

/// 최근 3개 이력과 현재 값 사이의 증가/감소 횟수로 방향을 판정합니다.
///
/// 이력이 3개 미만이면 항상 `Neutral`.
pub fn direction(current: f64, history: &[f64]) -> TrendDirection {
    if history.len() < 3 {
        return TrendDirection::Neutral;
    }

    let mut window = history[history.len() - 3..].to_vec();
    window.push(current);

    let (mut increasing, mut decreasing) = (0, 0);
    for pair in window.windows(2) {
        if pair[1] > pair[0] {
            increasing += 1;
        } else if pair[1] < pair[0] {
            decreasing += 1;
        }
    }

    match increasing.cmp(&decreasing) {
        std::cmp::Ordering::Greater => TrendDirection::Accumulating,
        std::cmp::Ordering::Less => TrendDirection::Distributing,
        std::cmp::Ordering::Equal => TrendDirection::Neutral,
    }
}

/// 이력 평균 대비 현재 값의 변화율 × 10 (최대 10).
pub fn strength(current: f64, history: &[f64]) -> f64 {
    if history.is_empty() {
        return 1.0;
    }
    let avg = history.iter().sum::<f64>() / history.len() as f64;
    if avg == 0.0 {
        return 1.0;
    }
    ((current - avg).abs() / avg.abs() * 10.0).min(10.0)
}

/// 인접 이력 쌍에서 부호(양수 여부)가 유지된 비율.
pub fn consistency(history: &[f64]) -> f64 {
    if history.len() < 2 {
        return 0.0;
    }
    let changes = history
        .windows(2)
        .filter(|pair| (pair[1] > 0.0) != (pair[0] > 0.0))
        .count();
    (1.0 - changes as f64 / (history.len() - 1) as f64).max(0.0)
}

/// 직전 변화량 대비 현재 변화량의 절대 비율 (1 ~ 10).
pub fn momentum(current: f64, history: &[f64]) -> f64 {
    if history.len() < 2 {
        return 1.0;
    }
    let last = history[history.len() - 1];
    let prior_delta = last - history[history.len() - 2];
    if prior_delta == 0.0 {
        return 1.0;
    }
    ((current - last) / prior_delta).abs().clamp(1.0, 10.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monotone_history_accumulates() {
        let history = [1e10, 2e10, 3e10, 4e10, 5e10];
        let result = TrendAnalyzer::default().analyze(6e10, &history);
        assert_eq!(result.trend_direction, TrendDirection::Accumulating);
        assert_eq!(result.consistency_score, 1.0);
        assert_eq!(result.momentum_score, 1.0);
        // |6 - 3| / 3 * 10 = 10
        assert_eq!(result.trend_strength, 10.0);
    }

    #[test]
    fn test_falling_history_distributes() {
        assert_eq!(
            direction(-1.0, &[5.0, 4.0, 3.0, 2.0]),
            TrendDirection::Distributing
        );
    }

    #[test]
    fn test_short_history_is_neutral() {
        assert_eq!(direction(100.0, &[1.0, 2.0]), TrendDirection::Neutral);
        assert_eq!(direction(3.0, &[3.0, 3.0, 3.0]), TrendDirection::Neutral);
    }

    #[test]
    fn test_empty_history_defaults() {
        assert_eq!(TrendAnalyzer::default().analyze(5e9, &[]), TrendResult::neutral());
    }

    #[test]
    fn test_strength_zero_mean() {
        assert_eq!(strength(10.0, &[-1.0, 1.0]), 1.0);
        assert!((strength(12.0, &[10.0, 10.0]) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_consistency_counts_sign_changes() {
        assert_eq!(consistency(&[1.0]), 0.0);
        assert_eq!(consistency(&[1.0, -1.0, 1.0]), 0.0);
        assert_eq!(consistency(&[1.0, 2.0, -1.0]), 0.5);
        // 0은 양수가 아니므로 음수와 같은 쪽으로 취급
        assert_eq!(consistency(&[0.0, -3.0]), 1.0);
    }

    #[test]
    fn test_momentum_clamped() {
        assert_eq!(momentum(100.0, &[0.0, 1.0]), 10.0);
        assert_eq!(momentum(1.1, &[0.0, 1.0]), 1.0);
        assert!((momentum(4.0, &[0.0, 1.0]) - 3.0).abs() < 1e-12);
        assert_eq!(momentum(4.0, &[1.0, 1.0]), 1.0);
    }

    #[test]
    fn test_window_limits_history() {
        let analyzer = TrendAnalyzer::new(2);
        // 마지막 2개만 사용하므로 방향은 판정 불가
        let result = analyzer.analyze(10.0, &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(result.trend_direction, TrendDirection::Neutral);
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(TrendResult::neutral()).unwrap();
        assert_eq!(json["trend_direction"], "NEUTRAL");
        assert_eq!(json["momentum_score"], 1.0);
    }
}
