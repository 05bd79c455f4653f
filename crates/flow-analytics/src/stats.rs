//! 기초 통계 함수와 가격/수급 시계열 정렬.

use chrono::{DateTime, Duration, Utc};
use flow_core::{FlowSample, PricePoint};
use serde::{Deserialize, Serialize};

use crate::error::{AnalyticsError, Result};

/// 산술 평균. 최소 1개의 값이 필요합니다.
pub fn mean(xs: &[f64]) -> Result<f64> {
    if xs.is_empty() {
        return Err(AnalyticsError::InsufficientData {
            required: 1,
            actual: 0,
        });
    }
    Ok(xs.iter().sum::<f64>() / xs.len() as f64)
}

/// 표본 표준편차 (n-1). 최소 2개의 값이 필요합니다.
pub fn stdev(xs: &[f64]) -> Result<f64> {
    if xs.len() < 2 {
        return Err(AnalyticsError::InsufficientData {
            required: 2,
            actual: xs.len(),
        });
    }
    let m = mean(xs)?;
    let var = xs.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (xs.len() - 1) as f64;
    Ok(var.sqrt())
}

/// Pearson 상관계수.
///
/// # 인자
///
/// * `xs`, `ys` - 길이가 같고 2 이상인 시계열
///
/// # 반환
///
/// 상관계수 (-1.0 ~ 1.0). 어느 한쪽의 분산이 0이면 계산 불가를 뜻하는 0.0.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Result<f64> {
    if xs.len() != ys.len() {
        return Err(AnalyticsError::LengthMismatch {
            left: xs.len(),
            right: ys.len(),
        });
    }
    if xs.len() < 2 {
        return Err(AnalyticsError::InsufficientData {
            required: 2,
            actual: xs.len(),
        });
    }

    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let denom = (var_x * var_y).sqrt();
    if denom == 0.0 || !denom.is_finite() {
        return Ok(0.0);
    }

    Ok((cov / denom).clamp(-1.0, 1.0))
}

/// 길이가 다르거나 짧은 입력을 0.0으로 처리하는 Pearson 상관계수.
///
/// 최선의 답이 허용되는 보조 지표에서 사용합니다.
pub fn pearson_or_zero(xs: &[f64], ys: &[f64]) -> f64 {
    pearson(xs, ys).unwrap_or(0.0)
}

/// 1부터 시작하는 순위. 동률은 원래 순서대로 순위를 받습니다.
pub fn ranks(xs: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..xs.len()).collect();
    order.sort_by(|&a, &b| xs[a].total_cmp(&xs[b]));

    let mut ranks = vec![0.0; xs.len()];
    for (rank, idx) in order.into_iter().enumerate() {
        ranks[idx] = (rank + 1) as f64;
    }
    ranks
}

/// Spearman 순위 상관계수.
pub fn spearman(xs: &[f64], ys: &[f64]) -> Result<f64> {
    if xs.len() != ys.len() {
        return Err(AnalyticsError::LengthMismatch {
            left: xs.len(),
            right: ys.len(),
        });
    }
    pearson(&ranks(xs), &ranks(ys))
}

/// 시각 기준으로 짝지어진 가격과 수급.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlignedPoint {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    pub volume: i64,
    pub foreign_net: i64,
    pub institution_net: i64,
    pub individual_net: i64,
}

impl AlignedPoint {
    pub fn smart_money_net(&self) -> i64 {
        self.foreign_net.saturating_add(self.institution_net)
    }
}

/// 각 수급 샘플에 가장 가까운 시각의 가격을 짝지웁니다.
///
/// 두 시계열은 시각 오름차순으로 정렬한 사본을 사용합니다.
/// 시각 차이가 `tolerance`를 넘는 샘플은 버려지며, 거리가 같은 가격이
/// 여럿이면 먼저 나온(더 이른) 가격을 선택합니다.
pub fn align(prices: &[PricePoint], flows: &[FlowSample], tolerance: Duration) -> Vec<AlignedPoint> {
    let mut prices: Vec<&PricePoint> = prices.iter().collect();
    let mut flows: Vec<&FlowSample> = flows.iter().collect();
    prices.sort_by_key(|p| p.timestamp);
    flows.sort_by_key(|f| f.timestamp);

    let tolerance_ms = tolerance.num_milliseconds();
    let mut aligned = Vec::with_capacity(flows.len());

    for flow in flows {
        let mut closest: Option<(&PricePoint, i64)> = None;
        for price in &prices {
            let diff = (price.timestamp - flow.timestamp).num_milliseconds().abs();
            if closest.map_or(true, |(_, best)| diff < best) {
                closest = Some((price, diff));
            }
        }

        if let Some((price, diff)) = closest {
            if diff <= tolerance_ms {
                aligned.push(AlignedPoint {
                    timestamp: flow.timestamp,
                    price: price.close_price,
                    volume: price.volume.unwrap_or(0),
                    foreign_net: flow.foreign_net,
                    institution_net: flow.institution_net,
                    individual_net: flow.individual_net,
                });
            }
        }
    }

    aligned
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_mean_and_stdev() {
        assert_eq!(mean(&[1.0, 2.0, 3.0]).unwrap(), 2.0);
        assert!((stdev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap() - 2.138).abs() < 0.001);
        assert!(mean(&[]).is_err());
        assert_eq!(
            stdev(&[1.0]),
            Err(AnalyticsError::InsufficientData {
                required: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn test_pearson_perfect_positive() {
        let corr = pearson(&[1.0, 2.0, 3.0, 4.0, 5.0], &[2.0, 4.0, 6.0, 8.0, 10.0]).unwrap();
        assert!((corr - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_pearson_perfect_negative() {
        let corr = pearson(&[1.0, 2.0, 3.0, 4.0, 5.0], &[10.0, 8.0, 6.0, 4.0, 2.0]).unwrap();
        assert!((corr + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_pearson_zero_variance_is_zero() {
        assert_eq!(pearson(&[1.0, 1.0, 1.0], &[5.0, 5.0, 5.0]).unwrap(), 0.0);
    }

    #[test]
    fn test_pearson_preconditions() {
        assert!(matches!(
            pearson(&[1.0, 2.0], &[1.0]),
            Err(AnalyticsError::LengthMismatch { left: 2, right: 1 })
        ));
        assert!(matches!(
            pearson(&[1.0], &[1.0]),
            Err(AnalyticsError::InsufficientData { .. })
        ));
        assert_eq!(pearson_or_zero(&[1.0, 2.0], &[1.0]), 0.0);
    }

    #[test]
    fn test_ranks_are_stable_on_ties() {
        assert_eq!(ranks(&[3.0, 1.0, 3.0, 2.0]), vec![3.0, 1.0, 4.0, 2.0]);
    }

    #[test]
    fn test_spearman_monotone() {
        let corr = spearman(&[1.0, 2.0, 3.0, 4.0], &[1.0, 8.0, 27.0, 64.0]).unwrap();
        assert!((corr - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_align_tolerance_boundary() {
        let flow = FlowSample::new(t0(), 1, 2, 3);

        let late = PricePoint::new(t0() + Duration::minutes(61), 100.0);
        assert!(align(&[late], &[flow], Duration::hours(1)).is_empty());

        let near = PricePoint::new(t0() + Duration::minutes(59), 100.0);
        let aligned = align(&[near], &[flow], Duration::hours(1));
        assert_eq!(aligned.len(), 1);
        assert_eq!(aligned[0].price, 100.0);
        assert_eq!(aligned[0].timestamp, t0());

        let exact = PricePoint::new(t0() + Duration::hours(1), 101.0);
        assert_eq!(align(&[exact], &[flow], Duration::hours(1)).len(), 1);
    }

    #[test]
    fn test_align_sorts_and_picks_nearest() {
        let prices = vec![
            PricePoint::new(t0() + Duration::hours(2), 300.0).with_volume(30),
            PricePoint::new(t0(), 100.0).with_volume(10),
            PricePoint::new(t0() + Duration::hours(1), 200.0),
        ];
        let flows = vec![
            FlowSample::new(t0() + Duration::minutes(70), 2, 0, 0),
            FlowSample::new(t0() + Duration::minutes(5), 1, 0, 0),
        ];

        let aligned = align(&prices, &flows, Duration::hours(1));
        assert_eq!(aligned.len(), 2);
        assert_eq!(aligned[0].foreign_net, 1);
        assert_eq!(aligned[0].price, 100.0);
        assert_eq!(aligned[0].volume, 10);
        assert_eq!(aligned[1].foreign_net, 2);
        assert_eq!(aligned[1].price, 200.0);
        assert_eq!(aligned[1].volume, 0);
    }

    #[test]
    fn test_align_equidistant_prefers_earlier_price() {
        let prices = vec![
            PricePoint::new(t0() + Duration::minutes(40), 2.0),
            PricePoint::new(t0() - Duration::minutes(40), 1.0),
        ];
        let flows = vec![FlowSample::new(t0(), 0, 0, 0)];
        let aligned = align(&prices, &flows, Duration::hours(1));
        assert_eq!(aligned[0].price, 1.0);
    }

    proptest! {
        #[test]
        fn prop_pearson_bounded(
            pairs in prop::collection::vec((-1e12f64..1e12, -1e12f64..1e12), 2..50)
        ) {
            let (xs, ys): (Vec<f64>, Vec<f64>) = pairs.into_iter().unzip();
            let corr = pearson(&xs, &ys).unwrap();
            prop_assert!((-1.0..=1.0).contains(&corr));
        }

        #[test]
        fn prop_pearson_symmetric(
            pairs in prop::collection::vec((-1e6f64..1e6, -1e6f64..1e6), 2..30)
        ) {
            let (xs, ys): (Vec<f64>, Vec<f64>) = pairs.into_iter().unzip();
            let a = pearson(&xs, &ys).unwrap();
            let b = pearson(&ys, &xs).unwrap();
            prop_assert!((a - b).abs() < 1e-9);
        }
    }
}
