//! 투자자 수급 샘플과 가격 포인트.
//!
//! 외부 데이터 소스의 원시 행은 이 모듈의 타입으로 변환된 뒤에만
//! 분석 코어로 전달됩니다. 누락된 금액 필드는 모두 0으로 채워집니다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::stock::StockCode;

/// 한 시점의 투자자 그룹별 순매수 금액.
///
/// 금액은 부호 있는 원화 단위이며 음수는 순매도를 뜻합니다.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlowSample {
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub foreign_net: i64,
    #[serde(default)]
    pub institution_net: i64,
    #[serde(default)]
    pub individual_net: i64,
    #[serde(default)]
    pub program_net: Option<i64>,
}

impl FlowSample {
    /// 프로그램 매매 정보 없이 샘플을 생성합니다.
    pub fn new(
        timestamp: DateTime<Utc>,
        foreign_net: i64,
        institution_net: i64,
        individual_net: i64,
    ) -> Self {
        Self {
            timestamp,
            foreign_net,
            institution_net,
            individual_net,
            program_net: None,
        }
    }

    /// 프로그램 순매수 금액을 지정합니다.
    pub fn with_program(mut self, program_net: i64) -> Self {
        self.program_net = Some(program_net);
        self
    }

    /// 스마트 머니 순매수 (외국인 + 기관).
    pub fn smart_money_net(&self) -> i64 {
        self.foreign_net.saturating_add(self.institution_net)
    }
}

/// 한 시점의 종가.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub close_price: f64,
    #[serde(default)]
    pub volume: Option<i64>,
}

impl PricePoint {
    pub fn new(timestamp: DateTime<Utc>, close_price: f64) -> Self {
        Self {
            timestamp,
            close_price,
            volume: None,
        }
    }

    pub fn with_volume(mut self, volume: i64) -> Self {
        self.volume = Some(volume);
        self
    }
}

/// 시장 데이터 소스가 제공하는 현재 시점의 투자자별 매매 현황.
///
/// 응답에 없는 그룹의 금액은 0으로 간주합니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestorSnapshot {
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub stock_code: Option<StockCode>,
    #[serde(default)]
    pub stock_name: Option<String>,
    #[serde(default)]
    pub foreign_net: i64,
    #[serde(default)]
    pub institution_net: i64,
    #[serde(default)]
    pub individual_net: i64,
    #[serde(default)]
    pub program_net: i64,
}

impl InvestorSnapshot {
    /// 모든 금액이 0인 스냅샷.
    pub fn empty(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            stock_code: None,
            stock_name: None,
            foreign_net: 0,
            institution_net: 0,
            individual_net: 0,
            program_net: 0,
        }
    }

    /// 스마트 머니 순매수 (외국인 + 기관).
    pub fn smart_money_net(&self) -> i64 {
        self.foreign_net.saturating_add(self.institution_net)
    }

    /// 네 그룹 순매수 절대값의 합.
    pub fn total_activity(&self) -> f64 {
        (self.foreign_net as f64).abs()
            + (self.institution_net as f64).abs()
            + (self.individual_net as f64).abs()
            + (self.program_net as f64).abs()
    }

    /// 분석용 샘플로 변환합니다.
    pub fn to_flow_sample(&self) -> FlowSample {
        FlowSample::new(
            self.timestamp,
            self.foreign_net,
            self.institution_net,
            self.individual_net,
        )
        .with_program(self.program_net)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_missing_fields_default_to_zero() {
        let sample: FlowSample =
            serde_json::from_str(r#"{"timestamp":"2024-01-02T00:00:00Z","foreign_net":100}"#)
                .unwrap();
        assert_eq!(sample.foreign_net, 100);
        assert_eq!(sample.institution_net, 0);
        assert_eq!(sample.individual_net, 0);
        assert_eq!(sample.program_net, None);
    }

    #[test]
    fn test_snapshot_aggregates() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let mut snapshot = InvestorSnapshot::empty(ts);
        snapshot.foreign_net = 3_000;
        snapshot.institution_net = -1_000;
        snapshot.individual_net = -2_000;
        snapshot.program_net = 500;

        assert_eq!(snapshot.smart_money_net(), 2_000);
        assert_eq!(snapshot.total_activity(), 6_500.0);

        let sample = snapshot.to_flow_sample();
        assert_eq!(sample.smart_money_net(), 2_000);
        assert_eq!(sample.program_net, Some(500));
    }
}
