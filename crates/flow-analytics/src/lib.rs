//! 투자자 수급 분석 엔진.
//!
//! 이 크레이트는 I/O 없는 순수 계산만 제공합니다:
//! - [`stats`]: 평균, 표준편차, Pearson/Spearman 상관계수, 시계열 정렬
//! - [`intensity`]: 금액 기반 1~10 강도 분류
//! - [`trend`]: 스마트 머니 추세 방향/강도/일관성/모멘텀
//! - [`signal`]: 스마트 머니 매수/매도 신호
//! - [`correlation`]: 가격-수급 상관관계, 선행/후행, 유의성 근사 검정
//! - [`anomaly`]: 가격/수급 이상치와 패턴 이탈 감지
//! - [`market`]: 시장 영향도, 시장 심리, 투자자 그룹 분석
//! - [`price`]: 가격 영향도, 방향 예측, 타이밍, 스마트 머니 지표, 요약
//!
//! 모든 함수는 입력 슬라이스만 읽으며 호출 간 상태를 갖지 않습니다.

pub mod anomaly;
pub mod correlation;
pub mod error;
pub mod intensity;
pub mod market;
pub mod price;
pub mod signal;
pub mod stats;
pub mod trend;

pub use anomaly::{Anomaly, AnomalyDetector, AnomalyKind, AnomalyReport};
pub use correlation::{
    CorrelationAnalysis, CorrelationEngine, CorrelationStrength, GroupCorrelations, Leader,
    LeadLag, Significance,
};
pub use error::{AnalyticsError, Result};
pub use intensity::{IntensityClassifier, IntensityScore};
pub use price::{ComprehensiveAnalysis, PriceAnalyzer, PriceImpact, Prediction};
pub use signal::{SignalDirection, SignalEngine, SmartMoneySignal};
pub use stats::AlignedPoint;
pub use trend::{TrendAnalyzer, TrendDirection, TrendResult};
