//! 분석 엔진 에러 타입.

use flow_core::FlowError;
use thiserror::Error;

/// 분석 계산의 전제 조건 위반.
///
/// 데이터가 적어도 의미 있는 기본값이 있는 계산은 에러 대신
/// 중립값을 반환하며, 이 타입은 그런 대안이 없을 때만 쓰입니다.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalyticsError {
    /// 데이터 포인트 부족
    #[error("insufficient data: required {required}, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    /// 두 시계열의 길이 불일치
    #[error("length mismatch: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },
}

pub type Result<T> = std::result::Result<T, AnalyticsError>;

impl From<AnalyticsError> for FlowError {
    fn from(err: AnalyticsError) -> Self {
        match err {
            AnalyticsError::InsufficientData { required, actual } => {
                FlowError::insufficient(required, actual, "analysis input")
            }
            AnalyticsError::LengthMismatch { .. } => FlowError::Internal(err.to_string()),
        }
    }
}
