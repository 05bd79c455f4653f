//! 수급 분석 시스템의 에러 타입.
//!
//! 에러는 세 가지 종류로 나뉩니다:
//! 잘못된 입력(`Validation`), 데이터 부족(`InsufficientData`),
//! 외부 협력자 실패(`DataUnavailable`, `Upstream`).
//! 응답 봉투에는 [`FlowError::kind`]가 반환하는 안정적인 문자열이 실립니다.

use thiserror::Error;

/// 핵심 수급 분석 에러.
#[derive(Debug, Error)]
pub enum FlowError {
    /// 공개 진입점에 전달된 잘못된 입력
    #[error("잘못된 입력 ({field}): {message}")]
    Validation { field: String, message: String },

    /// 통계 계산에 필요한 데이터 부족
    #[error("데이터 부족: {context} (필요 {required}, 실제 {actual})")]
    InsufficientData {
        required: usize,
        actual: usize,
        context: String,
    },

    /// 시장 데이터 소스에서 현재 데이터를 가져오지 못함
    #[error("데이터를 가져올 수 없음: {0}")]
    DataUnavailable(String),

    /// 외부 협력자(API, DB, 캐시) 실패
    #[error("외부 시스템 에러: {0}")]
    Upstream(String),

    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),

    /// 직렬화 에러
    #[error("직렬화 에러: {0}")]
    Serialization(String),

    /// 내부 에러
    #[error("내부 에러: {0}")]
    Internal(String),
}

/// 수급 분석 작업을 위한 Result 타입.
pub type FlowResult<T> = Result<T, FlowError>;

impl FlowError {
    /// 검증 에러를 생성합니다.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        FlowError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// 데이터 부족 에러를 생성합니다.
    pub fn insufficient(required: usize, actual: usize, context: impl Into<String>) -> Self {
        FlowError::InsufficientData {
            required,
            actual,
            context: context.into(),
        }
    }

    /// 응답 봉투에 실리는 에러 종류 문자열.
    pub fn kind(&self) -> &'static str {
        match self {
            FlowError::Validation { .. } => "VALIDATION_ERROR",
            FlowError::InsufficientData { .. } => "INSUFFICIENT_DATA",
            FlowError::DataUnavailable(_) | FlowError::Upstream(_) => "UPSTREAM_FAILURE",
            FlowError::Config(_) => "CONFIG_ERROR",
            FlowError::Serialization(_) => "SERIALIZATION_ERROR",
            FlowError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// 재시도 가능한 에러인지 확인합니다.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FlowError::DataUnavailable(_) | FlowError::Upstream(_))
    }
}

impl From<serde_json::Error> for FlowError {
    fn from(err: serde_json::Error) -> Self {
        FlowError::Serialization(err.to_string())
    }
}

impl From<config::ConfigError> for FlowError {
    fn from(err: config::ConfigError) -> Self {
        FlowError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind() {
        assert_eq!(
            FlowError::validation("stock_code", "6자리 숫자여야 합니다").kind(),
            "VALIDATION_ERROR"
        );
        assert_eq!(
            FlowError::insufficient(5, 3, "correlation").kind(),
            "INSUFFICIENT_DATA"
        );
        assert_eq!(
            FlowError::DataUnavailable("kis".to_string()).kind(),
            "UPSTREAM_FAILURE"
        );
    }

    #[test]
    fn test_error_retryable() {
        assert!(FlowError::Upstream("timeout".to_string()).is_retryable());
        assert!(!FlowError::validation("period", "bad").is_retryable());
    }

    #[test]
    fn test_insufficient_message() {
        let err = FlowError::insufficient(5, 3, "aligned points");
        assert_eq!(err.to_string(), "데이터 부족: aligned points (필요 5, 실제 3)");
    }
}
