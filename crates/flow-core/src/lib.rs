//! # Flow Core
//!
//! 투자자 수급 분석 시스템의 핵심 도메인 타입을 제공합니다.
//!
//! 이 크레이트는 시스템 전반에서 사용되는 기본 타입을 제공합니다:
//! - 투자자별 순매수 샘플과 가격 포인트
//! - 종목 코드, 시장, 투자자 유형, 분석 기간 정의
//! - 설정 관리
//! - 에러 분류
//! - 로깅 인프라

pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub use config::*;
pub use error::*;
pub use logging::*;
pub use types::*;
