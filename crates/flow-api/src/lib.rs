//! 투자자 수급 분석 API.
//!
//! 두 분석 도구(투자자 매매 동향, 가격-수급 분석)를 메서드 이름으로 호출할 수 있게
//! 묶고, axum HTTP 서버로 노출합니다.
//!
//! 모든 도구 호출은 `{success, timestamp, ...}` 형태의 응답 봉투를 돌려주며,
//! 어떤 계층의 에러든 `{success: false, error: {kind, message}}`로 변환됩니다.

pub mod envelope;
pub mod registry;
pub mod routes;
pub mod state;
pub mod tools;

pub use registry::{ToolDescriptor, ToolRegistry};
pub use routes::create_api_router;
pub use state::AppState;
pub use tools::{
    InvestorTradingRequest, InvestorTradingTool, PriceAnalysisRequest, PriceAnalysisTool,
};
