//! HTTP 라우트.
//!
//! - `GET /health`: 데이터베이스/캐시/외부 API 상태
//! - `GET /tools`: 사용 가능한 도구 목록
//! - `POST /tools/{name}`: 도구 호출 (JSON 파라미터 → 응답 봉투)

pub mod health;
pub mod tools;

pub use health::{health_router, ComponentHealth, ComponentStatus, HealthResponse};
pub use tools::tools_router;

use axum::Router;
use std::sync::Arc;

use crate::state::AppState;

/// 모든 API 라우트를 조합합니다.
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/health", health_router())
        .nest("/tools", tools_router())
}
