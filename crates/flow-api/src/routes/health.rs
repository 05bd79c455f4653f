//! 헬스 체크 endpoint.
//!
//! 이력 저장소(데이터베이스), 결과 캐시, 시장 데이터 API 상태를 보고합니다.

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::state::AppState;

/// 헬스 체크 응답.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// 전체 서비스 상태 ("healthy" | "degraded")
    pub status: String,

    pub version: String,

    /// 서버 업타임(초)
    pub uptime_secs: i64,

    /// 현재 시간 (ISO 8601)
    pub timestamp: String,

    pub components: ComponentHealth,
}

/// 개별 컴포넌트 상태.
#[derive(Debug, Serialize, Deserialize)]
pub struct ComponentHealth {
    /// 이력 저장소 (PostgreSQL)
    pub database: ComponentStatus,

    /// 결과 캐시
    pub cache: ComponentStatus,

    /// 시장 데이터 API (KIS)
    pub api: ComponentStatus,
}

/// 컴포넌트 상태.
#[derive(Debug, Serialize, Deserialize)]
pub struct ComponentStatus {
    /// 상태 ("up" | "down" | "not_configured")
    pub status: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ComponentStatus {
    pub fn up() -> Self {
        Self {
            status: "up".to_string(),
            message: None,
        }
    }

    pub fn down(message: impl Into<String>) -> Self {
        Self {
            status: "down".to_string(),
            message: Some(message.into()),
        }
    }

    pub fn not_configured() -> Self {
        Self {
            status: "not_configured".to_string(),
            message: None,
        }
    }

    /// 정보 포함 정상 상태.
    pub fn up_with_info(message: impl Into<String>) -> Self {
        Self {
            status: "up".to_string(),
            message: Some(message.into()),
        }
    }

    pub fn is_up(&self) -> bool {
        self.status == "up"
    }
}

/// 서버가 응답 가능한지만 확인합니다.
///
/// GET /health/live
pub async fn health_live() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// 모든 협력자의 상태를 확인합니다.
///
/// GET /health
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let database = match &state.history {
        Some(store) if store.health_check().await => ComponentStatus::up(),
        Some(_) => ComponentStatus::down("연결 실패"),
        None => ComponentStatus::not_configured(),
    };

    let cache = if state.cache.health_check().await {
        ComponentStatus::up_with_info(state.cache.backend())
    } else {
        ComponentStatus::down(format!("{} 응답 없음", state.cache.backend()))
    };

    let api = match &state.market_source {
        Some(source) if source.health_check().await => ComponentStatus::up_with_info(source.name()),
        Some(source) => ComponentStatus::down(format!("{} 사용 불가", source.name())),
        None => ComponentStatus::not_configured(),
    };

    let healthy = database.is_up() && cache.is_up() && api.is_up();
    let (status, status_code) = if healthy {
        ("healthy", StatusCode::OK)
    } else {
        ("degraded", StatusCode::SERVICE_UNAVAILABLE)
    };

    let response = HealthResponse {
        status: status.to_string(),
        version: state.version.clone(),
        uptime_secs: state.uptime_secs(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        components: ComponentHealth {
            database,
            cache,
            api,
        },
    };

    (status_code, Json(response))
}

/// 헬스 체크 라우터 생성.
pub fn health_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(health_check))
        .route("/live", get(health_live))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use flow_core::{AnalysisConfig, CacheConfig};
    use flow_data::CacheManager;
    use tower::ServiceExt;

    fn unconfigured_state() -> Arc<AppState> {
        Arc::new(AppState::new(
            AnalysisConfig::default(),
            None,
            None,
            CacheManager::local(&CacheConfig::default()),
        ))
    }

    #[tokio::test]
    async fn test_health_live_returns_ok() {
        let app = Router::new().route("/health/live", get(health_live));

        let response = app
            .oneshot(Request::builder().uri("/health/live").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_reports_unconfigured_components() {
        let app = Router::new()
            .route("/health", get(health_check))
            .with_state(unconfigured_state());

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let health: HealthResponse = serde_json::from_slice(&body).unwrap();

        assert_eq!(health.status, "degraded");
        assert_eq!(health.components.database.status, "not_configured");
        assert_eq!(health.components.api.status, "not_configured");
        assert_eq!(health.components.cache.status, "up");
        assert_eq!(health.components.cache.message.as_deref(), Some("local"));
    }

    #[test]
    fn test_component_status_variants() {
        let up = ComponentStatus::up();
        assert!(up.is_up());
        assert!(up.message.is_none());

        let down = ComponentStatus::down("error");
        assert_eq!(down.status, "down");
        assert_eq!(down.message, Some("error".to_string()));

        assert!(!ComponentStatus::not_configured().is_up());
    }
}
