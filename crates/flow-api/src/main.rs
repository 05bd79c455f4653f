//! 투자자 수급 분석 API 서버.
//!
//! 설정 로드 → 로깅 → PostgreSQL 이력 저장소 → 결과 캐시 → KIS 클라이언트 순으로
//! 협력자를 구성하고 HTTP 서버를 시작합니다. 데이터베이스나 KIS 연결에 실패해도
//! 서버는 시작하며, 해당 협력자가 필요한 요청만 실패 봉투로 응답합니다.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{http::StatusCode, Router};
use flow_api::{create_api_router, AppState};
use flow_core::{init_logging, AppConfig, DatabaseConfig, KisSettings, LogConfig};
use flow_data::{CacheManager, Database, HistoryStore, MarketDataSource, PgHistoryStore};
use flow_exchange::{KisConfig, KisInvestorClient, KisOAuth};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load_default().context("설정을 불러오지 못했습니다")?;

    init_logging(LogConfig::from(&config.logging).override_from_env())
        .map_err(|e| anyhow::anyhow!("로깅 초기화 실패: {}", e))?;

    info!("Starting investor flow API server...");

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| {
            format!(
                "소켓 주소가 유효하지 않습니다: {}:{}",
                config.server.host, config.server.port
            )
        })?;

    let history = connect_history_store(&config.database).await;
    let cache = CacheManager::connect(&config.cache).await;
    let market_source = create_market_source(&config.kis);

    let state = Arc::new(AppState::new(
        config.analysis.clone(),
        market_source,
        history,
        cache,
    ));

    info!(
        version = %state.version,
        has_history = state.has_history(),
        has_market_source = state.has_market_source(),
        cache_backend = state.cache.backend(),
        tools = ?state.registry.method_names(),
        "Application state initialized"
    );

    let app = create_router(state);

    info!(%addr, "API server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped gracefully");
    Ok(())
}

/// PostgreSQL에 연결하고 마이그레이션을 실행합니다. 실패하면 이력 없이 동작합니다.
async fn connect_history_store(config: &DatabaseConfig) -> Option<Arc<dyn HistoryStore>> {
    let db = match Database::connect(config).await {
        Ok(db) => db,
        Err(e) => {
            warn!(error = %e, "Database unavailable, running without history store");
            return None;
        }
    };

    if let Err(e) = db.migrate().await {
        error!(error = %e, "Database migration failed, running without history store");
        return None;
    }

    info!("Database connected and migrated");
    Some(Arc::new(PgHistoryStore::new(db)))
}

/// KIS 앱키가 설정되어 있으면 투자자 매매 동향 클라이언트를 만듭니다.
fn create_market_source(settings: &KisSettings) -> Option<Arc<dyn MarketDataSource>> {
    let client = KisConfig::from_settings(settings)
        .and_then(KisOAuth::new)
        .and_then(|oauth| KisInvestorClient::new(Arc::new(oauth)));

    match client {
        Ok(client) => {
            info!(environment = %settings.environment, "KIS client configured");
            Some(Arc::new(client))
        }
        Err(e) => {
            warn!(error = %e, "KIS client not configured, current trading data unavailable");
            None
        }
    }
}

/// CORS 설정.
///
/// `CORS_ORIGINS`(쉼표 구분)가 있으면 해당 origin만, 없으면 모두 허용합니다.
fn cors_layer() -> CorsLayer {
    let allow_origin = match std::env::var("CORS_ORIGINS") {
        Ok(origins) if !origins.is_empty() => {
            let origins: Vec<_> = origins
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();

            if origins.is_empty() {
                warn!("CORS_ORIGINS is set but contains no valid origins, allowing any");
                AllowOrigin::any()
            } else {
                info!("CORS configured with {} allowed origins", origins.len());
                AllowOrigin::list(origins)
            }
        }
        _ => {
            warn!("CORS_ORIGINS not set, allowing any origin (development mode)");
            AllowOrigin::any()
        }
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([axum::http::header::CONTENT_TYPE])
        .max_age(Duration::from_secs(3600))
}

/// 전체 라우터 생성.
fn create_router(state: Arc<AppState>) -> Router {
    create_api_router()
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        // 전역 타임아웃 (30초) - 408 상태 코드 반환
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer(cors_layer())
}

/// Ctrl+C 또는 SIGTERM 수신까지 대기합니다.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
