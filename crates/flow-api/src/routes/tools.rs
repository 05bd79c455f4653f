//! 도구 목록과 호출 endpoint.

use axum::{
    body::Bytes,
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use flow_core::FlowError;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

use crate::envelope;
use crate::state::AppState;

/// 사용 가능한 도구 목록.
///
/// GET /tools
pub async fn list_tools(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({ "tools": state.registry.tools() }))
}

/// 도구 호출. 본문이 비어 있으면 기본 파라미터를 사용합니다.
///
/// POST /tools/{name}
pub async fn call_tool(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    body: Bytes,
) -> impl IntoResponse {
    debug!(tool = %name, bytes = body.len(), "Tool call");

    let response = if body.iter().all(u8::is_ascii_whitespace) {
        state.registry.call(&name, Value::Null).await
    } else {
        match serde_json::from_slice::<Value>(&body) {
            Ok(params) => state.registry.call(&name, params).await,
            Err(e) => envelope::failure(&FlowError::validation("body", e.to_string())),
        }
    };

    (envelope::status_code(&response), Json(response))
}

/// 도구 라우터 생성.
pub fn tools_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_tools))
        .route("/{name}", post(call_tool))
}
