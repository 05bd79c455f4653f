//! 도구 응답 봉투.
//!
//! 성공: `{"success": true, "timestamp": ..., ...payload}`
//!
//! 실패: `{"success": false, "error": {"kind": ..., "message": ...}, "timestamp": ...}`
//!
//! `cached: true`는 캐시에서 읽은 응답에만 붙습니다.

use axum::http::StatusCode;
use chrono::Utc;
use flow_core::FlowError;
use serde_json::{json, Map, Value};

/// 페이로드 객체에 성공 표시와 타임스탬프를 붙입니다.
///
/// 페이로드가 객체가 아니면 `data` 필드 아래에 둡니다.
pub fn success(payload: Value) -> Value {
    let mut body = match payload {
        Value::Object(map) => map,
        other => {
            let mut map = Map::new();
            map.insert("data".to_string(), other);
            map
        }
    };
    body.insert("success".to_string(), Value::Bool(true));
    body.insert("timestamp".to_string(), json!(Utc::now().to_rfc3339()));
    Value::Object(body)
}

/// 에러를 실패 봉투로 변환합니다.
pub fn failure(err: &FlowError) -> Value {
    json!({
        "success": false,
        "error": {
            "kind": err.kind(),
            "message": err.to_string(),
        },
        "timestamp": Utc::now().to_rfc3339(),
    })
}

/// 캐시에서 읽은 응답 표시.
pub fn mark_cached(mut envelope: Value) -> Value {
    if let Value::Object(map) = &mut envelope {
        map.insert("cached".to_string(), Value::Bool(true));
    }
    envelope
}

pub fn is_success(envelope: &Value) -> bool {
    envelope.get("success").and_then(Value::as_bool).unwrap_or(false)
}

/// 실패 봉투의 에러 종류.
pub fn error_kind(envelope: &Value) -> Option<&str> {
    envelope.get("error")?.get("kind")?.as_str()
}

/// 봉투에 맞는 HTTP 상태 코드.
pub fn status_code(envelope: &Value) -> StatusCode {
    if is_success(envelope) {
        return StatusCode::OK;
    }
    match error_kind(envelope) {
        Some("VALIDATION_ERROR") => StatusCode::BAD_REQUEST,
        Some("INSUFFICIENT_DATA") => StatusCode::UNPROCESSABLE_ENTITY,
        Some("UPSTREAM_FAILURE") => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
