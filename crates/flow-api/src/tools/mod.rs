//! 분석 도구.
//!
//! 각 도구는 협력자(시장 데이터 소스, 이력 저장소, 캐시)에서 데이터를 가져와
//! `flow-analytics`의 순수 함수로 분석하고 응답 봉투를 만듭니다.
//! 공개 메서드는 실패해도 에러를 반환하지 않고 실패 봉투를 돌려줍니다.

pub mod investor;
pub mod price;

pub use investor::{InvestorTradingRequest, InvestorTradingTool};
pub use price::{PriceAnalysisRequest, PriceAnalysisTool};

use flow_core::{FlowError, FlowResult, StockCode};
use serde_json::{Map, Value};

/// 빈 문자열은 "지정 안 함"으로 취급합니다.
pub(crate) fn optional_stock_code(raw: Option<&str>) -> FlowResult<Option<StockCode>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(code) => StockCode::new(code).map(Some),
    }
}

pub(crate) fn required_stock_code(raw: &str) -> FlowResult<StockCode> {
    optional_stock_code(Some(raw))?
        .ok_or_else(|| FlowError::validation("stock_code", "stock_code is required"))
}

/// 직렬화된 객체의 필드를 `target`에 합칩니다.
pub(crate) fn merge_object(target: &mut Map<String, Value>, value: Value) {
    if let Value::Object(fields) = value {
        target.extend(fields);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_optional_stock_code() {
        assert_eq!(optional_stock_code(None).unwrap(), None);
        assert_eq!(optional_stock_code(Some("")).unwrap(), None);
        assert_eq!(
            optional_stock_code(Some("005930")).unwrap().unwrap().as_str(),
            "005930"
        );
        assert!(optional_stock_code(Some("5930")).is_err());
    }

    #[test]
    fn test_required_stock_code() {
        let err = required_stock_code("").unwrap_err();
        assert_eq!(err.kind(), "VALIDATION_ERROR");
        assert!(required_stock_code("A05930").is_err());
    }

    #[test]
    fn test_merge_object() {
        let mut target = Map::new();
        target.insert("a".to_string(), json!(1));
        merge_object(&mut target, json!({"b": 2}));
        merge_object(&mut target, json!(3));
        assert_eq!(Value::Object(target), json!({"a": 1, "b": 2}));
    }
}
