//! 도구 레지스트리.
//!
//! 메서드 이름과 JSON 파라미터를 받아 해당 도구를 호출하고 응답 봉투를 돌려줍니다.

use flow_core::FlowError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::envelope;
use crate::tools::{
    InvestorTradingRequest, InvestorTradingTool, PriceAnalysisRequest, PriceAnalysisTool,
};

pub const GET_INVESTOR_TRADING: &str = "get_investor_trading";
pub const CALCULATE_PRICE_CORRELATION: &str = "calculate_price_correlation";
pub const GENERATE_COMPREHENSIVE_ANALYSIS: &str = "generate_comprehensive_analysis";

/// 도구 목록 항목.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

/// 메서드 이름으로 도구를 찾아 호출합니다.
#[derive(Clone)]
pub struct ToolRegistry {
    investor: InvestorTradingTool,
    price: PriceAnalysisTool,
}

impl ToolRegistry {
    pub fn new(investor: InvestorTradingTool, price: PriceAnalysisTool) -> Self {
        Self { investor, price }
    }

    /// 등록된 메서드 이름 목록.
    pub fn method_names(&self) -> Vec<&'static str> {
        self.tools().into_iter().map(|tool| tool.name).collect()
    }

    /// 사용 가능한 도구와 입력 스키마.
    pub fn tools(&self) -> Vec<ToolDescriptor> {
        let periods = json!(["1D", "5D", "20D", "60D"]);
        let price_schema = json!({
            "type": "object",
            "required": ["stock_code"],
            "properties": {
                "stock_code": {"type": "string", "description": "종목코드 (6자리)"},
                "period": {"type": "string", "enum": periods},
                "use_cache": {"type": "boolean"}
            }
        });

        vec![
            ToolDescriptor {
                name: GET_INVESTOR_TRADING,
                description: "투자자별 매매 동향 조회 및 분석",
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "stock_code": {"type": "string", "description": "종목코드 (6자리, 없으면 시장 전체)"},
                        "investor_type": {
                            "type": "string",
                            "enum": ["FOREIGN", "INSTITUTION", "INDIVIDUAL", "PROGRAM", "ALL"]
                        },
                        "period": {"type": "string", "enum": ["1D", "5D", "20D", "60D", "ALL"]},
                        "market": {"type": "string", "enum": ["ALL", "KOSPI", "KOSDAQ"]},
                        "include_analysis": {"type": "boolean"},
                        "use_cache": {"type": "boolean"}
                    }
                }),
            },
            ToolDescriptor {
                name: CALCULATE_PRICE_CORRELATION,
                description: "가격과 투자자 수급의 상관관계 분석",
                input_schema: price_schema.clone(),
            },
            ToolDescriptor {
                name: GENERATE_COMPREHENSIVE_ANALYSIS,
                description: "가격-수급 종합 분석 보고서",
                input_schema: price_schema,
            },
        ]
    }

    /// 메서드를 호출합니다. 알 수 없는 메서드나 잘못된 파라미터는 검증 실패 봉투가 됩니다.
    pub async fn call(&self, method: &str, params: Value) -> Value {
        match method {
            GET_INVESTOR_TRADING => match parse_params::<InvestorTradingRequest>(params) {
                Ok(request) => self.investor.get_investor_trading(request).await,
                Err(e) => envelope::failure(&e),
            },
            CALCULATE_PRICE_CORRELATION => match parse_params::<PriceAnalysisRequest>(params) {
                Ok(request) => self.price.calculate_price_correlation(request).await,
                Err(e) => envelope::failure(&e),
            },
            GENERATE_COMPREHENSIVE_ANALYSIS => match parse_params::<PriceAnalysisRequest>(params) {
                Ok(request) => self.price.generate_comprehensive_analysis(request).await,
                Err(e) => envelope::failure(&e),
            },
            unknown => {
                warn!(method = unknown, "Unknown tool method");
                envelope::failure(&FlowError::validation(
                    "method",
                    format!("Unknown method '{}'", unknown),
                ))
            }
        }
    }
}

/// `null`은 빈 객체로 취급합니다.
fn parse_params<T: DeserializeOwned>(params: Value) -> Result<T, FlowError> {
    let params = if params.is_null() { json!({}) } else { params };
    serde_json::from_value(params).map_err(|e| FlowError::validation("params", e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_params_null_is_default() {
        let request: InvestorTradingRequest = parse_params(Value::Null).unwrap();
        assert_eq!(request.period, "1D");
    }

    #[test]
    fn test_parse_params_type_mismatch() {
        let err = parse_params::<PriceAnalysisRequest>(json!({"stock_code": 5930})).unwrap_err();
        assert_eq!(err.kind(), "VALIDATION_ERROR");
    }
}
