//! KIS 투자자별/프로그램 매매 동향 클라이언트.
//!
//! 5xx 응답과 연결/타임아웃 오류는 `retry_delay × 2^attempt` 간격으로
//! 최대 `max_retries`회 재시도합니다. 429와 401은 재시도하지 않습니다.

use async_trait::async_trait;
use chrono::Utc;
use chrono_tz::Asia::Seoul;
use flow_core::{FlowResult, InvestorSnapshot, Market, StockCode};
use flow_data::MarketDataSource;
use reqwest::{Client, StatusCode};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, error, instrument, warn};

use super::auth::KisOAuth;
use super::tr_id;
use crate::error::{ExchangeError, Result};

/// 재시도 대상 HTTP 상태 코드.
const RETRYABLE_STATUS: [u16; 4] = [500, 502, 503, 504];

const INVESTOR_TRADING_PATH: &str = "/uapi/domestic-stock/v1/trading/investor-trading";
const PROGRAM_TRADING_PATH: &str = "/uapi/domestic-stock/v1/trading/program-trading";

/// KIS 공통 응답 봉투.
#[derive(Debug, Deserialize)]
struct KisResponse<T> {
    #[serde(default = "default_rt_cd")]
    rt_cd: String,
    #[serde(default)]
    msg_cd: String,
    #[serde(default)]
    msg1: String,
    #[serde(default = "Vec::new")]
    output: Vec<T>,
}

fn default_rt_cd() -> String {
    "1".to_string()
}

/// 투자자별 매매 동향 행. 금액/수량은 문자열로 전달됩니다.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InvestorTradingRow {
    /// 영업일자 (YYYYMMDD)
    pub stck_bsop_date: String,
    pub stck_code: String,
    pub stck_name: String,
    /// 외국인 순매수 수량
    pub frgn_ntby_qty: String,
    /// 외국인 순매수 거래대금
    pub frgn_ntby_tr_pbmn: String,
    /// 외국인 보유 비율
    pub hts_frgn_ehrt: String,
    pub inst_ntby_qty: String,
    pub inst_ntby_tr_pbmn: String,
    pub indv_ntby_qty: String,
    pub indv_ntby_tr_pbmn: String,
}

impl InvestorTradingRow {
    /// 현재 매매 현황으로 변환합니다.
    ///
    /// # Errors
    /// 금액 필드가 숫자가 아니면 `ExchangeError::ParseError`.
    pub fn to_snapshot(&self, stock_code: Option<StockCode>) -> Result<InvestorSnapshot> {
        let mut snapshot = InvestorSnapshot::empty(Utc::now());
        snapshot.stock_code = stock_code;
        snapshot.stock_name = Some(self.stck_name.trim())
            .filter(|n| !n.is_empty())
            .map(str::to_string);
        snapshot.foreign_net = parse_amount("frgn_ntby_tr_pbmn", &self.frgn_ntby_tr_pbmn)?;
        snapshot.institution_net = parse_amount("inst_ntby_tr_pbmn", &self.inst_ntby_tr_pbmn)?;
        snapshot.individual_net = parse_amount("indv_ntby_tr_pbmn", &self.indv_ntby_tr_pbmn)?;
        Ok(snapshot)
    }
}

/// 프로그램 매매 동향 행.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProgramTradingRow {
    pub stck_bsop_date: String,
    /// 전체 합계 순매수 거래대금
    pub whol_smtn_ntby_tr_pbmn: String,
}

impl ProgramTradingRow {
    pub fn net_amount(&self) -> Result<i64> {
        parse_amount("whol_smtn_ntby_tr_pbmn", &self.whol_smtn_ntby_tr_pbmn)
    }
}

/// 금액 문자열 파싱. 빈 문자열은 0입니다.
///
/// `"1200.00"`처럼 소수부가 0이면 허용하고, 소수부가 있거나 i64 범위를
/// 벗어나면 `ParseError`입니다.
fn parse_amount(field: &str, raw: &str) -> Result<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }

    let amount = Decimal::from_str(trimmed)
        .map_err(|_| ExchangeError::ParseError(format!("{} is not a number: '{}'", field, raw)))?;
    if !amount.fract().is_zero() {
        return Err(ExchangeError::ParseError(format!(
            "{} has a fractional amount: '{}'",
            field, raw
        )));
    }
    amount
        .to_i64()
        .ok_or_else(|| ExchangeError::ParseError(format!("{} is out of range: '{}'", field, raw)))
}

/// KIS 투자자 매매 동향 REST 클라이언트.
pub struct KisInvestorClient {
    oauth: Arc<KisOAuth>,
    client: Client,
}

impl KisInvestorClient {
    /// 공유된 OAuth로 클라이언트를 생성합니다.
    pub fn new(oauth: Arc<KisOAuth>) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(oauth.config().timeout_secs))
            .build()
            .map_err(|e| ExchangeError::NetworkError(format!("HTTP client 생성 실패: {}", e)))?;

        Ok(Self { oauth, client })
    }

    /// 투자자별 매매 동향 조회.
    ///
    /// # 인자
    /// * `stock_code` - 종목코드. 없으면 시장 전체
    /// * `market` - 시장 구분 (종목 조회 시 무시)
    #[instrument(skip(self))]
    pub async fn investor_trading(
        &self,
        stock_code: Option<&StockCode>,
        market: Market,
    ) -> Result<Vec<InvestorTradingRow>> {
        let (tr_id, query) = match stock_code {
            Some(code) => (
                tr_id::INVESTOR_TRADING_STOCK,
                vec![
                    ("fid_cond_mrkt_div_code", "J".to_string()),
                    ("fid_input_iscd", code.as_str().to_string()),
                ],
            ),
            None => (
                tr_id::INVESTOR_TRADING_MARKET,
                vec![("fid_cond_mrkt_div_code", market.kis_code().to_string())],
            ),
        };

        self.get(INVESTOR_TRADING_PATH, tr_id, &query).await
    }

    /// 당일 프로그램 매매 동향 조회.
    #[instrument(skip(self))]
    pub async fn program_trading(&self, market: Market) -> Result<Vec<ProgramTradingRow>> {
        let today = Utc::now().with_timezone(&Seoul).format("%Y%m%d").to_string();
        let query = vec![
            ("fid_cond_mrkt_div_code", market.kis_code().to_string()),
            ("fid_input_date_1", today),
        ];

        self.get(PROGRAM_TRADING_PATH, tr_id::PROGRAM_TRADING, &query).await
    }

    /// 재시도 정책을 적용한 GET 요청 후 `output` 배열을 반환합니다.
    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        tr_id: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>> {
        let config = self.oauth.config();
        let url = format!("{}{}", config.rest_base_url(), path);
        let mut attempt: u32 = 0;

        let body = loop {
            let headers = self.oauth.build_headers(tr_id).await?;
            let sent = self.client.get(&url).headers(headers).query(query).send().await;

            match sent {
                Ok(response) => {
                    let status = response.status();
                    let body = response.text().await?;

                    if status.is_success() {
                        break body;
                    }
                    match status {
                        StatusCode::TOO_MANY_REQUESTS => return Err(ExchangeError::RateLimited),
                        StatusCode::UNAUTHORIZED => return Err(ExchangeError::Unauthorized(body)),
                        s if RETRYABLE_STATUS.contains(&s.as_u16()) && attempt < config.max_retries => {
                            warn!(status = %s, attempt, tr_id, "KIS server error, retrying");
                        }
                        s => {
                            error!("KIS request failed: {} - {}", s, body);
                            return Err(ExchangeError::ApiError {
                                code: s.as_u16() as i32,
                                message: body,
                            });
                        }
                    }
                }
                Err(e) if (e.is_connect() || e.is_timeout()) && attempt < config.max_retries => {
                    warn!(error = %e, attempt, tr_id, "KIS request failed, retrying");
                }
                Err(e) => return Err(e.into()),
            }

            tokio::time::sleep(config.retry_delay(attempt)).await;
            attempt += 1;
        };

        debug!(tr_id, "KIS response: {}", body);

        let resp: KisResponse<T> = serde_json::from_str(&body)
            .map_err(|e| ExchangeError::ParseError(format!("Failed to parse response: {}", e)))?;

        if resp.rt_cd != "0" {
            return Err(ExchangeError::ApiError {
                code: resp.msg_cd.parse().unwrap_or(-1),
                message: resp.msg1,
            });
        }

        Ok(resp.output)
    }
}

#[async_trait]
impl MarketDataSource for KisInvestorClient {
    fn name(&self) -> &str {
        "kis"
    }

    async fn current_snapshot(
        &self,
        stock_code: Option<&StockCode>,
        market: Market,
    ) -> FlowResult<Option<InvestorSnapshot>> {
        let rows = self.investor_trading(stock_code, market).await?;
        let Some(first) = rows.first() else {
            return Ok(None);
        };
        let mut snapshot = first.to_snapshot(stock_code.cloned())?;

        // 시장 전체 조회는 프로그램 매매를 함께 반영
        if stock_code.is_none() {
            match self.program_trading(market).await {
                Ok(program) => {
                    if let Some(row) = program.first() {
                        snapshot.program_net = row.net_amount()?;
                    }
                }
                Err(e) => warn!(error = %e, "Program trading unavailable, using 0"),
            }
        }

        Ok(Some(snapshot))
    }

    async fn health_check(&self) -> bool {
        self.oauth.get_token().await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("f", "").unwrap(), 0);
        assert_eq!(parse_amount("f", "  ").unwrap(), 0);
        assert_eq!(parse_amount("f", "-1500").unwrap(), -1500);
        assert_eq!(parse_amount("f", "1200.0").unwrap(), 1200);
        assert_eq!(parse_amount("f", "-35000000000.00").unwrap(), -35_000_000_000);
        assert!(matches!(
            parse_amount("f", "abc"),
            Err(ExchangeError::ParseError(_))
        ));
    }

    #[test]
    fn test_parse_amount_rejects_lossy_values() {
        assert!(matches!(
            parse_amount("f", "1200.5"),
            Err(ExchangeError::ParseError(_))
        ));
        // i64::MAX + 1
        assert!(matches!(
            parse_amount("f", "9223372036854775808"),
            Err(ExchangeError::ParseError(_))
        ));
    }

    #[test]
    fn test_row_to_snapshot() {
        let row = InvestorTradingRow {
            stck_bsop_date: "20240304".to_string(),
            stck_name: "삼성전자".to_string(),
            frgn_ntby_tr_pbmn: "15000".to_string(),
            inst_ntby_tr_pbmn: "".to_string(),
            indv_ntby_tr_pbmn: "-15000".to_string(),
            ..Default::default()
        };
        let code = StockCode::new("005930").unwrap();
        let snapshot = row.to_snapshot(Some(code.clone())).unwrap();
        assert_eq!(snapshot.stock_code, Some(code));
        assert_eq!(snapshot.stock_name.as_deref(), Some("삼성전자"));
        assert_eq!(snapshot.foreign_net, 15000);
        assert_eq!(snapshot.institution_net, 0);
        assert_eq!(snapshot.individual_net, -15000);
        assert_eq!(snapshot.program_net, 0);
    }

    #[test]
    fn test_envelope_defaults() {
        let resp: KisResponse<InvestorTradingRow> = serde_json::from_str("{}").unwrap();
        assert_eq!(resp.rt_cd, "1");
        assert!(resp.output.is_empty());
    }
}
