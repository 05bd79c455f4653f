//! KIS OAuth 2.0 인증 모듈.
//!
//! 접근 토큰 발급(POST /oauth2/tokenP)과 갱신, 요청 헤더 구성을 담당합니다.

use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Asia::Seoul;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use super::config::KisConfig;
use crate::error::{ExchangeError, Result};

/// 토큰 갱신 임계값 (남은 시간이 이 값보다 적으면 갱신).
const TOKEN_REFRESH_THRESHOLD_HOURS: i64 = 1;

/// KIS OAuth 토큰 응답.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    /// 접근 토큰
    pub access_token: String,
    /// 토큰 타입 (항상 "Bearer")
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// 토큰 만료 시간 (초)
    #[serde(default)]
    pub expires_in: i64,
    /// 접근 토큰 만료 시각 (KIS 형식: "YYYY-MM-DD HH:MM:SS", KST)
    #[serde(default)]
    pub access_token_token_expired: Option<String>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// KIS OAuth 오류 응답 (토큰 발급 실패 시).
#[derive(Debug, Clone, Deserialize)]
pub struct KisOAuthErrorResponse {
    /// 에러 코드 (예: "EGW00103")
    pub error_code: String,
    /// 에러 설명
    pub error_description: String,
}

/// 만료 추적이 포함된 토큰 상태.
#[derive(Debug, Clone)]
pub struct TokenState {
    pub access_token: String,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
}

impl TokenState {
    /// 토큰이 만료되었거나 곧 만료되는지 확인.
    pub fn is_expired_or_expiring(&self) -> bool {
        let threshold = Utc::now() + Duration::hours(TOKEN_REFRESH_THRESHOLD_HOURS);
        self.expires_at <= threshold
    }

    /// 인증 헤더 값 반환.
    pub fn auth_header(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }
}

/// KIS OAuth 인증 관리자.
///
/// 토큰은 만료 1시간 전까지 재사용됩니다.
pub struct KisOAuth {
    config: KisConfig,
    client: Client,
    token: RwLock<Option<TokenState>>,
}

impl KisOAuth {
    /// 새로운 OAuth 관리자 생성.
    ///
    /// # Errors
    /// HTTP 클라이언트 생성에 실패하면 `ExchangeError::NetworkError`를 반환합니다.
    pub fn new(config: KisConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ExchangeError::NetworkError(format!("HTTP client 생성 실패: {}", e)))?;

        Ok(Self {
            config,
            client,
            token: RwLock::new(None),
        })
    }

    pub fn config(&self) -> &KisConfig {
        &self.config
    }

    /// 유효한 접근 토큰 반환, 필요시 갱신.
    pub async fn get_token(&self) -> Result<TokenState> {
        {
            let token_guard = self.token.read().await;
            match token_guard.as_ref() {
                Some(token) if !token.is_expired_or_expiring() => {
                    debug!("Using cached KIS token (expires at: {})", token.expires_at);
                    return Ok(token.clone());
                }
                Some(token) => warn!(
                    "KIS token expired or expiring soon (expires at: {}), refreshing...",
                    token.expires_at
                ),
                None => info!("No cached KIS token found, requesting new token..."),
            }
        }

        self.refresh_token().await
    }

    /// 접근 토큰 강제 갱신.
    pub async fn refresh_token(&self) -> Result<TokenState> {
        if self.config.app_key().is_empty() || self.config.app_secret().is_empty() {
            return Err(ExchangeError::Unauthorized(
                "KIS app_key/app_secret이 설정되지 않았습니다.".to_string(),
            ));
        }

        let url = format!("{}/oauth2/tokenP", self.config.rest_base_url());

        #[derive(Serialize)]
        struct TokenRequest<'a> {
            grant_type: &'a str,
            appkey: &'a str,
            appsecret: &'a str,
        }

        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json; charset=utf-8")
            .json(&TokenRequest {
                grant_type: "client_credentials",
                appkey: self.config.app_key(),
                appsecret: self.config.app_secret(),
            })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            error!("Token request failed: {} - {}", status, body);

            if let Ok(oauth_error) = serde_json::from_str::<KisOAuthErrorResponse>(&body) {
                let message = match oauth_error.error_code.as_str() {
                    "EGW00103" => "유효하지 않은 AppKey입니다.".to_string(),
                    "EGW00102" => "AppKey가 만료되었습니다.".to_string(),
                    "EGW00101" => "AppSecret이 일치하지 않습니다.".to_string(),
                    _ => format!("{} ({})", oauth_error.error_description, oauth_error.error_code),
                };
                return Err(ExchangeError::Unauthorized(message));
            }

            return Err(ExchangeError::Unauthorized(format!(
                "Token request failed: {}",
                body
            )));
        }

        let token_resp: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            ExchangeError::ParseError(format!("Failed to parse token response: {}", e))
        })?;

        let expires_at = token_resp
            .access_token_token_expired
            .as_deref()
            .and_then(parse_kis_datetime)
            .unwrap_or_else(|| Utc::now() + Duration::seconds(token_resp.expires_in));

        let token_state = TokenState {
            access_token: token_resp.access_token,
            token_type: token_resp.token_type,
            expires_at,
        };

        *self.token.write().await = Some(token_state.clone());

        info!(
            "KIS access token obtained, expires at: {}",
            token_state.expires_at
        );

        Ok(token_state)
    }

    /// 시세 조회 요청 헤더를 구성합니다.
    ///
    /// # Errors
    /// 헤더 값에 허용되지 않는 문자가 있으면 `ExchangeError::ParseError`를 반환합니다.
    pub async fn build_headers(&self, tr_id: &str) -> Result<HeaderMap> {
        let token = self.get_token().await?;

        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/json; charset=utf-8"),
        );
        headers.insert("authorization", header_value("authorization", &token.auth_header())?);
        headers.insert("appkey", header_value("appkey", self.config.app_key())?);
        headers.insert("appsecret", header_value("appsecret", self.config.app_secret())?);
        headers.insert("tr_id", header_value("tr_id", tr_id)?);
        headers.insert("custtype", HeaderValue::from_static("P"));

        Ok(headers)
    }
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|_| ExchangeError::ParseError(format!("{}에 유효하지 않은 문자 포함", name)))
}

/// KIS 시각 문자열(KST)을 UTC로 변환합니다.
fn parse_kis_datetime(s: &str) -> Option<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").ok()?;
    let kst = Seoul.from_local_datetime(&naive).single()?;
    Some(kst.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_token_state_expiry() {
        let token = TokenState {
            access_token: "test".to_string(),
            token_type: "Bearer".to_string(),
            expires_at: Utc::now() + Duration::hours(24),
        };
        assert!(!token.is_expired_or_expiring());
        assert_eq!(token.auth_header(), "Bearer test");

        let expiring = TokenState {
            expires_at: Utc::now() + Duration::minutes(30),
            ..token
        };
        assert!(expiring.is_expired_or_expiring());
    }

    #[test]
    fn test_parse_kis_datetime() {
        let dt = parse_kis_datetime("2024-03-05 09:30:00").unwrap();
        // KST 09:30 = UTC 00:30
        assert_eq!(dt.hour(), 0);
        assert_eq!(dt.minute(), 30);
        assert!(parse_kis_datetime("20240305").is_none());
    }
}
