//! 한국투자증권 (KIS) API 설정.
//!
//! KIS API는 app_key와 app_secret을 사용한 OAuth 2.0 인증이 필요합니다.
//! 시세 조회만 사용하므로 계좌 정보는 필요하지 않습니다.

use flow_core::KisSettings;
use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ExchangeError;

/// KIS API 환경 유형.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KisEnvironment {
    /// 실전투자
    #[default]
    Real,
    /// 모의투자
    Paper,
}

impl KisEnvironment {
    /// 이 환경의 REST API 기본 URL 반환.
    pub fn rest_base_url(&self) -> &'static str {
        match self {
            KisEnvironment::Real => "https://openapi.koreainvestment.com:9443",
            KisEnvironment::Paper => "https://openapivts.koreainvestment.com:29443",
        }
    }
}

impl FromStr for KisEnvironment {
    type Err = ExchangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "real" | "prod" => Ok(KisEnvironment::Real),
            "paper" | "mock" | "test" => Ok(KisEnvironment::Paper),
            other => Err(ExchangeError::ConfigError(format!(
                "Unknown KIS environment '{}': expected real or paper",
                other
            ))),
        }
    }
}

/// KIS API 설정.
pub struct KisConfig {
    /// 앱키
    pub app_key: SecretString,
    /// 앱시크릿
    pub app_secret: SecretString,
    /// 환경 (실전/모의)
    pub environment: KisEnvironment,
    /// 기본 URL 재정의 (프록시, 테스트 서버)
    pub base_url: Option<String>,
    /// 요청 타임아웃 (초)
    pub timeout_secs: u64,
    /// 5xx/연결 오류 시 최대 재시도 횟수
    pub max_retries: u32,
    /// 재시도 기본 지연 (밀리초). 실제 지연은 `retry_delay × 2^attempt`
    pub retry_delay_ms: u64,
}

impl KisConfig {
    /// 새로운 KIS 설정 생성.
    pub fn new(app_key: impl Into<String>, app_secret: impl Into<String>) -> Self {
        Self {
            app_key: SecretString::new(app_key.into().into()),
            app_secret: SecretString::new(app_secret.into().into()),
            environment: KisEnvironment::Real,
            base_url: None,
            timeout_secs: 30,
            max_retries: 3,
            retry_delay_ms: 1000,
        }
    }

    /// 애플리케이션 설정에서 생성합니다.
    ///
    /// # Errors
    /// 앱키/시크릿이 없거나 환경 이름을 알 수 없으면 `ExchangeError::ConfigError`.
    pub fn from_settings(settings: &KisSettings) -> Result<Self, ExchangeError> {
        let app_key = settings
            .app_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ExchangeError::ConfigError("KIS app_key is not configured".to_string()))?;
        let app_secret = settings
            .app_secret
            .clone()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                ExchangeError::ConfigError("KIS app_secret is not configured".to_string())
            })?;

        Ok(Self::new(app_key, app_secret)
            .with_environment(settings.environment.parse()?)
            .with_timeout(settings.timeout_secs)
            .with_retry(settings.max_retries, settings.retry_delay_ms))
    }

    pub fn with_environment(mut self, env: KisEnvironment) -> Self {
        self.environment = env;
        self
    }

    /// 기본 URL 재정의.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_retry(mut self, max_retries: u32, retry_delay_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.retry_delay_ms = retry_delay_ms;
        self
    }

    /// REST API 기본 URL.
    pub fn rest_base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.environment.rest_base_url())
    }

    /// `attempt`번째 재시도 전 대기 시간.
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.retry_delay_ms.saturating_mul(1u64 << attempt.min(16)))
    }

    pub(crate) fn app_key(&self) -> &str {
        self.app_key.expose_secret()
    }

    pub(crate) fn app_secret(&self) -> &str {
        self.app_secret.expose_secret()
    }
}

impl fmt::Debug for KisConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KisConfig")
            .field("app_key", &"[REDACTED]")
            .field("app_secret", &"[REDACTED]")
            .field("environment", &self.environment)
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("retry_delay_ms", &self.retry_delay_ms)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_settings() {
        let settings = KisSettings {
            app_key: Some("PSappkey".to_string()),
            app_secret: Some("secret".to_string()),
            environment: "paper".to_string(),
            ..KisSettings::default()
        };
        let config = KisConfig::from_settings(&settings).unwrap();
        assert_eq!(config.environment, KisEnvironment::Paper);
        assert_eq!(
            config.rest_base_url(),
            "https://openapivts.koreainvestment.com:29443"
        );
        assert_eq!(config.app_key(), "PSappkey");
        assert_eq!(config.max_retries, 3);
    }

    #[test]
    fn test_missing_key_rejected() {
        let settings = KisSettings {
            app_key: None,
            app_secret: Some("secret".to_string()),
            ..KisSettings::default()
        };
        assert!(matches!(
            KisConfig::from_settings(&settings),
            Err(ExchangeError::ConfigError(_))
        ));
    }

    #[test]
    fn test_retry_delay_doubles() {
        let config = KisConfig::new("k", "s").with_retry(3, 1000);
        assert_eq!(config.retry_delay(0), Duration::from_millis(1000));
        assert_eq!(config.retry_delay(1), Duration::from_millis(2000));
        assert_eq!(config.retry_delay(2), Duration::from_millis(4000));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let debug = format!("{:?}", KisConfig::new("PSvisiblekey", "topsecret"));
        assert!(!debug.contains("PSvisiblekey"));
        assert!(!debug.contains("topsecret"));
    }
}
