//! 한국투자증권(KIS) Open API 커넥터.
//!
//! 투자자별 매매 동향과 프로그램 매매 동향을 조회하고,
//! 그 결과를 [`flow_data::MarketDataSource`]로 제공합니다.

pub mod error;
pub mod kis;

pub use error::{ExchangeError, Result};
pub use kis::{KisConfig, KisEnvironment, KisInvestorClient, KisOAuth, TokenState};
