//! 한국투자증권 REST API.

pub mod auth;
pub mod config;
pub mod investor;
pub mod tr_id;

pub use auth::{KisOAuth, TokenState};
pub use config::{KisConfig, KisEnvironment};
pub use investor::{InvestorTradingRow, KisInvestorClient, ProgramTradingRow};
