//! KIS 거래 ID (tr_id).

/// 종목별 투자자 매매 동향
pub const INVESTOR_TRADING_STOCK: &str = "FHKST130200000";

/// 시장 전체 투자자 매매 동향
pub const INVESTOR_TRADING_MARKET: &str = "FHKST130100000";

/// 프로그램 매매 동향
pub const PROGRAM_TRADING: &str = "FHKST130300000";
