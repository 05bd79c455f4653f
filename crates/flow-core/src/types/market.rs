//! 시장, 투자자 유형, 분석 기간 정의.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::FlowError;

/// 국내 주식 시장 구분.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Market {
    /// 유가증권시장
    Kospi,
    /// 코스닥
    Kosdaq,
    /// 전체 시장
    #[default]
    All,
}

impl Market {
    /// 와이어 문자열.
    pub fn as_str(&self) -> &'static str {
        match self {
            Market::Kospi => "KOSPI",
            Market::Kosdaq => "KOSDAQ",
            Market::All => "ALL",
        }
    }

    /// KIS API의 시장 분류 코드 (`fid_cond_mrkt_div_code`).
    pub fn kis_code(&self) -> &'static str {
        match self {
            Market::Kospi => "J",
            Market::Kosdaq => "Q",
            Market::All => "ALL",
        }
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Market {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "KOSPI" => Ok(Market::Kospi),
            "KOSDAQ" => Ok(Market::Kosdaq),
            "ALL" => Ok(Market::All),
            _ => Err(FlowError::validation(
                "market",
                format!("Invalid market '{}': expected KOSPI, KOSDAQ or ALL", s),
            )),
        }
    }
}

/// 투자자 유형.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InvestorType {
    /// 외국인
    Foreign,
    /// 기관
    Institution,
    /// 개인
    Individual,
    /// 프로그램 매매
    Program,
    /// 전체
    #[default]
    All,
}

impl InvestorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvestorType::Foreign => "FOREIGN",
            InvestorType::Institution => "INSTITUTION",
            InvestorType::Individual => "INDIVIDUAL",
            InvestorType::Program => "PROGRAM",
            InvestorType::All => "ALL",
        }
    }
}

impl fmt::Display for InvestorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvestorType {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FOREIGN" => Ok(InvestorType::Foreign),
            "INSTITUTION" => Ok(InvestorType::Institution),
            "INDIVIDUAL" => Ok(InvestorType::Individual),
            "PROGRAM" => Ok(InvestorType::Program),
            "ALL" => Ok(InvestorType::All),
            _ => Err(FlowError::validation(
                "investor_type",
                format!(
                    "Invalid investor type '{}': expected FOREIGN, INSTITUTION, INDIVIDUAL, PROGRAM or ALL",
                    s
                ),
            )),
        }
    }
}

/// 분석 기간.
///
/// `All`은 네 개의 구체 기간을 모두 분석하라는 요청입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Period {
    /// 1일
    #[serde(rename = "1D")]
    #[default]
    D1,
    /// 5일
    #[serde(rename = "5D")]
    D5,
    /// 20일
    #[serde(rename = "20D")]
    D20,
    /// 60일
    #[serde(rename = "60D")]
    D60,
    /// 전체 기간
    #[serde(rename = "ALL")]
    All,
}

impl Period {
    /// `All`을 제외한 구체 기간 목록.
    pub const CONCRETE: [Period; 4] = [Period::D1, Period::D5, Period::D20, Period::D60];

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::D1 => "1D",
            Period::D5 => "5D",
            Period::D20 => "20D",
            Period::D60 => "60D",
            Period::All => "ALL",
        }
    }

    /// 이력 조회 범위 (시간 단위). `All`은 구체 기간이 아니므로 `None`.
    pub fn history_hours(&self) -> Option<u32> {
        match self {
            Period::D1 => Some(24),
            Period::D5 => Some(120),
            Period::D20 => Some(480),
            Period::D60 => Some(1440),
            Period::All => None,
        }
    }

    /// 단일 기간인지 확인합니다.
    pub fn is_concrete(&self) -> bool {
        !matches!(self, Period::All)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1D" => Ok(Period::D1),
            "5D" => Ok(Period::D5),
            "20D" => Ok(Period::D20),
            "60D" => Ok(Period::D60),
            "ALL" => Ok(Period::All),
            _ => Err(FlowError::validation(
                "period",
                format!("Invalid period '{}': expected 1D, 5D, 20D, 60D or ALL", s),
            )),
        }
    }
}
