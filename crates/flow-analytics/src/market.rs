//! 시장 영향도, 시장 심리, 투자자 그룹 분석.
//!
//! 현재 매매 현황([`InvestorSnapshot`]) 한 건과 선택적인 이력으로 계산합니다.

use flow_core::{AnalysisConfig, FlowSample, InvestorSnapshot};
use serde::{Deserialize, Serialize};

use crate::intensity::IntensityClassifier;

/// 그룹 간 상관 분석에 사용하는 최근 이력 수.
const GROUP_HISTORY_WINDOW: usize = 10;

/// 매매 압력.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Pressure {
    BuyingPressure,
    SellingPressure,
    Balanced,
}

/// 스마트 머니 부호에 따른 심리.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Sentiment {
    Bullish,
    Bearish,
    Neutral,
}

/// 시장 영향도.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketImpact {
    /// 0 ~ 10
    pub impact_score: f64,
    /// 0 ~ 1
    pub dominance_factor: f64,
    pub pressure_indicator: Pressure,
    pub market_sentiment: Sentiment,
    pub smart_money_net_flow: i64,
    pub total_activity: f64,
}

/// 시장 전체 매매 개요.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketOverview {
    pub total_foreign_net: i64,
    pub total_institution_net: i64,
    pub total_individual_net: i64,
    pub total_program_net: i64,
    pub smart_money_net: i64,
    pub total_activity_volume: f64,
    pub foreign_ratio: f64,
    pub institution_ratio: f64,
    pub individual_ratio: f64,
}

/// 심리 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SentimentState {
    VeryBullish,
    Bullish,
    Neutral,
    Bearish,
    VeryBearish,
}

/// 시장 심리 지수.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSentiment {
    /// 0 ~ 100, 50이 중립
    pub sentiment_score: f64,
    pub sentiment_state: SentimentState,
    /// 스마트 머니 비중 (%)
    pub smart_money_dominance: f64,
}

/// 투자자 그룹.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvestorGroup {
    Foreign,
    Institution,
    Individual,
}

/// 그룹별 현재 활동.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupActivity {
    pub current_flow: i64,
    pub intensity: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupActivities {
    pub foreign: GroupActivity,
    pub institution: GroupActivity,
    pub individual: GroupActivity,
}

/// 외국인-기관 방향 일치도 라벨.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgreementStrength {
    High,
    Medium,
    Low,
    InsufficientData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupCorrelation {
    /// 이력이 3개 미만이면 없음
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foreign_institution_correlation: Option<f64>,
    pub correlation_strength: AgreementStrength,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Alignment {
    Aligned,
    Divergent,
}

/// 투자자 그룹 분석.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestorGroupAnalysis {
    pub group_activities: GroupActivities,
    pub most_active_group: InvestorGroup,
    pub group_correlation: GroupCorrelation,
    pub smart_money_alignment: Alignment,
}

/// 스마트 머니가 전체 활동에서 차지하는 영향도.
///
/// 전체 활동은 외국인, 기관, 개인 순매수 절대값의 합입니다.
pub fn market_impact(snapshot: &InvestorSnapshot, config: &AnalysisConfig) -> MarketImpact {
    let smart_money = snapshot.smart_money_net();
    let smart = smart_money as f64;
    let total = (snapshot.foreign_net as f64).abs()
        + (snapshot.institution_net as f64).abs()
        + (snapshot.individual_net as f64).abs();

    let (impact_score, dominance_factor) = if total == 0.0 {
        (0.0, 0.0)
    } else {
        (
            (smart.abs() / config.intensity_thresholds.low * 2.0).min(10.0),
            smart.abs() / total,
        )
    };

    let pressure_indicator = if smart > config.smart_money_threshold {
        Pressure::BuyingPressure
    } else if smart < -config.smart_money_threshold {
        Pressure::SellingPressure
    } else {
        Pressure::Balanced
    };

    let market_sentiment = match smart_money.signum() {
        1 => Sentiment::Bullish,
        -1 => Sentiment::Bearish,
        _ => Sentiment::Neutral,
    };

    MarketImpact {
        impact_score,
        dominance_factor,
        pressure_indicator,
        market_sentiment,
        smart_money_net_flow: smart_money,
        total_activity: total,
    }
}

/// 그룹별 순매수 합계와 비중.
pub fn market_overview(snapshot: &InvestorSnapshot) -> MarketOverview {
    let total = snapshot.total_activity();
    let ratio = |amount: i64| {
        if total > 0.0 {
            (amount as f64).abs() / total * 100.0
        } else {
            0.0
        }
    };

    MarketOverview {
        total_foreign_net: snapshot.foreign_net,
        total_institution_net: snapshot.institution_net,
        total_individual_net: snapshot.individual_net,
        total_program_net: snapshot.program_net,
        smart_money_net: snapshot.smart_money_net(),
        total_activity_volume: total,
        foreign_ratio: ratio(snapshot.foreign_net),
        institution_ratio: ratio(snapshot.institution_net),
        individual_ratio: ratio(snapshot.individual_net),
    }
}

/// 스마트 머니 비중으로 0~100 심리 지수를 계산합니다.
pub fn market_sentiment(snapshot: &InvestorSnapshot) -> MarketSentiment {
    let smart = snapshot.smart_money_net() as f64;
    let total = (snapshot.foreign_net as f64).abs()
        + (snapshot.institution_net as f64).abs()
        + (snapshot.individual_net as f64).abs();

    let score = if total == 0.0 {
        50.0
    } else {
        50.0 + smart / total * 50.0
    };

    let state = if score >= 70.0 {
        SentimentState::VeryBullish
    } else if score >= 55.0 {
        SentimentState::Bullish
    } else if score >= 45.0 {
        SentimentState::Neutral
    } else if score >= 30.0 {
        SentimentState::Bearish
    } else {
        SentimentState::VeryBearish
    };

    MarketSentiment {
        sentiment_score: score,
        sentiment_state: state,
        smart_money_dominance: smart.abs() / total.max(1.0) * 100.0,
    }
}

/// 그룹별 활동, 가장 활발한 그룹, 외국인-기관 방향 일치도.
pub fn investor_groups(
    snapshot: &InvestorSnapshot,
    history: &[FlowSample],
    classifier: &IntensityClassifier,
) -> InvestorGroupAnalysis {
    let activity = |flow: i64| GroupActivity {
        current_flow: flow,
        intensity: classifier.level(flow as f64),
    };

    // 동률이면 외국인, 기관, 개인 순
    let candidates = [
        (InvestorGroup::Foreign, snapshot.foreign_net),
        (InvestorGroup::Institution, snapshot.institution_net),
        (InvestorGroup::Individual, snapshot.individual_net),
    ];
    let mut most_active = candidates[0];
    for candidate in &candidates[1..] {
        if candidate.1.unsigned_abs() > most_active.1.unsigned_abs() {
            most_active = *candidate;
        }
    }

    let aligned = (snapshot.foreign_net as i128) * (snapshot.institution_net as i128) >= 0;

    InvestorGroupAnalysis {
        group_activities: GroupActivities {
            foreign: activity(snapshot.foreign_net),
            institution: activity(snapshot.institution_net),
            individual: activity(snapshot.individual_net),
        },
        most_active_group: most_active.0,
        group_correlation: group_agreement(history),
        smart_money_alignment: if aligned {
            Alignment::Aligned
        } else {
            Alignment::Divergent
        },
    }
}

/// 최근 이력에서 외국인과 기관의 순매수 부호가 일치한 비율.
pub fn group_agreement(history: &[FlowSample]) -> GroupCorrelation {
    if history.len() < 3 {
        return GroupCorrelation {
            foreign_institution_correlation: None,
            correlation_strength: AgreementStrength::InsufficientData,
        };
    }

    let recent = &history[history.len().saturating_sub(GROUP_HISTORY_WINDOW)..];
    let agree = recent
        .iter()
        .filter(|s| (s.foreign_net > 0) == (s.institution_net > 0))
        .count();
    let ratio = agree as f64 / recent.len() as f64;

    let strength = if ratio > 0.7 {
        AgreementStrength::High
    } else if ratio > 0.4 {
        AgreementStrength::Medium
    } else {
        AgreementStrength::Low
    };

    GroupCorrelation {
        foreign_institution_correlation: Some(ratio),
        correlation_strength: strength,
    }
}
