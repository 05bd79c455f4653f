//! 가격/수급 시계열 전체 흐름 테스트.

use chrono::{DateTime, Duration, TimeZone, Utc};
use flow_analytics::price::Outlook;
use flow_analytics::{
    AnalyticsError, AnomalyDetector, CorrelationEngine, PriceAnalyzer, SignalDirection,
    SignalEngine, TrendAnalyzer, TrendDirection,
};
use flow_core::{AnalysisConfig, FlowSample, PricePoint};

fn at(hour: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 4, 0, 0, 0).unwrap() + Duration::hours(hour)
}

fn rally() -> (Vec<PricePoint>, Vec<FlowSample>) {
    let closes = [78_000.0, 78_200.0, 78_500.0, 79_000.0, 80_000.0];
    let flows = [
        (50_000_000_000, 30_000_000_000),
        (60_000_000_000, 35_000_000_000),
        (70_000_000_000, 40_000_000_000),
        (80_000_000_000, 45_000_000_000),
        (90_000_000_000, 48_000_000_000),
    ];

    let prices = closes
        .iter()
        .enumerate()
        .map(|(i, &c)| PricePoint::new(at(i as i64), c).with_volume(1_000_000 + i as i64 * 100_000))
        .collect();
    let samples = flows
        .iter()
        .enumerate()
        .map(|(i, &(f, inst))| FlowSample::new(at(i as i64), f, inst, -(f + inst)))
        .collect();
    (prices, samples)
}

#[test]
fn test_rally_is_read_as_accumulation() {
    let config = AnalysisConfig::default();
    let (prices, flows) = rally();

    let correlation = CorrelationEngine::from_config(&config)
        .analyze(&prices, &flows)
        .unwrap();
    assert_eq!(correlation.aligned_points, 5);
    assert!(correlation.correlations.smart_money_correlation > 0.7);
    assert!(correlation.correlations.individual_correlation < -0.7);

    let anomalies = AnomalyDetector::from_config(&config).detect_series(&prices, &flows);
    assert!(!anomalies.anomaly_detected);

    let smart: Vec<f64> = flows.iter().map(|f| f.smart_money_net() as f64).collect();
    let (history, current) = smart.split_at(smart.len() - 1);
    let trend = TrendAnalyzer::default().analyze(current[0], history);
    assert_eq!(trend.trend_direction, TrendDirection::Accumulating);

    let last = flows.last().unwrap();
    let signal = SignalEngine::from_config(&config).evaluate(last.foreign_net, last.institution_net, history);
    assert_eq!(signal.signal_direction, SignalDirection::Buy);
    assert_eq!(signal.signal_strength, 10.0);

    let analysis = PriceAnalyzer::new(config).comprehensive(&prices, &flows, &correlation);
    let prediction = analysis.prediction_analysis.unwrap();
    assert_eq!(prediction.predicted_direction, Outlook::Bullish);
    assert!(analysis.volume_price_relationship.is_some());
    assert!(analysis.price_impact_analysis.is_some());
}

#[test]
fn test_analysis_is_repeatable() {
    let config = AnalysisConfig::default();
    let (prices, flows) = rally();
    let engine = CorrelationEngine::from_config(&config);
    let analyzer = PriceAnalyzer::new(config);

    let first = engine.analyze(&prices, &flows).unwrap();
    let second = engine.analyze(&prices, &flows).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        analyzer.comprehensive(&prices, &flows, &first),
        analyzer.comprehensive(&prices, &flows, &second)
    );
}

#[test]
fn test_short_series_is_insufficient() {
    let (prices, flows) = rally();
    let err = CorrelationEngine::from_config(&AnalysisConfig::default())
        .analyze(&prices[..3], &flows[..3])
        .unwrap_err();
    assert_eq!(
        err,
        AnalyticsError::InsufficientData {
            required: 5,
            actual: 3
        }
    );
}

#[test]
fn test_far_apart_series_do_not_align() {
    let (prices, flows) = rally();
    let shifted: Vec<FlowSample> = flows
        .into_iter()
        .map(|mut f| {
            f.timestamp = f.timestamp + Duration::days(2);
            f
        })
        .collect();
    let result = CorrelationEngine::from_config(&AnalysisConfig::default()).analyze(&prices, &shifted);
    assert!(matches!(
        result,
        Err(AnalyticsError::InsufficientData { actual: 0, .. })
    ));
}
