//! 설정 파일 로딩 통합 테스트.

use flow_core::{AppConfig, FlowError};
use std::io::Write;

fn write_temp_config(name: &str, contents: &str) -> std::path::PathBuf {
    let path = std::env::temp_dir().join(format!("flow-core-{}-{}.toml", name, std::process::id()));
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    path
}

#[test]
fn test_load_overrides_selected_fields() {
    let path = write_temp_config(
        "partial",
        r#"
[server]
port = 9100

[analysis]
anomaly_sensitivity = 3.0
min_data_points = 8

[analysis.intensity_thresholds]
low = 2e9
"#,
    );

    let config = AppConfig::load(&path).unwrap();
    assert_eq!(config.server.port, 9100);
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.analysis.anomaly_sensitivity, 3.0);
    assert_eq!(config.analysis.min_data_points, 8);
    assert_eq!(config.analysis.intensity_thresholds.low, 2e9);
    assert_eq!(config.analysis.intensity_thresholds.medium, 5e9);
    assert_eq!(config.cache.local_capacity, 1000);

    std::fs::remove_file(path).ok();
}

#[test]
fn test_missing_file_uses_defaults() {
    let config = AppConfig::load("/nonexistent/flow-config.toml").unwrap();
    assert_eq!(config.analysis.correlation_significance_alpha, 0.05);
    assert_eq!(config.kis.max_retries, 3);
}

#[test]
fn test_invalid_thresholds_rejected() {
    let path = write_temp_config(
        "invalid",
        r#"
[analysis.intensity_thresholds]
low = 6e9
"#,
    );

    let err = AppConfig::load(&path).unwrap_err();
    assert!(matches!(err, FlowError::Config(_)));

    std::fs::remove_file(path).ok();
}
