// Config loading and validation tests

use peerlat::config::AppConfig;
use peerlat::peer_metrics::PeerLatencyCoordinator;

const VALID_CONFIG: &str = r#"
[server]
port = 8090
host = "0.0.0.0"

[node]
name = "10.0.0.1:9866"

[monitoring]
report_interval_secs = 30
stats_log_interval_secs = 300
"#;

const VALID_CONFIG_WITH_WINDOWS: &str = r#"
[server]
port = 8090
host = "0.0.0.0"

[node]
name = "10.0.0.1:9866"

[rolling_window]
window_size_ms = 1000
num_windows = 3

[outliers]
min_population = 12
low_threshold_ms = 7
min_samples = 50

[monitoring]
report_interval_secs = 30
stats_log_interval_secs = 300
evict_interval_secs = 15
"#;

#[test]
fn test_config_loads_from_str() {
    let config = AppConfig::load_from_str(VALID_CONFIG).expect("load_from_str");
    assert_eq!(config.server.port, 8090);
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.node.name, "10.0.0.1:9866");
    assert_eq!(config.monitoring.report_interval_secs, 30);
}

#[test]
fn test_config_defaults_when_omitted() {
    let config = AppConfig::load_from_str(VALID_CONFIG).expect("valid");
    assert_eq!(config.rolling_window.window_size_ms, 300_000);
    assert_eq!(config.rolling_window.num_windows, 36);
    assert_eq!(config.outliers.min_population, 10);
    assert_eq!(config.outliers.low_threshold_ms, 5);
    assert_eq!(config.outliers.min_samples, 1000);
    assert_eq!(config.monitoring.evict_interval_secs, 60);
}

#[test]
fn test_config_loads_explicit_sections() {
    let config = AppConfig::load_from_str(VALID_CONFIG_WITH_WINDOWS).expect("valid");
    let window = config.rolling_window_config();
    assert_eq!(window.window_size_ms, 1000);
    assert_eq!(window.num_windows, 3);
    let outliers = config.outlier_config();
    assert_eq!(outliers.min_population, 12);
    assert_eq!(outliers.low_threshold_ms, 7.0);
    assert_eq!(config.outliers.min_samples, 50);
    assert_eq!(config.monitoring.evict_interval_secs, 15);
}

#[test]
fn test_config_builds_coordinator() {
    let config = AppConfig::load_from_str(VALID_CONFIG_WITH_WINDOWS).expect("valid");
    let metrics = PeerLatencyCoordinator::from_config(&config).expect("coordinator");
    assert_eq!(metrics.name(), "PeerActivity-10.0.0.1-9866");
    assert_eq!(metrics.min_samples(), 50);
    assert_eq!(metrics.aggregator().config().span_ms(), 3000);
}

#[test]
fn test_config_validation_rejects_invalid_port() {
    let bad = VALID_CONFIG.replace("port = 8090", "port = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("server.port"));
}

#[test]
fn test_config_validation_rejects_empty_node_name() {
    let bad = VALID_CONFIG.replace("name = \"10.0.0.1:9866\"", "name = \" \"");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("node.name"));
}

#[test]
fn test_config_requires_node_section() {
    let bad = VALID_CONFIG.replace("[node]\nname = \"10.0.0.1:9866\"\n", "");
    assert!(AppConfig::load_from_str(&bad).is_err());
}

#[test]
fn test_config_validation_rejects_window_size_zero() {
    let bad = VALID_CONFIG_WITH_WINDOWS.replace("window_size_ms = 1000", "window_size_ms = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("window_size_ms"));
}

#[test]
fn test_config_validation_rejects_num_windows_zero() {
    let bad = VALID_CONFIG_WITH_WINDOWS.replace("num_windows = 3", "num_windows = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("num_windows"));
}

#[test]
fn test_config_validation_rejects_min_population_zero() {
    let bad = VALID_CONFIG_WITH_WINDOWS.replace("min_population = 12", "min_population = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("min_population"));
}

#[test]
fn test_config_validation_rejects_min_samples_zero() {
    let bad = VALID_CONFIG_WITH_WINDOWS.replace("min_samples = 50", "min_samples = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("min_samples"));
}

#[test]
fn test_config_validation_rejects_report_interval_zero() {
    let bad = VALID_CONFIG.replace("report_interval_secs = 30", "report_interval_secs = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("report_interval_secs"));
}

#[test]
fn test_config_validation_rejects_stats_log_interval_zero() {
    let bad = VALID_CONFIG.replace(
        "stats_log_interval_secs = 300",
        "stats_log_interval_secs = 0",
    );
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("stats_log_interval_secs"));
}

#[test]
fn test_config_validation_rejects_evict_interval_zero() {
    let bad = VALID_CONFIG_WITH_WINDOWS.replace("evict_interval_secs = 15", "evict_interval_secs = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("evict_interval_secs"));
}

#[test]
fn test_config_validation_rejects_invalid_toml() {
    let err = AppConfig::load_from_str("not valid toml [[[").unwrap_err();
    assert!(!err.to_string().is_empty());
}

#[test]
fn test_config_load_from_file_via_env() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, VALID_CONFIG_WITH_WINDOWS).unwrap();
    unsafe { std::env::set_var("CONFIG_FILE", path.to_str().unwrap()) };
    let result = AppConfig::load();
    unsafe { std::env::remove_var("CONFIG_FILE") };
    let config = result.expect("load from CONFIG_FILE");
    assert_eq!(config.server.port, 8090);
    assert_eq!(config.rolling_window.num_windows, 3);
}
