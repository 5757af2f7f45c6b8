// Integration tests: HTTP ingest and query endpoints

use axum_test::TestServer;
use peerlat::config::AppConfig;
use peerlat::models::{AveragesReport, IngestAck, OutliersReport};
use peerlat::peer_metrics::PeerLatencyCoordinator;
use peerlat::routes;
use std::sync::Arc;

const TEST_CONFIG: &str = r#"
[server]
port = 8090
host = "0.0.0.0"

[node]
name = "10.0.0.1:9866"

[rolling_window]
window_size_ms = 60000
num_windows = 3

[outliers]
min_population = 10
low_threshold_ms = 5
min_samples = 1

[monitoring]
report_interval_secs = 30
stats_log_interval_secs = 300
"#;

fn test_app() -> (axum::Router, Arc<PeerLatencyCoordinator>) {
    let config = AppConfig::load_from_str(TEST_CONFIG).unwrap();
    let metrics = Arc::new(PeerLatencyCoordinator::from_config(&config).unwrap());
    (routes::app(metrics.clone(), config), metrics)
}

#[tokio::test]
async fn test_root_endpoint() {
    let (app, _) = test_app();
    let server = TestServer::new(app);
    let response = server.get("/").await;
    response.assert_status_ok();
    response.assert_text("peerlat: peer latency monitor");
}

#[tokio::test]
async fn test_version_endpoint() {
    let (app, _) = test_app();
    let server = TestServer::new(app);
    let response = server.get("/version").await;
    response.assert_status_ok();
    let json: serde_json::Value = response.json();
    assert_eq!(json.get("name").and_then(|v| v.as_str()), Some("peerlat"));
    assert!(json.get("version").and_then(|v| v.as_str()).is_some());
}

#[tokio::test]
async fn test_config_endpoint() {
    let (app, _) = test_app();
    let server = TestServer::new(app);
    let json: serde_json::Value = server.get("/api/config").await.json();
    assert_eq!(json["name"], "PeerActivity-10.0.0.1-9866");
    assert_eq!(json["windowSizeMs"], 60000);
    assert_eq!(json["numWindows"], 3);
    assert_eq!(json["minPopulation"], 10);
}

#[tokio::test]
async fn test_ingest_then_averages() {
    let (app, _) = test_app();
    let server = TestServer::new(app);
    for ms in [10, 20, 30] {
        let response = server
            .post("/api/peers/latency")
            .json(&serde_json::json!({ "peer": "P1", "elapsedMs": ms }))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<IngestAck>().accepted, 1);
    }
    let report: AveragesReport = server.get("/api/peers/averages").await.json();
    assert_eq!(report.name, "PeerActivity-10.0.0.1-9866");
    assert_eq!(report.averages["P1"].average, 20.0);
    assert_eq!(report.averages["P1"].count, 3);
}

#[tokio::test]
async fn test_averages_json_is_camel_case() {
    let (app, metrics) = test_app();
    metrics.record_latency("P1", 4);
    let server = TestServer::new(app);
    let json: serde_json::Value = server.get("/api/peers/averages").await.json();
    assert_eq!(json["minSamples"], 1);
    assert_eq!(json["averages"]["P1"]["count"], 1);
    assert_eq!(json["averages"]["P1"]["average"], 4.0);
}

#[tokio::test]
async fn test_ingest_rejects_empty_peer() {
    let (app, metrics) = test_app();
    let server = TestServer::new(app);
    let response = server
        .post("/api/peers/latency")
        .json(&serde_json::json!({ "peer": "", "elapsedMs": 3 }))
        .await;
    response.assert_status_bad_request();
    assert!(metrics.aggregator().is_empty());
}

#[tokio::test]
async fn test_ingest_rejects_negative_latency() {
    let (app, metrics) = test_app();
    let server = TestServer::new(app);
    let response = server
        .post("/api/peers/latency")
        .json(&serde_json::json!({ "peer": "P1", "elapsedMs": -3 }))
        .expect_failure()
        .await;
    assert!(response.status_code().is_client_error());
    assert!(metrics.aggregator().is_empty());
}

#[tokio::test]
async fn test_batch_ingest_and_outliers() {
    let (app, _) = test_app();
    let server = TestServer::new(app);
    let mut samples: Vec<serde_json::Value> = (0..11)
        .map(|i| serde_json::json!({ "peer": format!("[10.0.0.{}:9866]", i), "elapsedMs": 5 }))
        .collect();
    samples.push(serde_json::json!({ "peer": "[10.0.0.99:9866]", "elapsedMs": 500 }));
    samples.push(serde_json::json!({ "peer": "", "elapsedMs": 1 }));

    let response = server
        .post("/api/peers/latency/batch")
        .json(&serde_json::json!({ "samples": samples }))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<IngestAck>().accepted, 12);

    let report: OutliersReport = server.get("/api/peers/outliers").await.json();
    assert_eq!(report.population, 12);
    assert_eq!(report.outliers.len(), 1);
    assert_eq!(report.outliers["[10.0.0.99:9866]"], 500.0);
}

#[tokio::test]
async fn test_batch_ingest_counts_only_merged_samples() {
    let (app, metrics) = test_app();
    // Moves "behind" far past the span, so a batch sample at the current time is late.
    metrics.record_latency_at("behind", 5, 10_000_000);
    let server = TestServer::new(app);
    let response = server
        .post("/api/peers/latency/batch")
        .json(&serde_json::json!({ "samples": [
            { "peer": "behind", "elapsedMs": 7 },
            { "peer": "P1", "elapsedMs": 9 }
        ] }))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<IngestAck>().accepted, 1);
    assert_eq!(metrics.aggregator().late_samples_dropped(), 1);
}

#[tokio::test]
async fn test_outliers_empty_for_small_population() {
    let (app, metrics) = test_app();
    for (i, ms) in [1, 50, 500, 5_000, 50_000].iter().enumerate() {
        metrics.record_latency(&format!("p{}", i), *ms);
    }
    let server = TestServer::new(app);
    let report: OutliersReport = server.get("/api/peers/outliers").await.json();
    assert_eq!(report.population, 5);
    assert!(report.outliers.is_empty());
}
