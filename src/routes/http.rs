// GET query handlers and POST sample ingest

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

use super::AppState;
use crate::models::{IngestAck, LatencyBatch, LatencySample};
use crate::version::{NAME, VERSION};

/// GET /version — returns service name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": NAME,
        "version": VERSION,
    }))
}

/// GET /api/config — effective window and outlier settings.
pub(super) async fn config_handler(State(state): State<AppState>) -> impl IntoResponse {
    let window = state.config.rolling_window_config();
    Json(serde_json::json!({
        "name": state.metrics.name(),
        "windowSizeMs": window.window_size_ms,
        "numWindows": window.num_windows,
        "minPopulation": state.config.outliers.min_population,
        "lowThresholdMs": state.config.outliers.low_threshold_ms,
        "minSamples": state.config.outliers.min_samples,
    }))
}

/// GET /api/peers/averages — rolling average of every sufficiently sampled peer.
pub(super) async fn averages_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.metrics.averages_report())
}

/// GET /api/peers/outliers — peers currently judged slow.
pub(super) async fn outliers_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.metrics.outliers_report())
}

/// POST /api/peers/latency — one `{"peer": ..., "elapsedMs": ...}` sample.
pub(super) async fn ingest_handler(
    State(state): State<AppState>,
    Json(sample): Json<LatencySample>,
) -> impl IntoResponse {
    if sample.peer.is_empty() {
        return (StatusCode::BAD_REQUEST, Json(IngestAck { accepted: 0 }));
    }
    state.metrics.record_latency(&sample.peer, sample.elapsed_ms);
    (StatusCode::OK, Json(IngestAck { accepted: 1 }))
}

/// POST /api/peers/latency/batch — `{"samples": [...]}`; samples with an empty peer are skipped.
pub(super) async fn ingest_batch_handler(
    State(state): State<AppState>,
    Json(batch): Json<LatencyBatch>,
) -> impl IntoResponse {
    let mut acc = state.metrics.local_accumulator();
    for sample in batch.samples.iter().filter(|s| !s.peer.is_empty()) {
        state
            .metrics
            .record_latency_local(&mut acc, &sample.peer, sample.elapsed_ms);
    }
    let pending = acc.pending_samples();
    // Samples already older than the peer's retained span are not counted.
    let accepted = state.metrics.collect_local_states(&mut acc) as usize;
    tracing::debug!(operation = "ingest_batch", pending, accepted, "samples ingested");
    Json(IngestAck { accepted })
}
