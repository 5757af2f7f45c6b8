// HTTP routes: sample ingest and the averages / outliers queries

mod http;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::AppConfig;
use crate::peer_metrics::PeerLatencyCoordinator;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) metrics: Arc<PeerLatencyCoordinator>,
    pub(crate) config: AppConfig,
}

pub fn app(metrics: Arc<PeerLatencyCoordinator>, config: AppConfig) -> Router {
    let state = AppState { metrics, config };
    Router::new()
        .route("/", get(|| async { "peerlat: peer latency monitor" })) // GET /
        .route("/version", get(http::version_handler)) // GET /version
        .route("/api/config", get(http::config_handler)) // GET /api/config
        .route("/api/peers/averages", get(http::averages_handler)) // GET /api/peers/averages
        .route("/api/peers/outliers", get(http::outliers_handler)) // GET /api/peers/outliers
        .route("/api/peers/latency", post(http::ingest_handler)) // POST /api/peers/latency
        .route("/api/peers/latency/batch", post(http::ingest_batch_handler)) // POST /api/peers/latency/batch
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
