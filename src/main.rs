use anyhow::Result;
use peerlat::*;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = config::AppConfig::load()?;
    let metrics = Arc::new(PeerLatencyCoordinator::from_config(&app_config)?);
    tracing::info!(
        version = %version::banner(),
        metrics_name = metrics.name(),
        window_size_ms = app_config.rolling_window.window_size_ms,
        num_windows = app_config.rolling_window.num_windows,
        min_population = app_config.outliers.min_population,
        min_samples = app_config.outliers.min_samples,
        "peer latency monitor starting"
    );

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let reporter_handle = worker::spawn(
        worker::ReporterDeps {
            metrics: metrics.clone(),
            reports_total: Arc::new(AtomicU64::new(0)),
            shutdown_rx,
        },
        worker::ReporterConfig {
            report_interval_secs: app_config.monitoring.report_interval_secs,
            stats_log_interval_secs: app_config.monitoring.stats_log_interval_secs,
            evict_interval_secs: app_config.monitoring.evict_interval_secs,
        },
    );

    let app = routes::app(metrics, app_config.clone());
    let addr = format!("{}:{}", app_config.server.host, app_config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);

    tokio::select! {
        result = axum::serve(listener, app) => {
            result?;
        }
        _ = async {
            #[cfg(unix)]
            {
                let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                    Ok(s) => s,
                    Err(_) => {
                        let _ = tokio::signal::ctrl_c().await;
                        return;
                    }
                };
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            #[cfg(not(unix))]
            {
                let _ = tokio::signal::ctrl_c().await;
            }
        } => {
            tracing::info!("Received shutdown signal");
            let _ = shutdown_tx.send(());
            let _ = reporter_handle.await;
        }
    }

    Ok(())
}
