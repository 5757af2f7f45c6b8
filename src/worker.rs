// Background reporter: recomputes the slow-peer set on a fixed cadence, logs
// changes, forgets idle peers and periodically logs app stats.

use crate::peer_metrics::PeerLatencyCoordinator;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::time::{Duration, interval};
use tracing::{debug, info, instrument, warn};

/// Shared state and shutdown for the reporter.
pub struct ReporterDeps {
    pub metrics: Arc<PeerLatencyCoordinator>,
    pub reports_total: Arc<AtomicU64>,
    pub shutdown_rx: tokio::sync::oneshot::Receiver<()>,
}

/// Reporter timing (real seconds).
pub struct ReporterConfig {
    pub report_interval_secs: u64,
    pub stats_log_interval_secs: u64,
    pub evict_interval_secs: u64,
}

/// Peers that became slow and peers that recovered between two outlier sets.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SlowPeerChanges {
    pub became_slow: Vec<String>,
    pub recovered: Vec<String>,
}

impl SlowPeerChanges {
    pub fn is_empty(&self) -> bool {
        self.became_slow.is_empty() && self.recovered.is_empty()
    }
}

pub fn slow_peer_changes(
    previous: &BTreeMap<String, f64>,
    current: &BTreeMap<String, f64>,
) -> SlowPeerChanges {
    SlowPeerChanges {
        became_slow: current
            .keys()
            .filter(|k| !previous.contains_key(*k))
            .cloned()
            .collect(),
        recovered: previous
            .keys()
            .filter(|k| !current.contains_key(*k))
            .cloned()
            .collect(),
    }
}

pub fn spawn(deps: ReporterDeps, config: ReporterConfig) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        run(deps, config).await;
    })
}

#[instrument(skip_all, fields(node = %deps.metrics.name(), report_interval_secs = config.report_interval_secs))]
async fn run(deps: ReporterDeps, config: ReporterConfig) {
    let ReporterDeps {
        metrics,
        reports_total,
        mut shutdown_rx,
    } = deps;
    let ReporterConfig {
        report_interval_secs,
        stats_log_interval_secs,
        evict_interval_secs,
    } = config;

    let mut report_tick = interval(Duration::from_secs(report_interval_secs));
    report_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut stats_log_tick = interval(Duration::from_secs(stats_log_interval_secs));
    stats_log_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut evict_tick = interval(Duration::from_secs(evict_interval_secs));
    evict_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let mut slow_peers: BTreeMap<String, f64> = BTreeMap::new();
    let mut peers_evicted_total: u64 = 0;

    loop {
        tokio::select! {
            _ = report_tick.tick() => {
                let report = metrics.outliers_report();
                let changes = slow_peer_changes(&slow_peers, &report.outliers);
                for peer in &changes.became_slow {
                    warn!(
                        peer = %peer,
                        latency_ms = report.outliers.get(peer).copied().unwrap_or_default(),
                        population = report.population,
                        "peer is slow"
                    );
                }
                for peer in &changes.recovered {
                    info!(peer = %peer, "peer no longer slow");
                }
                if changes.is_empty() {
                    debug!(
                        operation = "report_outliers",
                        population = report.population,
                        slow_peers = report.outliers.len(),
                        "slow-peer set unchanged"
                    );
                }
                slow_peers = report.outliers;
                reports_total.fetch_add(1, Ordering::Relaxed);
            }
            _ = &mut shutdown_rx => {
                debug!("Reporter shutting down");
                break;
            }
            _ = stats_log_tick.tick() => {
                info!(
                    tracked_peers = metrics.aggregator().len(),
                    slow_peers = slow_peers.len(),
                    late_samples_dropped = metrics.aggregator().late_samples_dropped(),
                    peers_evicted_total = peers_evicted_total,
                    reports_total = reports_total.load(Ordering::Relaxed),
                    "app stats"
                );
            }
            _ = evict_tick.tick() => {
                let evicted = metrics.evict_idle();
                peers_evicted_total += evicted as u64;
                debug!(operation = "evict_idle", evicted, "Idle peers evicted");
            }
        }
    }
}
