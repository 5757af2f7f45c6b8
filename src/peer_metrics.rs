// Peer latency coordinator: samples go into the rolling window, queries run the
// outlier detector over a snapshot of it. Holds no state of its own beyond the two.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::trace;

use crate::clock::{Clock, MonotonicClock};
use crate::config::AppConfig;
use crate::error::ConfigError;
use crate::models::{AveragesReport, OutliersReport, PeerAverage};
use crate::outlier::{OutlierConfig, OutlierDetector};
use crate::rolling_window::{LocalAccumulator, RollingWindowAggregator, RollingWindowConfig};

/// Prefix of the metrics name derived from the node name.
pub const NAME_PREFIX: &str = "PeerActivity-";

pub struct PeerLatencyCoordinator {
    name: String,
    aggregator: RollingWindowAggregator,
    detector: OutlierDetector,
    min_samples: u64,
}

impl PeerLatencyCoordinator {
    pub fn new(
        node_name: &str,
        window: RollingWindowConfig,
        outliers: OutlierConfig,
        min_samples: u64,
    ) -> Result<Self, ConfigError> {
        Self::with_clock(
            node_name,
            window,
            outliers,
            min_samples,
            Arc::new(MonotonicClock::new()),
        )
    }

    /// Builds the coordinator from the `[node]`, `[rolling_window]` and `[outliers]` sections.
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        Self::new(
            &config.node.name,
            config.rolling_window_config(),
            config.outlier_config(),
            config.outliers.min_samples,
        )
    }

    pub fn with_clock(
        node_name: &str,
        window: RollingWindowConfig,
        outliers: OutlierConfig,
        min_samples: u64,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        if min_samples == 0 {
            return Err(ConfigError::InvalidMinSamples(min_samples));
        }
        Ok(Self {
            name: metrics_name(node_name)?,
            aggregator: RollingWindowAggregator::with_clock(window, clock)?,
            detector: OutlierDetector::new(outliers)?,
            min_samples,
        })
    }

    /// Metrics name, e.g. "PeerActivity-10.0.0.1-9866" for node "10.0.0.1:9866".
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current reading of the clock that timestamps samples and expires buckets.
    pub fn now_ms(&self) -> u64 {
        self.aggregator.now_ms()
    }

    pub fn min_samples(&self) -> u64 {
        self.min_samples
    }

    pub fn aggregator(&self) -> &RollingWindowAggregator {
        &self.aggregator
    }

    pub fn detector(&self) -> &OutlierDetector {
        &self.detector
    }

    /// Records a completed round-trip to `peer`, timestamped now.
    pub fn record_latency(&self, peer: &str, elapsed_ms: u64) {
        self.record_latency_at(peer, elapsed_ms, self.aggregator.now_ms());
    }

    /// Records a sample at `timestamp_ms`, which must be on the coordinator's clock
    /// (see [`PeerLatencyCoordinator::now_ms`]); for the default monotonic clock that is
    /// milliseconds since the coordinator was built, not wall-clock epoch time.
    pub fn record_latency_at(&self, peer: &str, elapsed_ms: u64, timestamp_ms: u64) {
        self.aggregator.add(peer, elapsed_ms as f64, timestamp_ms);
    }

    /// New buffer for a worker that records without touching shared state.
    pub fn local_accumulator(&self) -> LocalAccumulator {
        self.aggregator.local_accumulator()
    }

    pub fn record_latency_local(&self, acc: &mut LocalAccumulator, peer: &str, elapsed_ms: u64) {
        acc.add(peer, elapsed_ms as f64, self.aggregator.now_ms());
    }

    /// Flushes a worker buffer into the shared rolling window.
    pub fn collect_local_states(&self, acc: &mut LocalAccumulator) -> u64 {
        self.aggregator.merge_pending_local_state(acc)
    }

    /// Averages of peers with at least `min_samples` retained samples.
    pub fn snapshot(&self) -> BTreeMap<String, PeerAverage> {
        self.aggregator.snapshot(self.min_samples)
    }

    /// Peers that look significantly slower than the rest, with their average latency.
    pub fn current_outliers(&self) -> BTreeMap<String, f64> {
        self.outliers_of(&self.snapshot())
    }

    fn outliers_of(&self, snapshot: &BTreeMap<String, PeerAverage>) -> BTreeMap<String, f64> {
        let stats: BTreeMap<String, f64> = snapshot
            .iter()
            .map(|(peer, avg)| (peer.clone(), avg.average))
            .collect();
        trace!(metrics = %self.name, ?stats, "peer stats");
        self.detector.get_outliers(&stats)
    }

    pub fn averages_report(&self) -> AveragesReport {
        AveragesReport {
            name: self.name.clone(),
            min_samples: self.min_samples,
            averages: self.snapshot(),
        }
    }

    /// Outliers together with the population size they were judged against.
    pub fn outliers_report(&self) -> OutliersReport {
        let snapshot = self.snapshot();
        OutliersReport {
            name: self.name.clone(),
            population: snapshot.len(),
            outliers: self.outliers_of(&snapshot),
        }
    }

    /// Forgets peers with no samples left in the window.
    pub fn evict_idle(&self) -> usize {
        self.aggregator.evict_idle(self.aggregator.now_ms())
    }
}

fn metrics_name(node_name: &str) -> Result<String, ConfigError> {
    let node_name = node_name.trim();
    if node_name.is_empty() {
        return Err(ConfigError::EmptyName);
    }
    Ok(format!("{}{}", NAME_PREFIX, node_name.replace(':', "-")))
}
