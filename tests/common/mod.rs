// Shared test helpers

#![allow(dead_code)]

use peerlat::clock::ManualClock;
use peerlat::outlier::OutlierConfig;
use peerlat::peer_metrics::PeerLatencyCoordinator;
use peerlat::rolling_window::RollingWindowConfig;
use std::collections::BTreeMap;
use std::sync::Arc;

pub const WINDOW: RollingWindowConfig = RollingWindowConfig {
    window_size_ms: 1_000,
    num_windows: 3,
};

/// Coordinator on a manual clock: min_population 10, low threshold 5ms, min_samples 1.
pub fn coordinator(clock: Arc<ManualClock>) -> PeerLatencyCoordinator {
    PeerLatencyCoordinator::with_clock(
        "10.0.0.1:9866",
        WINDOW,
        OutlierConfig {
            min_population: 10,
            low_threshold_ms: 5.0,
        },
        1,
        clock,
    )
    .unwrap()
}

/// `n` peers at `base` ms plus the given slow ones.
pub fn population(n: usize, base: f64, slow: &[(&str, f64)]) -> BTreeMap<String, f64> {
    let mut stats: BTreeMap<String, f64> = (0..n)
        .map(|i| (format!("[10.0.1.{}:9866]", i), base))
        .collect();
    for (peer, v) in slow {
        stats.insert(peer.to_string(), *v);
    }
    stats
}
