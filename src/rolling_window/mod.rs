// Rolling per-peer averages over a fixed number of time-sliced buckets.
// Buckets advance lazily from sample timestamps; nothing runs on a timer.

mod local;
mod series;

pub use local::LocalAccumulator;
pub use series::{RollingSeries, WindowBucket};

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tracing::{debug, instrument, trace};

use crate::clock::{Clock, MonotonicClock};
use crate::error::ConfigError;
use crate::models::PeerAverage;

/// Bucket length and number of retained buckets per key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollingWindowConfig {
    pub window_size_ms: u64,
    pub num_windows: usize,
}

impl RollingWindowConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_size_ms == 0 {
            return Err(ConfigError::InvalidWindowSize(self.window_size_ms));
        }
        if self.num_windows == 0 {
            return Err(ConfigError::InvalidNumWindows(self.num_windows));
        }
        Ok(())
    }

    /// Total retained history per key.
    pub fn span_ms(&self) -> u64 {
        self.window_size_ms.saturating_mul(self.num_windows as u64)
    }

    fn slice_of(&self, timestamp_ms: u64) -> u64 {
        timestamp_ms / self.window_size_ms
    }
}

/// Per-key rolling averages. `add` locks only the shard that owns the key;
/// snapshots read each series under its shard lock, so a bucket's sum and
/// count are always read together.
pub struct RollingWindowAggregator {
    config: RollingWindowConfig,
    series: DashMap<String, RollingSeries>,
    clock: Arc<dyn Clock>,
    late_samples_dropped: AtomicU64,
}

impl RollingWindowAggregator {
    pub fn new(config: RollingWindowConfig) -> Result<Self, ConfigError> {
        Self::with_clock(config, Arc::new(MonotonicClock::new()))
    }

    pub fn with_clock(
        config: RollingWindowConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            series: DashMap::new(),
            clock,
            late_samples_dropped: AtomicU64::new(0),
        })
    }

    pub fn config(&self) -> &RollingWindowConfig {
        &self.config
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Records one sample for `key` at `timestamp_ms`, read on the same clock as
    /// [`RollingWindowAggregator::now_ms`]. Samples older than the key's retained
    /// span are dropped and counted in `late_samples_dropped`.
    pub fn add(&self, key: &str, value: f64, timestamp_ms: u64) {
        self.record(key, self.config.slice_of(timestamp_ms), value, 1);
    }

    /// Returns false when the slice was already outside the key's retained span.
    fn record(&self, key: &str, slice: u64, sum: f64, count: u64) -> bool {
        let recorded = match self.series.get_mut(key) {
            Some(mut series) => series.record(slice, sum, count),
            None => self
                .series
                .entry(key.to_owned())
                .or_insert_with(|| RollingSeries::new(self.config.num_windows))
                .record(slice, sum, count),
        };
        if !recorded {
            self.late_samples_dropped.fetch_add(count, Ordering::Relaxed);
            trace!(peer = key, slice, count, "late sample dropped");
        }
        recorded
    }

    /// Per-key averages over the live buckets as of the aggregator clock.
    pub fn snapshot(&self, min_samples: u64) -> BTreeMap<String, PeerAverage> {
        self.snapshot_at(min_samples, self.now_ms())
    }

    /// Per-key averages over the buckets live at `now_ms`, omitting keys with
    /// fewer than `min_samples` retained samples.
    pub fn snapshot_at(&self, min_samples: u64, now_ms: u64) -> BTreeMap<String, PeerAverage> {
        let now_slice = self.config.slice_of(now_ms);
        let mut out = BTreeMap::new();
        for entry in self.series.iter() {
            let (sum, count) = entry.value().totals(now_slice);
            if count == 0 || count < min_samples {
                continue;
            }
            out.insert(
                entry.key().clone(),
                PeerAverage {
                    average: sum / count as f64,
                    count,
                },
            );
        }
        out
    }

    /// Creates an empty buffer bucketed the same way as this aggregator.
    pub fn local_accumulator(&self) -> LocalAccumulator {
        LocalAccumulator::new(self.config.window_size_ms)
    }

    /// Folds a worker's buffered samples into the shared series and empties the
    /// buffer. Returns the number of samples merged (late ones excluded).
    #[instrument(skip_all, fields(operation = "merge_pending_local_state"))]
    pub fn merge_pending_local_state(&self, local: &mut LocalAccumulator) -> u64 {
        if local.is_empty() {
            return 0;
        }
        let local_window_ms = local.window_size_ms();
        let pending = local.pending_samples();
        let mut merged = 0;
        for (key, bucket) in local.drain() {
            // Buffers from a differently sized aggregator are re-sliced by bucket start time.
            let slice = if local_window_ms == self.config.window_size_ms {
                bucket.slice
            } else {
                self.config
                    .slice_of(bucket.slice.saturating_mul(local_window_ms))
            };
            if self.record(&key, slice, bucket.sum, bucket.count) {
                merged += bucket.count;
            }
        }
        debug!(pending, merged, "local state merged");
        merged
    }

    /// Removes keys whose every retained bucket has expired as of `now_ms`.
    /// Returns how many keys were forgotten.
    pub fn evict_idle(&self, now_ms: u64) -> usize {
        let now_slice = self.config.slice_of(now_ms);
        let before = self.series.len();
        self.series.retain(|_, series| !series.is_idle(now_slice));
        let evicted = before.saturating_sub(self.series.len());
        if evicted > 0 {
            debug!(evicted, "idle peers evicted");
        }
        evicted
    }

    /// Number of keys currently tracked (including ones whose data has expired
    /// but were not yet evicted).
    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn late_samples_dropped(&self) -> u64 {
        self.late_samples_dropped.load(Ordering::Relaxed)
    }
}
