// Per-peer latency values produced by the rolling window.

use serde::{Deserialize, Serialize};

/// Average latency of one peer over its retained buckets, with the sample count behind it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerAverage {
    pub average: f64,
    pub count: u64,
}

/// One observed round-trip to a peer, as posted by the I/O layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatencySample {
    pub peer: String,
    pub elapsed_ms: u64,
}
