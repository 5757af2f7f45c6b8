// Export shapes for the averages and outlier queries (JSON over HTTP, logs).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{LatencySample, PeerAverage};

/// Rolling averages of every sufficiently sampled peer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AveragesReport {
    pub name: String,
    pub min_samples: u64,
    pub averages: BTreeMap<String, PeerAverage>,
}

/// Peers currently judged slow, with their aggregate latency in ms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutliersReport {
    pub name: String,
    pub population: usize,
    pub outliers: BTreeMap<String, f64>,
}

/// Batch of samples accepted by the ingest endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatencyBatch {
    pub samples: Vec<LatencySample>,
}

/// Ingest endpoint response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestAck {
    pub accepted: usize,
}
