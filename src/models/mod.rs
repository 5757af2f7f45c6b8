// Domain models: per-peer values and the report shapes built from them

mod peer;
mod report;

pub use peer::{LatencySample, PeerAverage};
pub use report::{AveragesReport, IngestAck, LatencyBatch, OutliersReport};
