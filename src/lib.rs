// Library for the binary and integration tests

pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod outlier;
pub mod peer_metrics;
pub mod rolling_window;
pub mod routes;
pub mod version;
pub mod worker;

pub use error::ConfigError;
pub use outlier::{OutlierConfig, OutlierDetector};
pub use peer_metrics::PeerLatencyCoordinator;
pub use rolling_window::{LocalAccumulator, RollingWindowAggregator, RollingWindowConfig};
