// Construction-time errors for the core types. Runtime operations never fail.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("window_size_ms must be > 0, got {0}")]
    InvalidWindowSize(u64),
    #[error("num_windows must be >= 1, got {0}")]
    InvalidNumWindows(usize),
    #[error("min_population must be >= 1, got {0}")]
    InvalidMinPopulation(usize),
    #[error("min_samples must be >= 1, got {0}")]
    InvalidMinSamples(u64),
    #[error("node name must be non-empty")]
    EmptyName,
}
