use serde::Deserialize;

use crate::outlier::OutlierConfig;
use crate::rolling_window::RollingWindowConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub node: NodeConfig,
    #[serde(default)]
    pub rolling_window: RollingWindowSettings,
    #[serde(default)]
    pub outliers: OutlierSettings,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NodeConfig {
    /// Identifier of this node; becomes part of the metrics name. Required.
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RollingWindowSettings {
    #[serde(default = "default_window_size_ms")]
    pub window_size_ms: u64,
    #[serde(default = "default_num_windows")]
    pub num_windows: usize,
}

impl Default for RollingWindowSettings {
    fn default() -> Self {
        Self {
            window_size_ms: default_window_size_ms(),
            num_windows: default_num_windows(),
        }
    }
}

fn default_window_size_ms() -> u64 {
    300_000
}

fn default_num_windows() -> usize {
    36
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutlierSettings {
    /// Fewer sufficiently sampled peers than this and no peer is judged.
    #[serde(default = "default_min_population")]
    pub min_population: usize,
    /// Average latency at or below this is never considered slow.
    #[serde(default = "default_low_threshold_ms")]
    pub low_threshold_ms: u64,
    /// Samples a peer needs inside the window before it is part of the population.
    #[serde(default = "default_min_samples")]
    pub min_samples: u64,
}

impl Default for OutlierSettings {
    fn default() -> Self {
        Self {
            min_population: default_min_population(),
            low_threshold_ms: default_low_threshold_ms(),
            min_samples: default_min_samples(),
        }
    }
}

fn default_min_population() -> usize {
    10
}

fn default_low_threshold_ms() -> u64 {
    5
}

fn default_min_samples() -> u64 {
    1000
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    /// How often the reporter recomputes the slow-peer set.
    pub report_interval_secs: u64,
    /// How often to log app stats (tracked peers, late samples) at INFO level.
    pub stats_log_interval_secs: u64,
    /// How often peers with no samples left in the window are forgotten.
    #[serde(default = "default_evict_interval_secs")]
    pub evict_interval_secs: u64,
}

fn default_evict_interval_secs() -> u64 {
    60
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn rolling_window_config(&self) -> RollingWindowConfig {
        RollingWindowConfig {
            window_size_ms: self.rolling_window.window_size_ms,
            num_windows: self.rolling_window.num_windows,
        }
    }

    pub fn outlier_config(&self) -> OutlierConfig {
        OutlierConfig {
            min_population: self.outliers.min_population,
            low_threshold_ms: self.outliers.low_threshold_ms as f64,
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(
            !self.node.name.trim().is_empty(),
            "node.name must be non-empty"
        );
        anyhow::ensure!(
            self.rolling_window.window_size_ms > 0,
            "rolling_window.window_size_ms must be > 0, got {}",
            self.rolling_window.window_size_ms
        );
        anyhow::ensure!(
            self.rolling_window.num_windows > 0,
            "rolling_window.num_windows must be > 0, got {}",
            self.rolling_window.num_windows
        );
        anyhow::ensure!(
            self.outliers.min_population > 0,
            "outliers.min_population must be > 0, got {}",
            self.outliers.min_population
        );
        anyhow::ensure!(
            self.outliers.min_samples > 0,
            "outliers.min_samples must be > 0, got {}",
            self.outliers.min_samples
        );
        anyhow::ensure!(
            self.monitoring.report_interval_secs > 0,
            "monitoring.report_interval_secs must be > 0, got {}",
            self.monitoring.report_interval_secs
        );
        anyhow::ensure!(
            self.monitoring.stats_log_interval_secs > 0,
            "monitoring.stats_log_interval_secs must be > 0, got {}",
            self.monitoring.stats_log_interval_secs
        );
        anyhow::ensure!(
            self.monitoring.evict_interval_secs > 0,
            "monitoring.evict_interval_secs must be > 0, got {}",
            self.monitoring.evict_interval_secs
        );
        if self.outliers.min_population < 10 {
            tracing::warn!(
                min_population = self.outliers.min_population,
                "outliers.min_population below 10; slow-peer judgments will be noisy"
            );
        }
        Ok(())
    }
}
