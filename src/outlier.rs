// Slow-peer detection: flags values far above the population median using the
// median absolute deviation (MAD), which tolerates the outliers it is looking for.

use std::collections::BTreeMap;

use crate::error::ConfigError;

/// Scales MAD to approximate a standard deviation for normally distributed data.
pub const MAD_MULTIPLIER: f64 = 1.4826;

/// A value must exceed the median by this many scaled MADs to be an outlier.
pub const DEVIATION_MULTIPLIER: f64 = 3.0;

/// Margin used instead of the MAD bound when the population has no spread
/// (scaled MAD of 0): a value must exceed this multiple of the median.
pub const MEDIAN_MULTIPLIER: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutlierConfig {
    /// Below this many peers no judgment is made.
    pub min_population: usize,
    /// Values at or below this are never flagged.
    pub low_threshold_ms: f64,
}

impl OutlierConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_population == 0 {
            return Err(ConfigError::InvalidMinPopulation(self.min_population));
        }
        Ok(())
    }
}

/// Stateless apart from its thresholds; every call depends only on its input.
#[derive(Debug, Clone)]
pub struct OutlierDetector {
    config: OutlierConfig,
}

impl OutlierDetector {
    pub fn new(config: OutlierConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config: OutlierConfig {
                low_threshold_ms: config.low_threshold_ms.max(0.0),
                ..config
            },
        })
    }

    pub fn config(&self) -> &OutlierConfig {
        &self.config
    }

    /// Returns the entries of `stats` whose value is above the upper limit
    /// `max(low_threshold_ms, median + 3 * 1.4826 * MAD)`, or
    /// `max(low_threshold_ms, 3 * median)` when the MAD is zero.
    /// Populations smaller than `min_population` yield an empty map.
    pub fn get_outliers(&self, stats: &BTreeMap<String, f64>) -> BTreeMap<String, f64> {
        if stats.len() < self.config.min_population {
            return BTreeMap::new();
        }

        let values: Vec<f64> = stats.values().copied().filter(|v| v.is_finite()).collect();
        let Some(upper_limit) = self.upper_limit(&values) else {
            return BTreeMap::new();
        };

        stats
            .iter()
            .filter(|(_, v)| v.is_finite() && **v > upper_limit)
            .map(|(k, v)| (k.clone(), *v))
            .collect()
    }

    /// Threshold a value has to exceed to count as an outlier, or None for an
    /// empty population.
    pub fn upper_limit(&self, values: &[f64]) -> Option<f64> {
        let median = median(values)?;
        let mad = median_absolute_deviation(values, median)?;
        let scaled_mad = MAD_MULTIPLIER * mad;
        let statistical = if scaled_mad > 0.0 {
            median + DEVIATION_MULTIPLIER * scaled_mad
        } else {
            MEDIAN_MULTIPLIER * median
        };
        Some(self.config.low_threshold_ms.max(statistical))
    }
}

/// Median of `values`; the mean of the two middle values when the length is even.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Median of the absolute deviations of `values` from `median`.
pub fn median_absolute_deviation(values: &[f64], median_value: f64) -> Option<f64> {
    let deviations: Vec<f64> = values.iter().map(|v| (v - median_value).abs()).collect();
    median(&deviations)
}
