use serde::Serialize;

use super::series_stats::stats;
use crate::config::SCAN;
use crate::domain::Sample;
use crate::utils::time_utils::whole_days_between;

/// Tunables for the volume spike test
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct DetectorConfig {
    pub sigma_multiplier: f64,
    pub recency_window_days: i64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            sigma_multiplier: SCAN.sigma_multiplier,
            recency_window_days: SCAN.recency_window_days,
        }
    }
}

impl DetectorConfig {
    /// Lowest volume that counts as a spike for a series with these statistics.
    pub fn cutoff(&self, mean: f64, std_dev: f64) -> u64 {
        // Volumes are non-negative, so the saturating cast is a floor.
        (mean + std_dev * self.sigma_multiplier).floor() as u64
    }

    /// Look for the most recent volume spike in `series`.
    ///
    /// The statistics are taken over the whole series, then the series is walked
    /// from the newest sample backwards. The walk stops at the first sample that
    /// falls outside the recency window, so older spikes are never reported.
    /// The first qualifying sample wins, even if a larger one sits further back.
    pub fn detect(&self, series: &[Sample], now_sec: i64) -> Option<Sample> {
        if series.is_empty() {
            return None;
        }

        let (mean, std_dev) = stats(series);
        let cutoff = self.cutoff(mean, std_dev);

        for sample in series.iter().rev() {
            if whole_days_between(sample.timestamp, now_sec) >= self.recency_window_days {
                return None;
            }
            if sample.volume >= cutoff {
                return Some(sample.clone());
            }
        }
        None
    }
}

/// Detect with the default 9-sigma / 3-day settings.
pub fn detect(series: &[Sample], now_sec: i64) -> Option<Sample> {
    DetectorConfig::default().detect(series, now_sec)
}
