//! Scan and detection configuration

use crate::Cli;
use crate::analysis::DetectorConfig;

/// Compile-time defaults for a scan
pub struct ScanDefaults {
    // How many standard deviations above the trailing mean a volume must be.
    // Intentionally extreme so only severe outliers are flagged.
    pub sigma_multiplier: f64,
    // Anomalies older than this many whole days are not actionable
    pub recency_window_days: i64,
    // Length of the trailing history fetched for each instrument
    pub lookback_months: u32,
    // One instrument identifier per line
    pub instruments_path: &'static str,
}

pub const SCAN: ScanDefaults = ScanDefaults {
    sigma_multiplier: 9.0,
    recency_window_days: 3,
    lookback_months: 5,
    instruments_path: "pairs.txt",
};

/// The live configuration handed to the `ScanCoordinator`
#[derive(Debug, Clone, PartialEq)]
pub struct ScanConfig {
    /// Total concurrency, including the coordinator's own thread
    pub workers: usize,
    pub lookback_months: u32,
    pub detector: DetectorConfig,
}

impl ScanConfig {
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
            lookback_months: SCAN.lookback_months,
            detector: DetectorConfig::default(),
        }
    }

    /// Resolve CLI overrides against the defaults. The worker count falls back
    /// to the host's available parallelism.
    pub fn from_cli(args: &Cli) -> Self {
        let workers = args.workers.unwrap_or_else(default_worker_count);
        Self {
            workers: workers.max(1),
            lookback_months: args.lookback_months,
            detector: DetectorConfig {
                sigma_multiplier: args.sigma,
                recency_window_days: args.recency_days,
            },
        }
    }
}

pub fn default_worker_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
