// Core modules
pub mod analysis;
pub mod config;
pub mod data;
pub mod domain;
pub mod engine;
pub mod ui;
pub mod utils;

use std::path::PathBuf;

// Re-export commonly used types
pub use analysis::{DetectorConfig, detect, stats};
pub use config::ScanConfig;
pub use data::{BNAPIVersion, BarSource, FetchWindow, read_instrument_list};
pub use domain::{Sample, ScanOutcome, ScanResult, Series};
pub use engine::{ScanCoordinator, ScanReport};

// CLI argument parsing
use clap::Parser;

use crate::config::SCAN;
use crate::ui::OutputFormat;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// File listing the instruments to scan, one per line
    #[arg(long, default_value = SCAN.instruments_path)]
    pub pairs_file: PathBuf,

    /// Number of concurrent workers (defaults to available CPUs)
    #[arg(long)]
    pub workers: Option<usize>,

    /// Standard deviations above the trailing mean that count as a spike
    #[arg(long, default_value_t = SCAN.sigma_multiplier)]
    pub sigma: f64,

    /// Only report spikes younger than this many whole days
    #[arg(long, default_value_t = SCAN.recency_window_days)]
    pub recency_days: i64,

    /// Months of daily history to fetch per instrument
    #[arg(long, default_value_t = SCAN.lookback_months)]
    pub lookback_months: u32,

    /// Print the full report as JSON instead of one line per anomaly
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

impl Cli {
    pub fn output_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

/// Read the instrument list and run one scan against Binance.
/// Must be called outside `runtime`'s own threads.
pub fn run_scan(args: &Cli, runtime: tokio::runtime::Handle) -> anyhow::Result<ScanReport> {
    let instruments = read_instrument_list(&args.pairs_file)?;
    let coordinator = ScanCoordinator::new(BNAPIVersion::new(runtime), ScanConfig::from_cli(args));
    coordinator.run(&instruments, chrono::Utc::now())
}
