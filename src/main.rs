use std::process::ExitCode;

use clap::Parser;
use tokio::runtime::Runtime;

use spike_sniper::{Cli, run_scan, ui};

fn main() -> ExitCode {
    // A. Init Logging
    // Info by default, RUST_LOG overrides
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    // B. Parse Args
    let args = Cli::parse();
    #[cfg(debug_assertions)]
    log::debug!("Parsed arguments: {:?}", args);

    // C. The runtime only drives HTTP requests; workers are plain threads
    let rt = match Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            log::error!("Failed to create Tokio runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // D. Scan, then print
    let result = run_scan(&args, rt.handle().clone())
        .and_then(|report| ui::print_report(&report, args.output_format()));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("Scan aborted: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
