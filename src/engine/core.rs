use std::sync::Arc;
use std::thread;
use std::time::Instant;

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use crossbeam_channel::bounded;
use serde::Serialize;

use super::messages::{WorkerContext, WorkerResult};
use super::worker::run_worker;
use crate::config::ScanConfig;
use crate::data::{BarSource, FetchWindow};
use crate::domain::{ScanOutcome, ScanResult};

/// What a finished scan hands to the output layer
#[derive(Serialize, Debug, Default, Clone, PartialEq)]
pub struct ScanReport {
    /// Sorted by instrument for stable output
    pub anomalies: ScanResult,
    pub scanned: usize,
    pub not_found: usize,
    pub fetch_failed: usize,
}

impl ScanReport {
    fn record(&mut self, result: WorkerResult) {
        self.scanned += 1;
        match result.outcome {
            ScanOutcome::Found(sample) => self.anomalies.push(sample),
            ScanOutcome::NotFound => self.not_found += 1,
            ScanOutcome::FetchFailed(_) => self.fetch_failed += 1,
        }
    }
}

/// Runs one scan over a fixed pool of worker threads.
pub struct ScanCoordinator<S: BarSource + 'static> {
    source: Arc<S>,
    config: ScanConfig,
}

impl<S: BarSource + 'static> ScanCoordinator<S> {
    pub fn new(source: S, config: ScanConfig) -> Self {
        Self {
            source: Arc::new(source),
            config,
        }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Scan `instruments` with `now` as the end of every fetch window.
    ///
    /// `workers - 1` threads are spawned and the calling thread becomes the last
    /// worker once all instruments are queued. Both queues hold exactly
    /// `instruments.len()` items, so neither producers nor workers block on a
    /// full queue. The drain reads exactly one result per instrument.
    ///
    /// A hung fetch stalls its worker and therefore this call; there is no
    /// timeout at this level.
    pub fn run(&self, instruments: &[String], now: DateTime<Utc>) -> Result<ScanReport> {
        let total = instruments.len();
        let mut report = ScanReport::default();
        if total == 0 {
            log::info!("No instruments to scan");
            return Ok(report);
        }

        let start_time = Instant::now();
        let ctx = WorkerContext {
            source: Arc::clone(&self.source),
            window: FetchWindow::trailing_months(now, self.config.lookback_months),
            detector: self.config.detector.clone(),
        };
        let workers = self.config.workers.max(1);
        log::info!(
            "Scanning {} instruments from {} with {} workers",
            total,
            self.source.signature(),
            workers
        );

        let (work_tx, work_rx) = bounded::<String>(total);
        let (result_tx, result_rx) = bounded::<WorkerResult>(total);

        let mut handles = Vec::with_capacity(workers - 1);
        for id in 1..workers {
            let ctx = ctx.clone();
            let rx = work_rx.clone();
            let tx = result_tx.clone();
            let handle = thread::Builder::new()
                .name(format!("scan-worker-{id}"))
                .spawn(move || run_worker(id, ctx, rx, tx))
                .context("Failed to spawn scan worker thread")?;
            handles.push(handle);
        }

        for instrument in instruments {
            work_tx
                .send(instrument.clone())
                .map_err(|_| anyhow!("Work queue closed while seeding"))?;
        }
        // Closing the queue lets every worker exit once it is drained
        drop(work_tx);

        run_worker(0, ctx, work_rx, result_tx);

        for _ in 0..total {
            // Only errors once every worker has dropped its sender, i.e. one died
            // without answering for its instrument.
            let result = result_rx
                .recv()
                .context("Result queue closed before every instrument reported")?;
            log::debug!("{} reported after {}ms", result.instrument, result.duration_ms);
            report.record(result);
        }

        for handle in handles {
            if handle.join().is_err() {
                log::error!("A scan worker panicked after the drain completed");
            }
        }

        report
            .anomalies
            .sort_by(|a, b| a.instrument.cmp(&b.instrument));

        log::info!(
            "Scan finished in {:?}: {} scanned, {} anomalies, {} without anomaly, {} failed",
            start_time.elapsed(),
            report.scanned,
            report.anomalies.len(),
            report.not_found,
            report.fetch_failed
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::bar_source::testing::StaticBarSource;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn names(instruments: &[&str]) -> Vec<String> {
        instruments.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_instrument_list_gives_empty_report() {
        let coordinator = ScanCoordinator::new(StaticBarSource::default(), ScanConfig::new(4));
        let report = coordinator.run(&[], now()).unwrap();
        assert_eq!(report, ScanReport::default());
    }

    #[test]
    fn one_failing_instrument_among_ten() {
        let now_sec = now().timestamp();
        let mut source = StaticBarSource::default().with_failure("PAIR0USDT", "HTTP 500");
        for i in 1..10 {
            let name = format!("PAIR{}USDT", i);
            source = if i % 3 == 0 {
                source.with_spike(&name, now_sec, 1_000 * i)
            } else {
                source.with_quiet(&name, now_sec)
            };
        }
        let instruments: Vec<String> = (0..10).map(|i| format!("PAIR{}USDT", i)).collect();

        let report = ScanCoordinator::new(source, ScanConfig::new(3))
            .run(&instruments, now())
            .unwrap();

        assert_eq!(report.scanned, 10);
        assert_eq!(report.fetch_failed, 1);
        assert_eq!(report.not_found, 6);
        let found: Vec<&str> = report
            .anomalies
            .iter()
            .map(|s| s.instrument.as_str())
            .collect();
        assert_eq!(found, vec!["PAIR3USDT", "PAIR6USDT", "PAIR9USDT"]);
        assert!(report.anomalies.len() <= 9);
    }

    #[test]
    fn every_instrument_reports_once_for_any_pool_size() {
        let now_sec = now().timestamp();
        let instruments: Vec<String> = (0..25).map(|i| format!("I{:02}USDT", i)).collect();

        for workers in [1, 2, 4, 8, 40] {
            let mut source = StaticBarSource::default();
            for (i, name) in instruments.iter().enumerate() {
                source = match i % 4 {
                    0 => source.with_spike(name, now_sec, 7),
                    1 => source.with_quiet(name, now_sec),
                    2 => source.with_failure(name, "unreachable"),
                    _ => source, // unknown to the source: empty series
                };
            }

            let report = ScanCoordinator::new(source, ScanConfig::new(workers))
                .run(&instruments, now())
                .unwrap();

            assert_eq!(report.scanned, 25, "workers = {}", workers);
            assert_eq!(report.anomalies.len(), 7);
            assert_eq!(report.fetch_failed, 6);
            assert_eq!(report.not_found, 12);
        }
    }

    #[test]
    fn panicking_source_still_answers_every_instrument() {
        let now_sec = now().timestamp();
        let instruments: Vec<String> = (0..12).map(|i| format!("P{:02}USDT", i)).collect();

        // One worker covers the calling-thread path, four the spawned threads
        for workers in [1, 4] {
            let mut source = StaticBarSource::default().with_panic("P05USDT");
            for name in instruments.iter().filter(|n| *n != "P05USDT") {
                source = source.with_quiet(name, now_sec);
            }
            source = source.with_spike("P07USDT", now_sec, 9);

            let report = ScanCoordinator::new(source, ScanConfig::new(workers))
                .run(&instruments, now())
                .expect("a panicking fetch must not abort the scan");

            assert_eq!(report.scanned, instruments.len(), "workers = {}", workers);
            assert_eq!(report.fetch_failed, 1);
            assert_eq!(report.not_found, 10);
            assert_eq!(report.anomalies.len(), 1);
            assert_eq!(report.anomalies[0].instrument, "P07USDT");
        }
    }

    #[test]
    fn anomalies_come_back_sorted() {
        let now_sec = now().timestamp();
        let source = StaticBarSource::default()
            .with_spike("ZZZUSDT", now_sec, 1)
            .with_spike("AAAUSDT", now_sec, 1)
            .with_spike("MMMUSDT", now_sec, 1);

        let report = ScanCoordinator::new(source, ScanConfig::new(2))
            .run(&names(&["ZZZUSDT", "MMMUSDT", "AAAUSDT"]), now())
            .unwrap();

        let found: Vec<&str> = report
            .anomalies
            .iter()
            .map(|s| s.instrument.as_str())
            .collect();
        assert_eq!(found, vec!["AAAUSDT", "MMMUSDT", "ZZZUSDT"]);
    }

    #[test]
    fn single_worker_runs_on_calling_thread() {
        let now_sec = now().timestamp();
        let source = StaticBarSource::default().with_spike("ONEUSDT", now_sec, 3);
        let coordinator = ScanCoordinator::new(source, ScanConfig::new(1));

        let report = coordinator.run(&names(&["ONEUSDT"]), now()).unwrap();
        assert_eq!(report.anomalies.len(), 1);
        assert_eq!(report.anomalies[0].volume, 3);
        assert_eq!(coordinator.config().workers, 1);
    }
}
