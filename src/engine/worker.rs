use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender};

use super::messages::{WorkerContext, WorkerResult};
use crate::data::BarSource;
use crate::domain::ScanOutcome;
use crate::utils::time_utils::epoch_sec_to_utc;

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg
    } else {
        "unknown panic"
    }
}

/// Fetch and analyse one instrument. Never fails: fetch errors and panics
/// inside the bar source become `ScanOutcome::FetchFailed`, so every
/// instrument still gets its one result.
pub fn scan_instrument<S: BarSource>(ctx: &WorkerContext<S>, instrument: &str) -> ScanOutcome {
    // The source is only read through `&self`, so a panic leaves nothing half-updated
    let fetched = catch_unwind(AssertUnwindSafe(|| {
        ctx.source.fetch_daily_bars(instrument, &ctx.window)
    }));

    match fetched {
        Ok(Ok(series)) if series.is_empty() => ScanOutcome::NotFound,
        Ok(Ok(series)) => ctx.detector.detect(&series, ctx.window.end_sec()).into(),
        Ok(Err(e)) => {
            log::warn!("{} fetch from {} failed: {:#}", instrument, ctx.source.signature(), e);
            ScanOutcome::FetchFailed(format!("{:#}", e))
        }
        Err(payload) => {
            let reason = format!("fetch panicked: {}", panic_message(payload.as_ref()));
            log::error!("{} {} in {}", instrument, reason, ctx.source.signature());
            ScanOutcome::FetchFailed(reason)
        }
    }
}

/// Worker loop: pull instruments until the work queue is closed and drained,
/// pushing exactly one `WorkerResult` per instrument pulled.
pub fn run_worker<S: BarSource>(
    id: usize,
    ctx: WorkerContext<S>,
    rx: Receiver<String>,
    tx: Sender<WorkerResult>,
) {
    let mut processed = 0usize;

    while let Ok(instrument) = rx.recv() {
        let start = Instant::now();
        let outcome = scan_instrument(&ctx, &instrument);
        let elapsed = start.elapsed().as_millis();

        if let ScanOutcome::Found(sample) = &outcome {
            log::info!(
                "[worker {}] {} volume spike {} on {}",
                id,
                instrument,
                sample.volume,
                epoch_sec_to_utc(sample.timestamp)
            );
        } else {
            log::debug!("[worker {}] {} {} ({}ms)", id, instrument, outcome, elapsed);
        }

        let result = WorkerResult {
            instrument,
            duration_ms: elapsed,
            outcome,
        };
        // The coordinator owns the receiver for the whole drain; if it is gone
        // nobody is waiting for the rest either.
        if tx.send(result).is_err() {
            log::error!("[worker {}] result queue closed, stopping", id);
            return;
        }
        processed += 1;
    }

    log::debug!("[worker {}] work queue drained after {} instruments", id, processed);
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};
    use crossbeam_channel::bounded;

    use super::*;
    use crate::analysis::DetectorConfig;
    use crate::data::FetchWindow;
    use crate::data::bar_source::testing::StaticBarSource;

    fn context(source: StaticBarSource) -> WorkerContext<StaticBarSource> {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
        WorkerContext {
            source: Arc::new(source),
            window: FetchWindow::trailing_months(now, 5),
            detector: DetectorConfig::default(),
        }
    }

    fn now_sec() -> i64 {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap().timestamp()
    }

    #[test]
    fn each_kind_of_instrument_maps_to_its_outcome() {
        let ctx = context(
            StaticBarSource::default()
                .with_spike("HOTUSDT", now_sec(), 5_000)
                .with_quiet("CALMUSDT", now_sec())
                .with_failure("BADUSDT", "connection reset"),
        );

        assert!(matches!(
            scan_instrument(&ctx, "HOTUSDT"),
            ScanOutcome::Found(ref s) if s.instrument == "HOTUSDT" && s.volume == 5_000
        ));
        assert_eq!(scan_instrument(&ctx, "CALMUSDT"), ScanOutcome::NotFound);
        assert_eq!(scan_instrument(&ctx, "GONEUSDT"), ScanOutcome::NotFound);
        assert!(matches!(
            scan_instrument(&ctx, "BADUSDT"),
            ScanOutcome::FetchFailed(ref reason) if reason.contains("connection reset")
        ));
    }

    #[test]
    fn panicking_source_becomes_a_failed_fetch() {
        let ctx = context(StaticBarSource::default().with_panic("CRASHUSDT"));

        assert!(matches!(
            scan_instrument(&ctx, "CRASHUSDT"),
            ScanOutcome::FetchFailed(ref reason)
                if reason.starts_with("fetch panicked") && reason.contains("CRASHUSDT")
        ));
    }

    #[test]
    fn worker_answers_every_instrument_then_exits() {
        let ctx = context(
            StaticBarSource::default()
                .with_spike("HOTUSDT", now_sec(), 10)
                .with_failure("BADUSDT", "boom"),
        );
        let instruments = ["HOTUSDT", "BADUSDT", "GONEUSDT"];
        let (work_tx, work_rx) = bounded(instruments.len());
        let (result_tx, result_rx) = bounded(instruments.len());

        for i in instruments {
            work_tx.send(i.to_string()).unwrap();
        }
        drop(work_tx);

        // Returns once the closed queue is drained
        run_worker(0, ctx, work_rx, result_tx);

        let results: Vec<WorkerResult> = result_rx.iter().collect();
        assert_eq!(results.len(), instruments.len());
        let reported: Vec<&str> = results.iter().map(|r| r.instrument.as_str()).collect();
        assert_eq!(reported, instruments);
    }
}
