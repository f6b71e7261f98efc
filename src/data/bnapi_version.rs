pub mod bn_kline;

use anyhow::Result;
use tokio::runtime::Handle;
use tokio::time::Instant;

use crate::data::bar_source::{BarSource, FetchWindow};
use crate::domain::Series;

/// Daily bars from the Binance spot REST API.
///
/// Workers are plain threads, so each fetch is driven to completion on the
/// supplied runtime with `Handle::block_on`. Callers must not invoke it from
/// inside that runtime's own worker threads.
pub struct BNAPIVersion {
    runtime: Handle,
}

impl BNAPIVersion {
    pub fn new(runtime: Handle) -> Self {
        Self { runtime }
    }
}

impl BarSource for BNAPIVersion {
    fn signature(&self) -> &'static str {
        "Binance API"
    }

    fn fetch_daily_bars(&self, instrument: &str, window: &FetchWindow) -> Result<Series> {
        let start_time = Instant::now();
        let series = self
            .runtime
            .block_on(bn_kline::load_daily_klines(instrument, window))?;
        log::debug!(
            "{} fetched {} daily klines in {:?}",
            instrument,
            series.len(),
            start_time.elapsed()
        );
        Ok(series)
    }
}
