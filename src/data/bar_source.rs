use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::domain::Series;
use crate::utils::time_utils::months_before;

/// The date range requested from a bar source. Bars are always daily.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl FetchWindow {
    /// The `months` calendar months ending at `end`.
    pub fn trailing_months(end: DateTime<Utc>, months: u32) -> Self {
        Self {
            start: months_before(end, months),
            end,
        }
    }

    pub fn start_ms(&self) -> i64 {
        self.start.timestamp_millis()
    }

    pub fn end_ms(&self) -> i64 {
        self.end.timestamp_millis()
    }

    /// The reference "now" the detector measures recency against.
    pub fn end_sec(&self) -> i64 {
        self.end.timestamp()
    }
}

/// A provider of daily bars for one instrument at a time.
///
/// Implementations are shared read-only between worker threads. An `Ok` with an
/// empty series means the provider knows nothing about the instrument
/// (e.g. unlisted or delisted).
pub trait BarSource: Send + Sync {
    fn fetch_daily_bars(&self, instrument: &str, window: &FetchWindow) -> Result<Series>;

    /// A unique identifier for this implementation (so that afterwards we know which one we used).
    fn signature(&self) -> &'static str;
}
