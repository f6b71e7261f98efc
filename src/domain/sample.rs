use serde::Serialize;

/// One daily observation for an instrument.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub instrument: String,
    /// Seconds since the Unix epoch (bar open time)
    pub timestamp: i64,
    pub volume: u64,
}

impl Sample {
    pub fn new(instrument: impl Into<String>, timestamp: i64, volume: u64) -> Self {
        Sample {
            instrument: instrument.into(),
            timestamp,
            volume,
        }
    }
}

/// Samples for a single instrument, ordered by increasing timestamp.
pub type Series = Vec<Sample>;

/// Detected anomalies, at most one per instrument.
pub type ScanResult = Vec<Sample>;

/// What a worker reports for one instrument.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    Found(Sample),
    NotFound,
    /// The bar source errored. Kept apart from `NotFound` so data problems
    /// stay visible in the scan summary.
    FetchFailed(String),
}

impl ScanOutcome {
    pub fn anomaly(self) -> Option<Sample> {
        match self {
            ScanOutcome::Found(sample) => Some(sample),
            ScanOutcome::NotFound | ScanOutcome::FetchFailed(_) => None,
        }
    }
}

impl From<Option<Sample>> for ScanOutcome {
    fn from(detected: Option<Sample>) -> Self {
        match detected {
            Some(sample) => ScanOutcome::Found(sample),
            None => ScanOutcome::NotFound,
        }
    }
}

impl std::fmt::Display for ScanOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ScanOutcome::Found(sample) => write!(f, "anomaly (volume {})", sample.volume),
            ScanOutcome::NotFound => write!(f, "no anomaly"),
            ScanOutcome::FetchFailed(reason) => write!(f, "fetch failed: {}", reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_volume_at_epoch_is_still_an_anomaly() {
        // The variant, not the field values, decides whether something was found.
        let outcome = ScanOutcome::from(Some(Sample::new("ABCUSDT", 0, 0)));
        assert_eq!(outcome.anomaly(), Some(Sample::new("ABCUSDT", 0, 0)));
    }

    #[test]
    fn failures_and_misses_carry_no_sample() {
        assert_eq!(ScanOutcome::from(None), ScanOutcome::NotFound);
        assert_eq!(ScanOutcome::NotFound.anomaly(), None);
        assert_eq!(ScanOutcome::FetchFailed("timeout".into()).anomaly(), None);
    }
}
