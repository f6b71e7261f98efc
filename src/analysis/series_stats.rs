use statrs::statistics::Statistics;

use crate::domain::Sample;

/// Mean and standard deviation of the volumes in `series`.
///
/// The deviation is the *population* form (divide by N, not N - 1). On the
/// short histories we scan this gives a slightly tighter threshold than the
/// unbiased estimator, and the detector's cutoff is tuned against it.
///
/// `series` must be non-empty; callers guard the empty case.
pub fn stats(series: &[Sample]) -> (f64, f64) {
    debug_assert!(!series.is_empty(), "stats() called on an empty series");

    let volumes: Vec<f64> = series.iter().map(|s| s.volume as f64).collect();
    let mean = volumes.iter().mean();
    let std_dev = volumes.iter().population_std_dev();
    (mean, std_dev)
}
