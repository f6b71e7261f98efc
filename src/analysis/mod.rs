// Statistics and anomaly detection over a single instrument's series
pub mod anomaly_detector;
pub mod series_stats;

pub use anomaly_detector::{DetectorConfig, detect};
pub use series_stats::stats;
