use std::sync::Arc;

use crate::analysis::DetectorConfig;
use crate::data::{BarSource, FetchWindow};
use crate::domain::ScanOutcome;

/// Everything a worker needs besides the two queues. Cloned into every worker.
pub struct WorkerContext<S: BarSource> {
    pub source: Arc<S>,
    pub window: FetchWindow,
    pub detector: DetectorConfig,
}

impl<S: BarSource> Clone for WorkerContext<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            window: self.window,
            detector: self.detector.clone(),
        }
    }
}

/// The result returned by the worker, exactly one per instrument
#[derive(Debug, Clone)]
pub struct WorkerResult {
    pub instrument: String,
    pub duration_ms: u128,
    pub outcome: ScanOutcome,
}
