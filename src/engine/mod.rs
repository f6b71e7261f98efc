pub mod core;
pub mod messages;
pub mod worker;

// Re-export key components
pub use self::core::{ScanCoordinator, ScanReport};
pub use messages::{WorkerContext, WorkerResult};
