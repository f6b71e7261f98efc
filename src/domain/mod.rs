// Domain types and value objects
pub mod sample;

// Re-export commonly used types
pub use sample::{Sample, ScanOutcome, ScanResult, Series};
