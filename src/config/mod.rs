//! Configuration module for the volume spike scanner.

pub mod binance;
pub mod scan;

// Re-export commonly used items
pub use binance::BINANCE;
pub use scan::{SCAN, ScanConfig};
