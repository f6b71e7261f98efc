// Instrument list and bar sources
pub mod bar_source;
pub mod bnapi_version;
pub mod instruments;

// Re-export commonly used types
pub use bar_source::{BarSource, FetchWindow};
pub use bnapi_version::BNAPIVersion;
pub use instruments::read_instrument_list;
