// Console rendering of scan results
pub mod console;

pub use console::{OutputFormat, print_report, render_line};
