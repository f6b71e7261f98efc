use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Read the instrument list, one identifier per line.
/// An unreadable file is fatal for the whole scan, so the error carries the path.
pub fn read_instrument_list(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read instrument list: {}", path.display()))?;
    let instruments = parse_instrument_list(&content);
    log::info!(
        "Loaded {} instruments from {}",
        instruments.len(),
        path.display()
    );
    Ok(instruments)
}

pub fn parse_instrument_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(|s| s.trim().to_uppercase()) // Trim whitespace and make uppercase
        .filter(|s| !s.is_empty()) // Filter out empty lines
        .collect()
}
