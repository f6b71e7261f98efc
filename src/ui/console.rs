use std::io::Write;

use anyhow::{Context, Result};

use crate::domain::Sample;
use crate::engine::ScanReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// One `<identifier> - Volume: <volume>` line per anomaly
    Text,
    /// The whole report, including the failure counts
    Json,
}

pub fn render_line(sample: &Sample) -> String {
    format!("{} - Volume: {}", sample.instrument, sample.volume)
}

pub fn write_report<W: Write>(out: &mut W, report: &ScanReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            for sample in &report.anomalies {
                writeln!(out, "{}", render_line(sample)).context("Failed to write report line")?;
            }
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, report).context("Failed to serialize report")?;
            writeln!(out).context("Failed to write report")?;
        }
    }
    out.flush().context("Failed to flush report")
}

/// Print to stdout. Logging goes to stderr, so stdout carries only the report.
pub fn print_report(report: &ScanReport, format: OutputFormat) -> Result<()> {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    write_report(&mut handle, report, format)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> ScanReport {
        ScanReport {
            anomalies: vec![
                Sample::new("BTCUSDT", 1_700_000_000, 123_456),
                Sample::new("ETHUSDT", 1_700_086_400, 7),
            ],
            scanned: 5,
            not_found: 2,
            fetch_failed: 1,
        }
    }

    #[test]
    fn line_format() {
        assert_eq!(
            render_line(&Sample::new("SOLUSDT", 0, 42)),
            "SOLUSDT - Volume: 42"
        );
    }

    #[test]
    fn text_report_lists_only_anomalies() {
        let mut buf = Vec::new();
        write_report(&mut buf, &report(), OutputFormat::Text).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "BTCUSDT - Volume: 123456\nETHUSDT - Volume: 7\n"
        );
    }

    #[test]
    fn empty_report_prints_nothing() {
        let mut buf = Vec::new();
        write_report(&mut buf, &ScanReport::default(), OutputFormat::Text).unwrap();
        assert!(buf.is_empty());
    }

    #[test]
    fn json_report_keeps_counts() {
        let mut buf = Vec::new();
        write_report(&mut buf, &report(), OutputFormat::Json).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["scanned"], 5);
        assert_eq!(value["fetch_failed"], 1);
        assert_eq!(value["anomalies"][0]["instrument"], "BTCUSDT");
        assert_eq!(value["anomalies"][1]["volume"], 7);
    }
}
