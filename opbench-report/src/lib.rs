#![warn(missing_docs)]
//! opbench Report - Reporting
//!
//! Serializable report model and machine-readable output formats:
//! - JSON (full report, also used as the baseline format)
//! - CSV (one row per benchmark)
//!
//! Human-readable output lives in the CLI crate, next to the streaming
//! per-run lines.

mod csv;
mod json;
#[allow(missing_docs)]
mod report;

pub use csv::generate_csv_report;
pub use json::{generate_json_report, parse_json_report};
pub use report::{
    BenchmarkMetrics, BenchmarkReportResult, BenchmarkStatus, Comparison, FailureInfo, Report,
    ReportConfig, ReportMeta, ReportSummary, SCHEMA_VERSION, SystemInfo,
};

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON with full schema
    Json,
    /// CSV for spreadsheets
    Csv,
    /// Human-readable terminal output
    Human,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            "human" | "text" => Ok(OutputFormat::Human),
            other => Err(format!("Unknown output format: {}", other)),
        }
    }
}

/// Format nanoseconds with an adaptive unit (`0.31 ns`, `12.40 µs`, ...)
pub fn format_duration(ns: f64) -> String {
    let abs = ns.abs();
    if abs < 1_000.0 {
        format!("{:.2} ns", ns)
    } else if abs < 1_000_000.0 {
        format!("{:.2} µs", ns / 1_000.0)
    } else if abs < 1_000_000_000.0 {
        format!("{:.2} ms", ns / 1_000_000.0)
    } else {
        format!("{:.2} s", ns / 1_000_000_000.0)
    }
}
