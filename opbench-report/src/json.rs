//! JSON Output

use crate::report::Report;

/// Generate a prettified JSON report.
///
/// The same document doubles as a baseline file for later runs.
pub fn generate_json_report(report: &Report) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}

/// Parse a JSON report, typically a saved baseline.
pub fn parse_json_report(json: &str) -> Result<Report, serde_json::Error> {
    serde_json::from_str(json)
}
