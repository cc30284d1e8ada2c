//! CSV Output
//!
//! One row per benchmark. Times are nanoseconds per iteration.

use crate::report::{BenchmarkStatus, Report};

const HEADER: &str = "id,group,status,runs,iterations,mean_ns,median_ns,std_dev_ns,min_ns,max_ns,cv_percent,cycles_per_op,baseline_mean_ns,relative_change_pct";

/// Generate a CSV report
pub fn generate_csv_report(report: &Report) -> String {
    let mut output = String::from(HEADER);
    output.push('\n');

    for result in &report.results {
        let status = match result.status {
            BenchmarkStatus::Passed => "passed",
            BenchmarkStatus::Failed => "failed",
            BenchmarkStatus::Crashed => "crashed",
            BenchmarkStatus::Skipped => "skipped",
        };

        let mut row = vec![escape(&result.id), escape(&result.group), status.to_string()];

        match &result.metrics {
            Some(m) => row.extend([
                m.runs.to_string(),
                m.iterations.to_string(),
                format!("{:.4}", m.mean_ns),
                format!("{:.4}", m.median_ns),
                format!("{:.4}", m.std_dev_ns),
                format!("{:.4}", m.min_ns),
                format!("{:.4}", m.max_ns),
                format!("{:.2}", m.cv_percent),
                format!("{:.2}", m.cycles_per_op),
            ]),
            None => row.extend(std::iter::repeat_n(String::new(), 9)),
        }

        match &result.comparison {
            Some(c) => row.extend([
                format!("{:.4}", c.baseline_mean_ns),
                format!("{:.2}", c.relative_change),
            ]),
            None => row.extend([String::new(), String::new()]),
        }

        output.push_str(&row.join(","));
        output.push('\n');
    }

    output
}

/// Quote a field if it contains a delimiter, quote or newline.
fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
