//! Output Formatting
//!
//! Human-readable output in the layout of Go's `testing` package:
//! a header with the platform, one line per run, `--- FAIL` blocks,
//! and a closing `PASS`/`FAIL` line with the total time. Repeated runs
//! add a summary table; a baseline adds a delta table.

use opbench_report::{BenchmarkStatus, Report, format_duration};

/// Format a report for human-readable terminal display
pub fn format_human_output(report: &Report) -> String {
    let mut output = String::new();

    output.push_str(&format!("goos: {}\n", report.meta.system.os));
    output.push_str(&format!("goarch: {}\n", report.meta.system.arch));
    output.push_str(&format!("cpu: {}\n", report.meta.system.cpu));

    let width = report.results.iter().map(|r| r.id.len()).max().unwrap_or(0);

    for result in &report.results {
        for run in &result.runs {
            output.push_str(&format!("{:<width$}\t{}\n", result.id, run));
        }
        if let Some(failure) = &result.failure {
            let label = match result.status {
                BenchmarkStatus::Skipped => "SKIP",
                _ => "FAIL",
            };
            output.push_str(&format!("--- {}: {}\n", label, result.id));
            output.push_str(&format!("    {}\n", failure.message));
        }
    }

    // Summaries across repeated runs
    let repeated: Vec<_> = report
        .results
        .iter()
        .filter_map(|r| r.metrics.as_ref().map(|m| (r, m)))
        .filter(|(_, m)| m.runs > 1)
        .collect();
    if !repeated.is_empty() {
        output.push('\n');
        output.push_str(&format!(
            "{:<width$}  {:>12}  {:>12}  {:>12}  {:>12}  {:>12}  {:>7}\n",
            "name", "mean", "median", "min", "max", "iqr", "cv"
        ));
        for (result, m) in repeated {
            output.push_str(&format!(
                "{:<width$}  {:>12}  {:>12}  {:>12}  {:>12}  {:>12}  {:>6.2}%{}\n",
                result.id,
                format_duration(m.mean_ns),
                format_duration(m.median_ns),
                format_duration(m.min_ns),
                format_duration(m.max_ns),
                format_duration(m.iqr_ns),
                m.cv_percent,
                if m.stable { "" } else { " (unstable)" },
            ));
        }
    }

    // Baseline deltas
    let compared: Vec<_> = report
        .results
        .iter()
        .filter_map(|r| Some((r, r.metrics.as_ref()?, r.comparison.as_ref()?)))
        .collect();
    if !compared.is_empty() {
        output.push('\n');
        output.push_str(&format!(
            "{:<width$}  {:>12}  {:>12}  {:>9}\n",
            "name", "old ns/op", "new ns/op", "delta"
        ));
        for (result, m, cmp) in compared {
            let verdict = if cmp.is_regression() {
                " (regression)"
            } else if cmp.is_improvement() {
                " (improvement)"
            } else {
                ""
            };
            output.push_str(&format!(
                "{:<width$}  {:>12}  {:>12}  {:>+8.2}%{}\n",
                result.id,
                format_duration(cmp.baseline_mean_ns),
                format_duration(m.mean_ns),
                cmp.relative_change,
                verdict,
            ));
        }
    }

    let seconds = report.summary.total_duration_ms / 1000.0;
    if report.has_failures() {
        output.push_str("FAIL\n");
        output.push_str(&format!("FAIL\t{:.3}s\n", seconds));
    } else {
        output.push_str("PASS\n");
        output.push_str(&format!("ok  \t{:.3}s\n", seconds));
    }

    output
}
