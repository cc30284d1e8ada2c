//! Baselines
//!
//! A baseline is a JSON report from an earlier run. Loading one annotates
//! every benchmark of the current report that also appears in it with the
//! change in mean ns/op.

use crate::config::OpbenchConfig;
use anyhow::Context;
use opbench_report::{Comparison, Report, ReportSummary, generate_json_report, parse_json_report};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Baseline location when neither the command line nor the config names one
pub const DEFAULT_BASELINE_PATH: &str = "target/opbench/baseline.json";

/// Resolve baseline path from CLI flag, config, or default.
///
/// - `Some(Some(path))`: explicit path from `--baseline /path/to/file`
/// - `Some(None)`: `--baseline` with no value, use config or default
/// - `None`: flag not passed at all
pub fn resolve_baseline_path(
    cli_baseline: &Option<Option<PathBuf>>,
    config: &OpbenchConfig,
) -> Option<PathBuf> {
    match cli_baseline {
        Some(Some(path)) => Some(path.clone()),
        Some(None) => Some(configured_or_default(config)),
        None => None,
    }
}

/// Path to save a baseline to, if saving was requested on the command line
/// or in the config.
pub fn resolve_save_path(
    cli_save: &Option<Option<PathBuf>>,
    config: &OpbenchConfig,
) -> Option<PathBuf> {
    match cli_save {
        Some(Some(path)) => Some(path.clone()),
        Some(None) => Some(configured_or_default(config)),
        None if config.output.save_baseline => Some(configured_or_default(config)),
        None => None,
    }
}

fn configured_or_default(config: &OpbenchConfig) -> PathBuf {
    config
        .output
        .baseline_path
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_BASELINE_PATH))
}

/// Load a baseline report
pub fn load_baseline(path: &Path) -> anyhow::Result<Report> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read baseline {}", path.display()))?;
    parse_json_report(&json).with_context(|| format!("Invalid baseline {}", path.display()))
}

/// Write `report` as a baseline, creating parent directories
pub fn save_baseline(path: &Path, report: &Report) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let json = generate_json_report(report)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), "baseline saved");
    Ok(())
}

/// Apply baseline comparison data to the report and recount the summary.
pub fn apply_baseline_comparison(report: &mut Report, baseline: &Report, threshold: f64) {
    report.baseline_meta = Some(baseline.meta.clone());

    let baseline_means: HashMap<&str, f64> = baseline
        .results
        .iter()
        .filter_map(|r| r.metrics.as_ref().map(|m| (r.id.as_str(), m.mean_ns)))
        .collect();

    for result in &mut report.results {
        let (Some(metrics), Some(&baseline_mean)) =
            (&result.metrics, baseline_means.get(result.id.as_str()))
        else {
            continue;
        };

        let absolute_change = metrics.mean_ns - baseline_mean;
        let relative_change = if baseline_mean > 0.0 {
            (absolute_change / baseline_mean) * 100.0
        } else {
            0.0
        };

        result.comparison = Some(Comparison {
            baseline_mean_ns: baseline_mean,
            absolute_change_ns: absolute_change,
            relative_change,
            threshold,
        });
    }

    report.summary = ReportSummary::tally(&report.results, report.summary.total_duration_ms);
}
