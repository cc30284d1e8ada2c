//! Report Data Structures

use chrono::{DateTime, Utc};
use opbench_core::BenchmarkResult;
use opbench_stats::{DEFAULT_CV_THRESHOLD, SummaryStatistics};
use serde::{Deserialize, Serialize};

/// Version of the JSON layout below
pub const SCHEMA_VERSION: u32 = 1;

/// Complete benchmark report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub meta: ReportMeta,
    pub results: Vec<BenchmarkReportResult>,
    pub summary: ReportSummary,
    /// Metadata of the baseline this report was compared against
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline_meta: Option<ReportMeta>,
}

impl Report {
    /// Whether any benchmark failed or crashed
    pub fn has_failures(&self) -> bool {
        self.summary.failed > 0 || self.summary.crashed > 0
    }
}

/// Report metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMeta {
    pub schema_version: u32,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub git_commit: Option<String>,
    pub git_branch: Option<String>,
    pub system: SystemInfo,
    pub config: ReportConfig,
}

/// Run configuration captured in report metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// `1s`, `100x`, ...
    pub bench_time: String,
    pub count: u32,
    pub max_iterations: u64,
    pub pinned_cpu: Option<usize>,
}

/// System information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemInfo {
    pub os: String,
    pub arch: String,
    pub cpu: String,
    pub cpu_cores: u32,
}

/// Individual benchmark result in the report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkReportResult {
    /// Benchmark id (`parent/child` for sub-benchmarks)
    pub id: String,
    pub group: String,
    pub status: BenchmarkStatus,
    pub file: String,
    pub line: u32,
    /// Final round of every run, in run order
    pub runs: Vec<BenchmarkResult>,
    pub metrics: Option<BenchmarkMetrics>,
    pub comparison: Option<Comparison>,
    pub failure: Option<FailureInfo>,
}

/// Benchmark execution status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BenchmarkStatus {
    Passed,
    Failed,
    Crashed,
    Skipped,
}

/// Timing metrics across runs, all per iteration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkMetrics {
    pub runs: usize,
    /// Iterations of the last run's final round
    pub iterations: u64,
    pub mean_ns: f64,
    pub median_ns: f64,
    pub std_dev_ns: f64,
    pub min_ns: f64,
    pub max_ns: f64,
    pub iqr_ns: f64,
    pub cv_percent: f64,
    /// Coefficient of variation below `DEFAULT_CV_THRESHOLD`
    pub stable: bool,
    /// Mean cycle counter ticks per iteration (0 without a cycle counter)
    pub cycles_per_op: f64,
}

impl From<&SummaryStatistics> for BenchmarkMetrics {
    fn from(stats: &SummaryStatistics) -> Self {
        Self {
            runs: stats.runs,
            iterations: 0,
            mean_ns: stats.mean,
            median_ns: stats.median,
            std_dev_ns: stats.std_dev,
            min_ns: stats.min,
            max_ns: stats.max,
            iqr_ns: stats.iqr,
            cv_percent: stats.coefficient_of_variation(),
            stable: stats.is_stable(DEFAULT_CV_THRESHOLD),
            cycles_per_op: 0.0, // Filled from the raw runs
        }
    }
}

/// Comparison against baseline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comparison {
    pub baseline_mean_ns: f64,
    pub absolute_change_ns: f64,
    /// Percent; positive is slower
    pub relative_change: f64,
    pub threshold: f64,
}

impl Comparison {
    /// Slower than baseline by more than the threshold
    pub fn is_regression(&self) -> bool {
        self.relative_change > self.threshold
    }

    /// Faster than baseline by more than the threshold
    pub fn is_improvement(&self) -> bool {
        self.relative_change < -self.threshold
    }
}

/// Failure information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureInfo {
    /// `failed`, `skipped` or `panic`
    pub kind: String,
    pub message: String,
}

/// Report summary
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total_benchmarks: usize,
    pub passed: usize,
    pub failed: usize,
    pub crashed: usize,
    pub skipped: usize,
    pub regressions: usize,
    pub improvements: usize,
    pub total_duration_ms: f64,
}

impl ReportSummary {
    /// Count statuses and baseline verdicts of `results`.
    pub fn tally(results: &[BenchmarkReportResult], total_duration_ms: f64) -> Self {
        let mut summary = ReportSummary {
            total_benchmarks: results.len(),
            total_duration_ms,
            ..Default::default()
        };
        for result in results {
            match result.status {
                BenchmarkStatus::Passed => summary.passed += 1,
                BenchmarkStatus::Failed => summary.failed += 1,
                BenchmarkStatus::Crashed => summary.crashed += 1,
                BenchmarkStatus::Skipped => summary.skipped += 1,
            }
            if let Some(cmp) = &result.comparison {
                if cmp.is_regression() {
                    summary.regressions += 1;
                } else if cmp.is_improvement() {
                    summary.improvements += 1;
                }
            }
        }
        summary
    }
}
