//! Report Building
//!
//! Constructs the complete benchmark report from execution results and the
//! per-benchmark statistics.

use super::execution::{BenchExecutionResult, ExecutionConfig};
use super::metadata::build_report_meta;
use opbench_report::{
    BenchmarkMetrics, BenchmarkReportResult, FailureInfo, Report, ReportSummary,
};
use opbench_stats::SummaryStatistics;
use std::collections::HashMap;

/// Build a complete Report from execution results
///
/// Baseline comparisons are filled in afterwards.
pub fn build_report(
    results: &[BenchExecutionResult],
    stats: &[(String, Option<SummaryStatistics>)],
    config: &ExecutionConfig,
    total_duration_ms: f64,
) -> Report {
    let stats_map: HashMap<&str, &SummaryStatistics> = stats
        .iter()
        .filter_map(|(id, s)| s.as_ref().map(|s| (id.as_str(), s)))
        .collect();

    let benchmark_results: Vec<_> = results
        .iter()
        .map(|result| {
            let metrics = stats_map.get(result.benchmark_id.as_str()).map(|s| {
                let mut metrics = BenchmarkMetrics::from(*s);
                metrics.iterations = result.runs.last().map_or(0, |r| r.n);
                metrics.cycles_per_op = result.runs.iter().map(|r| r.cycles_per_op()).sum::<f64>()
                    / result.runs.len().max(1) as f64;
                metrics
            });

            let failure = result.error_message.as_ref().map(|msg| FailureInfo {
                kind: result
                    .failure_kind
                    .clone()
                    .unwrap_or_else(|| "panic".to_string()),
                message: msg.clone(),
            });

            BenchmarkReportResult {
                id: result.benchmark_id.clone(),
                group: result.group.clone(),
                status: result.status,
                file: result.file.clone(),
                line: result.line,
                runs: result.runs.clone(),
                metrics,
                comparison: None, // Filled when comparing to baseline
                failure,
            }
        })
        .collect();

    let summary = ReportSummary::tally(&benchmark_results, total_duration_ms);

    Report {
        meta: build_report_meta(config),
        results: benchmark_results,
        summary,
        baseline_meta: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::compute_statistics;
    use opbench_core::BenchmarkResult;
    use opbench_report::BenchmarkStatus;

    fn execution(
        id: &str,
        status: BenchmarkStatus,
        runs: Vec<BenchmarkResult>,
        error: Option<&str>,
    ) -> BenchExecutionResult {
        BenchExecutionResult {
            benchmark_id: id.to_string(),
            group: "scalar".to_string(),
            file: "scalar.rs".to_string(),
            line: 7,
            status,
            runs,
            failure_kind: None,
            error_message: error.map(str::to_string),
        }
    }

    #[test]
    fn test_build_report() {
        let results = vec![
            execution(
                "benchmark_ok",
                BenchmarkStatus::Passed,
                vec![
                    BenchmarkResult {
                        n: 1_000,
                        t_ns: 2_000,
                        cycles: 6_000,
                    },
                    BenchmarkResult {
                        n: 2_000,
                        t_ns: 4_000,
                        cycles: 12_000,
                    },
                ],
                None,
            ),
            execution("benchmark_boom", BenchmarkStatus::Crashed, vec![], Some("boom")),
        ];
        let stats = compute_statistics(&results);
        let config = ExecutionConfig::default();

        let report = build_report(&results, &stats, &config, 5.0);

        assert_eq!(report.summary.total_benchmarks, 2);
        assert_eq!(report.summary.passed, 1);
        assert_eq!(report.summary.crashed, 1);
        assert!(report.has_failures());
        assert_eq!(report.meta.config.bench_time, "1s");

        let ok = &report.results[0];
        let metrics = ok.metrics.as_ref().unwrap();
        assert_eq!(metrics.runs, 2);
        assert_eq!(metrics.iterations, 2_000);
        assert!((metrics.mean_ns - 2.0).abs() < 1e-9);
        assert!((metrics.cycles_per_op - 6.0).abs() < 1e-9);

        let boom = &report.results[1];
        assert!(boom.metrics.is_none());
        let failure = boom.failure.as_ref().unwrap();
        assert_eq!(failure.kind, "panic");
        assert_eq!(failure.message, "boom");
    }
}
