//! Statistics Computation
//!
//! Summaries across the runs of each benchmark, computed with Rayon once
//! all measurement is finished. No benchmark code runs on the pool.

use super::execution::BenchExecutionResult;
use opbench_stats::{SummaryStatistics, compute_summary};
use rayon::prelude::*;

/// Compute ns/op statistics for benchmark results (parallelized with Rayon)
///
/// Returns `None` for benchmarks without a passed run.
pub fn compute_statistics(
    results: &[BenchExecutionResult],
) -> Vec<(String, Option<SummaryStatistics>)> {
    results
        .par_iter()
        .map(|r| {
            if r.runs.is_empty() {
                (r.benchmark_id.clone(), None)
            } else {
                let ns_per_op: Vec<f64> = r.runs.iter().map(|run| run.ns_per_op_f64()).collect();
                (r.benchmark_id.clone(), Some(compute_summary(&ns_per_op)))
            }
        })
        .collect()
}
