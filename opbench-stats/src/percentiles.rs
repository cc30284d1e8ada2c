//! Percentiles
//!
//! Linear interpolation between nearest ranks, on a sorted copy of the input.

use std::cmp::Ordering;

/// Compute a single percentile (0-100) from `samples`.
///
/// Returns 0.0 for an empty slice.
///
/// ```ignore
/// # use opbench_stats::compute_percentile;
/// let runs = vec![3.1, 2.9, 3.0];
/// assert_eq!(compute_percentile(&runs, 50.0), 3.0);
/// ```
pub fn compute_percentile(samples: &[f64], percentile: f64) -> f64 {
    match samples {
        [] => 0.0,
        [only] => *only,
        _ => percentile_of_sorted(&sorted(samples), percentile),
    }
}

/// Spread between the 25th and 75th percentile.
pub fn interquartile_range(samples: &[f64]) -> f64 {
    if samples.len() < 2 {
        return 0.0;
    }
    let sorted = sorted(samples);
    percentile_of_sorted(&sorted, 75.0) - percentile_of_sorted(&sorted, 25.0)
}

fn sorted(samples: &[f64]) -> Vec<f64> {
    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    sorted
}

fn percentile_of_sorted(sorted: &[f64], percentile: f64) -> f64 {
    let n = sorted.len();
    let p = (percentile / 100.0).clamp(0.0, 1.0);

    let rank = p * (n - 1) as f64;
    let lower_idx = rank.floor() as usize;
    let upper_idx = (lower_idx + 1).min(n - 1);
    let fraction = rank - lower_idx as f64;

    sorted[lower_idx] + fraction * (sorted[upper_idx] - sorted[lower_idx])
}
