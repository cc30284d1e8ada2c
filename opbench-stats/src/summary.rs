//! Summary Statistics
//!
//! One sample per run: the run's ns/op. With a handful of runs there is no
//! outlier rejection; every run counts.

use crate::percentiles::{compute_percentile, interquartile_range};
use serde::{Deserialize, Serialize};

/// Summary of the per-run ns/op values of one benchmark
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryStatistics {
    /// Number of runs
    pub runs: usize,
    /// Arithmetic mean
    pub mean: f64,
    /// Median
    pub median: f64,
    /// Sample standard deviation (0 for fewer than 2 runs)
    pub std_dev: f64,
    /// Fastest run
    pub min: f64,
    /// Slowest run
    pub max: f64,
    /// Interquartile range
    pub iqr: f64,
}

/// Summarize per-run values.
pub fn compute_summary(samples: &[f64]) -> SummaryStatistics {
    if samples.is_empty() {
        return SummaryStatistics::default();
    }

    let n = samples.len();
    let mean = samples.iter().sum::<f64>() / n as f64;

    let std_dev = if n < 2 {
        0.0
    } else {
        let variance = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
        variance.sqrt()
    };

    let min = samples.iter().copied().fold(f64::INFINITY, f64::min);
    let max = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    SummaryStatistics {
        runs: n,
        mean,
        median: compute_percentile(samples, 50.0),
        std_dev,
        min,
        max,
        iqr: interquartile_range(samples),
    }
}

impl SummaryStatistics {
    /// Coefficient of variation (relative stddev, percent)
    pub fn coefficient_of_variation(&self) -> f64 {
        if self.mean == 0.0 {
            0.0
        } else {
            (self.std_dev / self.mean) * 100.0
        }
    }

    /// Whether the runs agree within `cv_threshold` percent
    pub fn is_stable(&self, cv_threshold: f64) -> bool {
        self.coefficient_of_variation() < cv_threshold
    }
}
