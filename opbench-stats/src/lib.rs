#![warn(missing_docs)]
//! opbench Statistics
//!
//! Summaries over repeated runs of the same benchmark (`--count`):
//! - Mean, median and sample standard deviation of ns/op
//! - Min/max and interquartile range
//! - Coefficient of variation as a stability signal

mod percentiles;
mod summary;

pub use percentiles::{compute_percentile, interquartile_range};
pub use summary::{SummaryStatistics, compute_summary};

/// Coefficient of variation (percent) above which runs are flagged unstable
pub const DEFAULT_CV_THRESHOLD: f64 = 5.0;
