#![warn(missing_docs)]
//! # opbench
//!
//! Go-style adaptive micro-benchmarking for Rust.
//!
//! A benchmark is a function that receives `&mut Bencher`, runs its body
//! `b.n()` times and hands the result to `b.consume(..)`. The harness grows
//! `N` until a round fills the time budget and reports nanoseconds per
//! iteration:
//! - **Adaptive N**: 1, then predicted from the last round, rounded to 1/2/3/5·10^k
//! - **Explicit timer**: `start_timer`/`stop_timer`/`reset_timer`; the sink stops it
//! - **Sub-benchmarks**: `b.run("name", |b| ..)` reported as `parent/name`
//! - **Repeated runs**: `--count k` with mean, median, stddev and CV
//! - **Baselines**: save a JSON report and compare later runs against it
//!
//! ## Quick Start
//!
//! ```ignore
//! use opbench::bench;
//! use opbench::prelude::*;
//!
//! #[bench]
//! fn benchmark_int_add(b: &mut Bencher) {
//!     let mut val = 1i64;
//!     for i in 0..b.n() {
//!         val = val.wrapping_add(std::hint::black_box(i) as i64);
//!     }
//!     b.consume(val);
//! }
//!
//! fn main() -> anyhow::Result<()> {
//!     opbench::run()
//! }
//! ```
//!
//! Register the binary with `harness = false` under `[[bench]]` and run it
//! with `cargo bench`.

// Re-export core types
pub use opbench_core::{
    BenchTime, Bencher, BenchmarkDef, BenchmarkResult, LaunchConfig, MAX_ITERATIONS, Measurement,
    Outcome, consume, measure, registered,
};

// Re-export macros
pub use opbench_macros::bench;

// Re-export stats
pub use opbench_stats::{SummaryStatistics, compute_summary};

/// Internal re-exports for macro use
#[doc(hidden)]
pub mod internal {
    pub use inventory;
}

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{Bencher, bench, consume};
}

/// Run the opbench CLI harness.
///
/// Call this from your benchmark binary's `main()`:
/// ```ignore
/// fn main() -> anyhow::Result<()> {
///     opbench::run()
/// }
/// ```
pub use opbench_cli::run;
