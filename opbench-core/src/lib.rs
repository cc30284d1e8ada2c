#![warn(missing_docs)]
//! opbench Core - Benchmark Runtime
//!
//! This crate provides the execution environment for benchmarks:
//! - `Bencher`, the context a benchmark reads `N` from and reports its result to
//! - The adaptive launcher that grows `N` until a time budget is met
//! - High-precision timing with cycle counts where the CPU provides them
//! - The registry of benchmarks submitted by `#[bench]`

mod bencher;
mod launch;
mod measure;

pub use bencher::{Bencher, BenchmarkResult, Outcome, consume};
pub use launch::{
    BenchTime, DEFAULT_BENCH_TIME, LaunchConfig, MAX_ITERATIONS, Measurement, ParseBenchTimeError,
    measure, predict_iterations, round_down_10, round_up,
};
/// Whether this platform provides hardware cycle counters (x86_64 RDTSCP or AArch64 CNTVCT_EL0).
/// When `false`, cycle counts are reported as 0 and only wall-clock nanoseconds are available.
pub use measure::HAS_CYCLE_COUNTER;
pub use measure::{Elapsed, Timer, pin_to_cpu};

use std::time::Duration;

/// Name prefix every registered benchmark function carries
pub const BENCHMARK_PREFIX: &str = "benchmark_";

/// Benchmark definition registered via `#[bench]`
#[derive(Debug, Clone)]
pub struct BenchmarkDef {
    /// Unique identifier
    pub id: &'static str,
    /// Function name
    pub name: &'static str,
    /// Group this benchmark belongs to
    pub group: &'static str,
    /// Tags for filtering
    pub tags: &'static [&'static str],
    /// Function pointer to the wrapper
    pub runner_fn: fn(&mut Bencher),
    /// Source file path
    pub file: &'static str,
    /// Source line number
    pub line: u32,
    /// Module path
    pub module_path: &'static str,
    /// Per-benchmark fixed iteration count
    pub iterations: Option<u64>,
    /// Per-benchmark time budget (nanoseconds)
    pub bench_time_ns: Option<u64>,
}

impl BenchmarkDef {
    /// Merge per-benchmark overrides into the global launch configuration.
    ///
    /// A fixed iteration count wins over a time budget.
    pub fn launch_config(&self, global: &LaunchConfig) -> LaunchConfig {
        let bench_time = match (self.iterations, self.bench_time_ns) {
            (Some(n), _) => BenchTime::Iterations(n),
            (None, Some(ns)) => BenchTime::Duration(Duration::from_nanos(ns)),
            (None, None) => global.bench_time,
        };
        LaunchConfig {
            bench_time,
            ..global.clone()
        }
    }

    /// Fully qualified function path, `crate::module::benchmark_x`
    pub fn path(&self) -> String {
        if self.module_path.is_empty() {
            self.name.to_string()
        } else {
            format!("{}::{}", self.module_path, self.name)
        }
    }

    /// Measure this benchmark.
    pub fn measure(&self, global: &LaunchConfig) -> Measurement {
        measure(self.id, self.runner_fn, &self.launch_config(global))
    }
}

inventory::collect!(BenchmarkDef);

/// All registered benchmarks, in registration order
pub fn registered() -> Vec<&'static BenchmarkDef> {
    inventory::iter::<BenchmarkDef>.into_iter().collect()
}
