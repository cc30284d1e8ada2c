//! Benchmark Execution
//!
//! Every selected benchmark is measured `count` times on the calling thread,
//! each time with a fresh [`Bencher`](opbench_core::Bencher). A benchmark
//! that spawns sub-benchmarks yields one result per sub-benchmark.
//!
//! With streaming on, one line per finished run goes to stderr in the Go
//! layout as soon as it is measured:
//!
//! ```text
//! benchmark_int_add_int   	1000000000	         0.31 ns/op
//! ```

use indicatif::{ProgressBar, ProgressStyle};
use opbench_core::{BenchmarkDef, BenchmarkResult, LaunchConfig, Measurement, Outcome};
use opbench_report::BenchmarkStatus;
use std::panic::{AssertUnwindSafe, catch_unwind};

/// Configuration for benchmark execution
#[derive(Debug, Clone)]
pub struct ExecutionConfig {
    /// Budget and iteration cap handed to the launcher
    pub launch: LaunchConfig,
    /// How many times each benchmark is measured
    pub count: u32,
    /// CPU to pin the measuring thread to
    pub pin_cpu: Option<usize>,
    /// Print run and failure lines to stderr while measuring
    pub stream: bool,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            launch: LaunchConfig::default(),
            count: 1,
            pin_cpu: None,
            stream: true,
        }
    }
}

/// Result from executing a single benchmark (or sub-benchmark)
#[derive(Debug)]
#[allow(missing_docs)]
pub struct BenchExecutionResult {
    pub benchmark_id: String,
    pub group: String,
    pub file: String,
    pub line: u32,
    pub status: BenchmarkStatus,
    /// Final round of each passed run
    pub runs: Vec<BenchmarkResult>,
    pub failure_kind: Option<String>,
    pub error_message: Option<String>,
}

impl BenchExecutionResult {
    fn new(bench: &BenchmarkDef, id: &str) -> Self {
        Self {
            benchmark_id: id.to_string(),
            group: bench.group.to_string(),
            file: bench.file.to_string(),
            line: bench.line,
            status: BenchmarkStatus::Passed,
            runs: Vec::new(),
            failure_kind: None,
            error_message: None,
        }
    }

    /// Record a failed, skipped or crashed run. Runs that passed earlier are
    /// dropped so the benchmark gets no metrics.
    fn mark(&mut self, status: BenchmarkStatus, kind: &str, message: impl Into<String>) {
        self.runs.clear();
        self.status = status;
        self.failure_kind = Some(kind.to_string());
        self.error_message = Some(message.into());
    }
}

/// Execute benchmarks and produce results
pub struct Executor {
    config: ExecutionConfig,
    results: Vec<BenchExecutionResult>,
}

impl Executor {
    /// Create an executor for `config`
    pub fn new(config: ExecutionConfig) -> Self {
        Self {
            config,
            results: Vec::new(),
        }
    }

    /// Execute all provided benchmarks, in order
    pub fn execute(&mut self, benchmarks: &[&BenchmarkDef]) -> Vec<BenchExecutionResult> {
        if let Some(cpu) = self.config.pin_cpu {
            match opbench_core::pin_to_cpu(cpu) {
                Ok(()) => tracing::debug!(cpu, "pinned measuring thread"),
                Err(e) => tracing::warn!(cpu, error = %e, "could not pin measuring thread"),
            }
        }

        let pb = ProgressBar::new(benchmarks.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        pb.enable_steady_tick(std::time::Duration::from_millis(100));

        let mut width = benchmarks.iter().map(|b| b.id.len()).max().unwrap_or(0);

        for bench in benchmarks {
            pb.set_message(bench.id.to_string());
            let results = self.execute_single(bench, &pb, &mut width);
            self.results.extend(results);
            pb.inc(1);
        }

        pb.finish_and_clear();
        std::mem::take(&mut self.results)
    }

    /// Measure one benchmark `count` times
    fn execute_single(
        &self,
        bench: &BenchmarkDef,
        pb: &ProgressBar,
        width: &mut usize,
    ) -> Vec<BenchExecutionResult> {
        let mut entries: Vec<BenchExecutionResult> = Vec::new();

        for run in 0..self.config.count.max(1) {
            let measured = catch_unwind(AssertUnwindSafe(|| bench.measure(&self.config.launch)));

            let measurement = match measured {
                Ok(m) => m,
                Err(panic) => {
                    let message = panic_message(panic.as_ref());
                    tracing::debug!(benchmark = bench.id, run, %message, "benchmark panicked");
                    self.emit(pb, format!("--- FAIL: {} (panic)\n    {}", bench.id, message));
                    entry(&mut entries, bench, bench.id).mark(
                        BenchmarkStatus::Crashed,
                        "panic",
                        message,
                    );
                    break;
                }
            };

            let mut stop = false;
            for m in reported(&measurement) {
                let e = entry(&mut entries, bench, &m.name);
                match &m.outcome {
                    Outcome::Passed => {
                        e.runs.push(m.result);
                        self.emit(pb, run_line(&m.name, &m.result, width));
                    }
                    Outcome::Failed(message) => {
                        self.emit(pb, format!("--- FAIL: {}\n    {}", m.name, message));
                        e.mark(BenchmarkStatus::Failed, "failed", message.as_str());
                        stop = true;
                    }
                    Outcome::Skipped(reason) => {
                        self.emit(pb, format!("--- SKIP: {}\n    {}", m.name, reason));
                        e.mark(BenchmarkStatus::Skipped, "skipped", reason.as_str());
                        stop = true;
                    }
                }
            }
            if stop {
                break;
            }
        }

        entries
    }

    fn emit(&self, pb: &ProgressBar, line: String) {
        if self.config.stream {
            pb.suspend(|| eprintln!("{}", line));
        }
    }
}

/// Go-style run line. The name column grows to fit names longer than any
/// seen so far, such as `parent/child`.
fn run_line(name: &str, result: &BenchmarkResult, width: &mut usize) -> String {
    *width = (*width).max(name.len());
    format!("{:<w$}\t{}", name, result, w = *width)
}

/// Measurements that get a result of their own: every directly measured
/// leaf, plus a parent that failed or skipped after spawning sub-benchmarks.
fn reported(m: &Measurement) -> Vec<&Measurement> {
    let mut out = m.leaves();
    if !m.subs.is_empty() && !m.outcome.is_passed() {
        out.push(m);
    }
    out
}

/// Entry for `id`, created on first sight so results keep first-run order
fn entry<'a>(
    entries: &'a mut Vec<BenchExecutionResult>,
    bench: &BenchmarkDef,
    id: &str,
) -> &'a mut BenchExecutionResult {
    let idx = match entries.iter().position(|e| e.benchmark_id == id) {
        Some(idx) => idx,
        None => {
            entries.push(BenchExecutionResult::new(bench, id));
            entries.len() - 1
        }
    };
    &mut entries[idx]
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opbench_core::{BenchTime, Bencher};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn def(id: &'static str, runner_fn: fn(&mut Bencher)) -> BenchmarkDef {
        BenchmarkDef {
            id,
            name: id,
            group: "test",
            tags: &[],
            runner_fn,
            file: "test.rs",
            line: 1,
            module_path: "",
            iterations: None,
            bench_time_ns: None,
        }
    }

    fn config(count: u32) -> ExecutionConfig {
        ExecutionConfig {
            launch: LaunchConfig {
                bench_time: BenchTime::Iterations(100),
                ..Default::default()
            },
            count,
            pin_cpu: None,
            stream: false,
        }
    }

    fn sum(b: &mut Bencher) {
        let mut acc = 0u64;
        for i in 0..b.n() {
            acc = acc.wrapping_add(std::hint::black_box(i));
        }
        b.consume(acc);
    }

    #[test]
    fn test_count_repeats_runs() {
        let bench = def("benchmark_sum", sum);
        let results = Executor::new(config(3)).execute(&[&bench]);

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].status, BenchmarkStatus::Passed);
        assert_eq!(results[0].runs.len(), 3);
        assert!(results[0].runs.iter().all(|r| r.n == 100));
    }

    #[test]
    fn test_panic_is_reported_as_crash() {
        let crashing = def("benchmark_crash", |_| panic!("boom"));
        let fine = def("benchmark_sum", sum);
        let results = Executor::new(config(1)).execute(&[&crashing, &fine]);

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].status, BenchmarkStatus::Crashed);
        assert_eq!(results[0].error_message.as_deref(), Some("boom"));
        assert_eq!(results[1].status, BenchmarkStatus::Passed);
    }

    #[test]
    fn test_failure_stops_further_runs() {
        let failing = def("benchmark_fail", |b| b.fail("bad input"));
        let results = Executor::new(config(5)).execute(&[&failing]);

        assert_eq!(results[0].status, BenchmarkStatus::Failed);
        assert_eq!(results[0].failure_kind.as_deref(), Some("failed"));
        assert!(results[0].runs.is_empty());
    }

    #[test]
    fn test_skip_is_reported() {
        let skipping = def("benchmark_skip", |b| b.skip("not on this platform"));
        let results = Executor::new(config(1)).execute(&[&skipping]);

        assert_eq!(results[0].status, BenchmarkStatus::Skipped);
        assert_eq!(
            results[0].error_message.as_deref(),
            Some("not on this platform")
        );
    }

    #[test]
    fn test_panic_on_later_run_drops_earlier_runs() {
        static FINAL_ROUNDS: AtomicUsize = AtomicUsize::new(0);

        // Passes the first run, panics in the final round of the second.
        let flaky = def("benchmark_flaky", |b| {
            if b.n() == 100 && FINAL_ROUNDS.fetch_add(1, Ordering::SeqCst) > 0 {
                panic!("second run");
            }
            sum(b);
        });
        let results = Executor::new(config(3)).execute(&[&flaky]);

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].status, BenchmarkStatus::Crashed);
        assert!(results[0].runs.is_empty());

        let stats = crate::executor::compute_statistics(&results);
        assert!(stats[0].1.is_none());
    }

    #[test]
    fn test_failure_on_later_run_drops_earlier_runs() {
        static RUNS: AtomicUsize = AtomicUsize::new(0);

        let flaky = def("benchmark_flaky_fail", |b| {
            if b.n() == 100 && RUNS.fetch_add(1, Ordering::SeqCst) > 0 {
                b.fail("drifted");
                return;
            }
            sum(b);
        });
        let results = Executor::new(config(3)).execute(&[&flaky]);

        assert_eq!(results[0].status, BenchmarkStatus::Failed);
        assert!(results[0].runs.is_empty());
    }

    #[test]
    fn test_run_line_widens_for_sub_names() {
        let result = BenchmarkResult {
            n: 1000,
            t_ns: 250_000,
            cycles: 0,
        };
        let mut width = "benchmark_parent".len();

        let line = run_line("benchmark_parent/small", &result, &mut width);
        assert_eq!(width, "benchmark_parent/small".len());
        assert!(line.starts_with("benchmark_parent/small\t"));

        let line = run_line("benchmark_x", &result, &mut width);
        assert_eq!(width, "benchmark_parent/small".len());
        assert!(line.starts_with(&format!("{:<22}\t", "benchmark_x")));
    }

    #[test]
    fn test_sub_benchmarks_get_own_results() {
        let parent = def("benchmark_parent", |b| {
            b.run("small", sum);
            b.run("large", sum);
        });
        let results = Executor::new(config(2)).execute(&[&parent]);

        let ids: Vec<_> = results.iter().map(|r| r.benchmark_id.as_str()).collect();
        assert_eq!(ids, vec!["benchmark_parent/small", "benchmark_parent/large"]);
        assert!(results.iter().all(|r| r.runs.len() == 2));
        assert!(results.iter().all(|r| r.group == "test"));
    }
}
