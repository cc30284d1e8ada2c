//! Bencher - The Benchmark Context
//!
//! A benchmark receives `&mut Bencher`, reads the target iteration count with
//! [`Bencher::n`], runs its body exactly that many times and hands the final
//! value to [`Bencher::consume`]. The timer is started by the harness before
//! the body runs; `consume` stops it, so anything after the sink is free.
//!
//! ```ignore
//! fn benchmark_sum(b: &mut Bencher) {
//!     let mut acc = 0u64;
//!     for i in 0..b.n() {
//!         acc = acc.wrapping_add(std::hint::black_box(i));
//!     }
//!     b.consume(acc);
//! }
//! ```

use crate::launch::{LaunchConfig, Measurement, measure};
use crate::measure::{Elapsed, Timer};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Timing of one measured round: `n` iterations took `t_ns` nanoseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchmarkResult {
    /// Number of iterations
    pub n: u64,
    /// Total timed nanoseconds
    pub t_ns: u64,
    /// Total cycle counter ticks (0 without a cycle counter)
    pub cycles: u64,
}

impl BenchmarkResult {
    /// Whole nanoseconds per iteration, 0 when no iterations ran.
    pub fn ns_per_op(&self) -> u64 {
        if self.n == 0 {
            return 0;
        }
        self.t_ns / self.n
    }

    /// Fractional nanoseconds per iteration, 0.0 when no iterations ran.
    pub fn ns_per_op_f64(&self) -> f64 {
        if self.n == 0 {
            return 0.0;
        }
        self.t_ns as f64 / self.n as f64
    }

    /// Cycle counter ticks per iteration, 0.0 when no iterations ran.
    pub fn cycles_per_op(&self) -> f64 {
        if self.n == 0 {
            return 0.0;
        }
        self.cycles as f64 / self.n as f64
    }

    /// Fold a sub-benchmark into this result as if it ran once in sequence.
    pub fn add(&mut self, other: &BenchmarkResult) {
        self.n = 1;
        self.t_ns = self.t_ns.saturating_add(other.ns_per_op());
    }
}

impl fmt::Display for BenchmarkResult {
    /// `iterations<TAB>ns/op`, aligned so the ones digits line up whether
    /// ns/op is shown with zero, one or two decimals.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ns_per_op = self.ns_per_op();
        let ns = if self.n > 0 && ns_per_op < 10 {
            format!("{:>13.2} ns/op", self.ns_per_op_f64())
        } else if self.n > 0 && ns_per_op < 100 {
            format!("{:>12.1} ns/op", self.ns_per_op_f64())
        } else {
            format!("{:>10} ns/op", ns_per_op)
        };
        write!(f, "{:>8}\t{}", self.n, ns)
    }
}

/// How a benchmark ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "message", rename_all = "lowercase")]
pub enum Outcome {
    /// Ran to completion
    Passed,
    /// Called [`Bencher::fail`]
    Failed(String),
    /// Called [`Bencher::skip`]
    Skipped(String),
}

impl Outcome {
    /// Whether the benchmark is still in good standing
    pub fn is_passed(&self) -> bool {
        matches!(self, Outcome::Passed)
    }
}

/// Benchmark context handed to every benchmark function.
pub struct Bencher {
    name: String,
    n: u64,
    config: LaunchConfig,

    timer: Option<Timer>,
    elapsed: Elapsed,

    consumed: u64,
    outcome: Outcome,
    schedule: Vec<u64>,
    subs: Vec<Measurement>,
}

impl Bencher {
    /// Create a context for the benchmark `name`.
    pub fn new(name: impl Into<String>, config: LaunchConfig) -> Self {
        Self {
            name: name.into(),
            n: 0,
            config,
            timer: None,
            elapsed: Elapsed::default(),
            consumed: 0,
            outcome: Outcome::Passed,
            schedule: Vec::new(),
            subs: Vec::new(),
        }
    }

    /// Full benchmark name (`parent/child` for sub-benchmarks)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of iterations the body must run in this round.
    #[inline]
    pub fn n(&self) -> u64 {
        self.n
    }

    /// Launch configuration inherited by sub-benchmarks
    pub fn config(&self) -> &LaunchConfig {
        &self.config
    }

    /// Start timing. Does nothing if the timer is already running.
    #[inline]
    pub fn start_timer(&mut self) {
        if self.timer.is_none() {
            self.timer = Some(Timer::start());
        }
    }

    /// Stop timing and add the running interval to the round's total.
    /// Does nothing if the timer is stopped.
    #[inline]
    pub fn stop_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            self.elapsed += timer.elapsed();
        }
    }

    /// Zero the round's elapsed time. A running timer keeps running from now.
    #[inline]
    pub fn reset_timer(&mut self) {
        if self.timer.is_some() {
            self.timer = Some(Timer::start());
        }
        self.elapsed = Elapsed::default();
    }

    /// Whether the timer is currently running
    pub fn timer_running(&self) -> bool {
        self.timer.is_some()
    }

    /// Timed duration of the current round (excluding a still-running interval)
    pub fn elapsed(&self) -> Duration {
        self.elapsed.duration()
    }

    /// The result sink. Stops the timer, then passes `value` through an
    /// optimization barrier so the work that produced it stays observable.
    #[inline(never)]
    pub fn consume<T>(&mut self, value: T) {
        self.stop_timer();
        self.consumed += 1;
        std::hint::black_box(value);
    }

    /// How many times [`Bencher::consume`] ran in the current round
    pub fn consume_count(&self) -> u64 {
        self.consumed
    }

    /// Mark the benchmark failed. The launcher stops scheduling rounds.
    pub fn fail(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(benchmark = %self.name, %message, "benchmark failed");
        self.outcome = Outcome::Failed(message);
    }

    /// Mark the benchmark skipped. The launcher stops scheduling rounds.
    pub fn skip(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        tracing::debug!(benchmark = %self.name, %reason, "benchmark skipped");
        self.outcome = Outcome::Skipped(reason);
    }

    /// Current outcome
    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    /// Run `f` as a sub-benchmark called `name`.
    ///
    /// A benchmark that calls `run` is not measured itself; each
    /// sub-benchmark gets its own adaptive launch. Returns `false` if the
    /// sub-benchmark failed.
    pub fn run<F>(&mut self, name: &str, f: F) -> bool
    where
        F: FnMut(&mut Bencher),
    {
        // The parent's own timing is meaningless once it has children.
        self.stop_timer();

        let full_name = if self.name.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", self.name, name)
        };

        let sub = measure(full_name, f, &self.config);
        let ok = !matches!(sub.outcome, Outcome::Failed(_));
        self.subs.push(sub);
        ok
    }

    /// Whether [`Bencher::run`] has been called
    pub fn has_subs(&self) -> bool {
        !self.subs.is_empty()
    }

    /// Run one measured round of `n` iterations.
    pub fn run_n<F>(&mut self, n: u64, f: &mut F)
    where
        F: FnMut(&mut Bencher),
    {
        self.n = n;
        self.consumed = 0;
        self.reset_timer();
        self.start_timer();
        f(self);
        self.stop_timer();
        self.schedule.push(n);
    }

    /// Result of the most recent round
    pub fn result(&self) -> BenchmarkResult {
        BenchmarkResult {
            n: self.n,
            t_ns: self.elapsed.nanos,
            cycles: self.elapsed.cycles,
        }
    }

    /// Nanoseconds per iteration of the most recent round
    pub(crate) fn ns_per_op(&self) -> u64 {
        self.result().ns_per_op()
    }

    /// Consume the context into its measurement.
    pub(crate) fn into_measurement(self) -> Measurement {
        let result = if self.subs.is_empty() {
            self.result()
        } else {
            let mut aggregate = BenchmarkResult::default();
            for sub in &self.subs {
                aggregate.add(&sub.result);
            }
            aggregate
        };

        Measurement {
            name: self.name,
            result,
            outcome: self.outcome,
            schedule: self.schedule,
            consumed: self.consumed > 0,
            subs: self.subs,
        }
    }
}

/// Free-function form of [`Bencher::consume`].
#[inline(never)]
pub fn consume<T>(b: &mut Bencher, value: T) {
    b.consume(value);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bencher() -> Bencher {
        Bencher::new("test", LaunchConfig::default())
    }

    #[test]
    fn test_start_stop_idempotent() {
        let mut b = bencher();
        b.start_timer();
        b.start_timer();
        assert!(b.timer_running());
        b.stop_timer();
        b.stop_timer();
        assert!(!b.timer_running());
    }

    #[test]
    fn test_stopped_time_is_not_counted() {
        let mut b = bencher();
        b.start_timer();
        b.stop_timer();
        let before = b.elapsed();
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(b.elapsed(), before);
    }

    #[test]
    fn test_reset_zeroes_elapsed() {
        let mut b = bencher();
        b.start_timer();
        std::thread::sleep(Duration::from_millis(2));
        b.stop_timer();
        assert!(b.elapsed() > Duration::ZERO);

        b.reset_timer();
        assert_eq!(b.elapsed(), Duration::ZERO);
        assert!(!b.timer_running());
    }

    #[test]
    fn test_consume_stops_timer() {
        let mut b = bencher();
        b.run_n(10, &mut |b: &mut Bencher| {
            let mut acc = 0u64;
            for i in 0..b.n() {
                acc += i;
            }
            b.consume(acc);
            assert!(!b.timer_running());
            std::thread::sleep(Duration::from_millis(20));
        });

        assert_eq!(b.consume_count(), 1);
        assert!(b.elapsed() < Duration::from_millis(20));
    }

    #[test]
    fn test_free_consume() {
        let mut b = bencher();
        b.run_n(3, &mut |b: &mut Bencher| {
            let n = b.n();
            consume(b, n);
        });
        assert_eq!(b.consume_count(), 1);
        assert!(!b.timer_running());
    }

    #[test]
    fn test_run_n_sets_n_and_records_schedule() {
        let mut b = bencher();
        let mut seen = Vec::new();
        let mut f = |b: &mut Bencher| seen.push(b.n());
        b.run_n(1, &mut f);
        b.run_n(100, &mut f);
        assert_eq!(seen, vec![1, 100]);
        assert_eq!(b.result().n, 100);
        assert_eq!(b.into_measurement().schedule, vec![1, 100]);
    }

    #[test]
    fn test_run_n_zero_iterations() {
        let mut b = bencher();
        b.run_n(0, &mut |b: &mut Bencher| b.consume(1u64));
        let result = b.result();
        assert_eq!(result.n, 0);
        assert_eq!(result.ns_per_op(), 0);
        assert_eq!(result.ns_per_op_f64(), 0.0);
    }

    #[test]
    fn test_fail_and_skip() {
        let mut b = bencher();
        assert!(b.outcome().is_passed());
        b.fail("boom");
        assert_eq!(b.outcome(), &Outcome::Failed("boom".to_string()));

        let mut b = bencher();
        b.skip("not here");
        assert_eq!(b.outcome(), &Outcome::Skipped("not here".to_string()));
    }

    #[test]
    fn test_ns_per_op() {
        let r = BenchmarkResult {
            n: 4,
            t_ns: 10,
            cycles: 40,
        };
        assert_eq!(r.ns_per_op(), 2);
        assert!((r.ns_per_op_f64() - 2.5).abs() < f64::EPSILON);
        assert!((r.cycles_per_op() - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_add_folds_sub_results() {
        let mut parent = BenchmarkResult::default();
        parent.add(&BenchmarkResult {
            n: 10,
            t_ns: 1000,
            cycles: 0,
        });
        parent.add(&BenchmarkResult {
            n: 5,
            t_ns: 250,
            cycles: 0,
        });
        assert_eq!(parent.n, 1);
        assert_eq!(parent.t_ns, 150);
    }

    #[test]
    fn test_display_integer_ns() {
        let r = BenchmarkResult {
            n: 1000,
            t_ns: 250_000,
            cycles: 0,
        };
        assert_eq!(r.to_string(), "    1000\t       250 ns/op");
    }

    #[test]
    fn test_display_one_decimal() {
        let r = BenchmarkResult {
            n: 1000,
            t_ns: 31_500,
            cycles: 0,
        };
        assert_eq!(r.to_string(), "    1000\t        31.5 ns/op");
    }

    #[test]
    fn test_display_two_decimals() {
        let r = BenchmarkResult {
            n: 1_000_000_000,
            t_ns: 310_000_000,
            cycles: 0,
        };
        assert_eq!(r.to_string(), "1000000000\t         0.31 ns/op");
    }

    #[test]
    fn test_display_zero_iterations() {
        let r = BenchmarkResult::default();
        assert_eq!(r.to_string(), "       0\t         0 ns/op");
    }
}
