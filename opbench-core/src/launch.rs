//! Adaptive Launcher
//!
//! Chooses the iteration count for a benchmark. The first round runs the body
//! once; every following round predicts how many iterations fit the time
//! budget from the previous round's ns/op, overshoots by 20%, never grows by
//! more than 100x, and rounds up to a readable number (1, 2, 3 or 5 times a
//! power of ten). The last round is the one that gets reported.

use crate::bencher::{Bencher, BenchmarkResult, Outcome};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Upper bound on iterations per round
pub const MAX_ITERATIONS: u64 = 1_000_000_000;

/// Default time budget per benchmark
pub const DEFAULT_BENCH_TIME: Duration = Duration::from_secs(1);

/// How long to run each benchmark
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BenchTime {
    /// Keep growing N until a round takes at least this long
    Duration(Duration),
    /// Run exactly this many iterations (written `100x`)
    Iterations(u64),
}

impl Default for BenchTime {
    fn default() -> Self {
        BenchTime::Duration(DEFAULT_BENCH_TIME)
    }
}

/// Error parsing a [`BenchTime`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseBenchTimeError {
    /// Empty input
    #[error("empty bench time")]
    Empty,
    /// Numeric part did not parse or was negative
    #[error("invalid bench time number: {0:?}")]
    InvalidNumber(String),
    /// Unit suffix not recognised
    #[error("unknown bench time unit {0:?} (expected ns, us, ms, s, m or x)")]
    UnknownUnit(String),
}

impl FromStr for BenchTime {
    type Err = ParseBenchTimeError;

    /// Accepts `"1s"`, `"1.5s"`, `"250ms"`, `"100us"`, `"2m"` and `"1000x"`.
    /// A bare number is taken as seconds.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ParseBenchTimeError::Empty);
        }

        if let Some(count) = s.strip_suffix('x') {
            return count
                .trim()
                .parse::<u64>()
                .map(BenchTime::Iterations)
                .map_err(|_| ParseBenchTimeError::InvalidNumber(count.to_string()));
        }

        // The unit is the trailing run of letters, so `1e-3s` keeps its exponent.
        let num_part = s.trim_end_matches(|c: char| c.is_alphabetic() || c == 'µ');
        let unit_part = match &s[num_part.len()..] {
            "" => "s",
            unit => unit,
        };

        let value: f64 = num_part
            .trim()
            .parse()
            .map_err(|_| ParseBenchTimeError::InvalidNumber(num_part.to_string()))?;
        if !value.is_finite() || value < 0.0 {
            return Err(ParseBenchTimeError::InvalidNumber(num_part.to_string()));
        }

        let multiplier: f64 = match unit_part {
            "ns" => 1.0,
            "us" | "µs" => 1_000.0,
            "ms" => 1_000_000.0,
            "s" => 1_000_000_000.0,
            "m" | "min" => 60_000_000_000.0,
            other => return Err(ParseBenchTimeError::UnknownUnit(other.to_string())),
        };

        Ok(BenchTime::Duration(Duration::from_nanos(
            (value * multiplier) as u64,
        )))
    }
}

impl fmt::Display for BenchTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BenchTime::Duration(d) => write!(f, "{:?}", d),
            BenchTime::Iterations(n) => write!(f, "{}x", n),
        }
    }
}

impl Serialize for BenchTime {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            BenchTime::Duration(d) => serializer.serialize_str(&format!("{}ns", d.as_nanos())),
            BenchTime::Iterations(n) => serializer.serialize_str(&format!("{}x", n)),
        }
    }
}

impl<'de> Deserialize<'de> for BenchTime {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Knobs for one benchmark launch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchConfig {
    /// Time budget or fixed iteration count
    pub bench_time: BenchTime,
    /// Cap on iterations per round
    pub max_iterations: u64,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            bench_time: BenchTime::default(),
            max_iterations: MAX_ITERATIONS,
        }
    }
}

/// Everything the launcher learned about one benchmark
#[derive(Debug, Clone)]
pub struct Measurement {
    /// Full benchmark name
    pub name: String,
    /// Final round (or the folded sub-benchmark results for a parent)
    pub result: BenchmarkResult,
    /// How the benchmark ended
    pub outcome: Outcome,
    /// Iteration count of every round, in order
    pub schedule: Vec<u64>,
    /// Whether the final round reached [`Bencher::consume`]
    pub consumed: bool,
    /// Sub-benchmarks started with [`Bencher::run`]
    pub subs: Vec<Measurement>,
}

impl Measurement {
    /// This measurement and all nested sub-benchmarks that were measured
    /// directly, depth first. Parents with sub-benchmarks are left out.
    pub fn leaves(&self) -> Vec<&Measurement> {
        if self.subs.is_empty() {
            return vec![self];
        }
        self.subs.iter().flat_map(|s| s.leaves()).collect()
    }
}

/// Largest power of ten not above `n` (1 for `n` = 0).
pub fn round_down_10(mut n: u64) -> u64 {
    let mut tens = 0;
    while n >= 10 {
        n /= 10;
        tens += 1;
    }
    10u64.pow(tens)
}

/// Smallest of 1, 2, 3, 5 or 10 times `round_down_10(n)` that is at least `n`.
pub fn round_up(n: u64) -> u64 {
    let base = round_down_10(n);
    [1, 2, 3, 5]
        .into_iter()
        .map(|k: u64| k.saturating_mul(base))
        .find(|&candidate| n <= candidate)
        .unwrap_or_else(|| base.saturating_mul(10))
}

/// Next iteration count after a round of `last` iterations at `ns_per_op`.
pub fn predict_iterations(budget_ns: u64, ns_per_op: u64, last: u64) -> u64 {
    let mut n = budget_ns;
    if ns_per_op != 0 {
        n /= ns_per_op;
    }
    let n = n
        .saturating_add(n / 5)
        .min(last.saturating_mul(100))
        .max(last.saturating_add(1));
    round_up(n)
}

/// Measure the benchmark body `f` under `config`.
///
/// Always starts with a single-iteration round. Bodies that fail, skip or
/// spawn sub-benchmarks during the first round are not launched further.
pub fn measure<F>(name: impl Into<String>, mut f: F, config: &LaunchConfig) -> Measurement
where
    F: FnMut(&mut Bencher),
{
    let mut b = Bencher::new(name, config.clone());

    b.run_n(1, &mut f);
    if b.outcome().is_passed() && !b.has_subs() {
        launch(&mut b, &mut f);
    }

    let measurement = b.into_measurement();
    if measurement.outcome.is_passed() && measurement.subs.is_empty() && !measurement.consumed {
        tracing::warn!(
            benchmark = %measurement.name,
            "benchmark returned without calling consume(); its loop may have been optimized away"
        );
    }
    tracing::debug!(
        benchmark = %measurement.name,
        rounds = measurement.schedule.len(),
        n = measurement.result.n,
        ns_per_op = measurement.result.ns_per_op_f64(),
        "benchmark measured"
    );
    measurement
}

fn launch<F>(b: &mut Bencher, f: &mut F)
where
    F: FnMut(&mut Bencher),
{
    let max_iterations = b.config().max_iterations.max(1);

    match b.config().bench_time {
        BenchTime::Iterations(n) => {
            // The first round already covered a single iteration.
            if n != 1 {
                b.run_n(n.min(max_iterations), f);
            }
        }
        BenchTime::Duration(budget) => {
            let budget_ns = u64::try_from(budget.as_nanos()).unwrap_or(u64::MAX);
            let mut n = 1;
            while b.outcome().is_passed() && b.result().t_ns < budget_ns && n < max_iterations {
                let last = n;
                n = predict_iterations(budget_ns, b.ns_per_op(), last).min(max_iterations);
                tracing::trace!(benchmark = %b.name(), last, n, "launch round");
                b.run_n(n, f);
            }
        }
    }
}
