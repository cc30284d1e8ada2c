//! Benchmark Executor
//!
//! Runs benchmarks sequentially on the calling thread and turns their
//! measurements into a report.
//!
//! ## Pipeline Overview
//!
//! ```text
//! BenchmarkDef (registered via #[bench])
//!       │
//!       ▼
//! ┌─────────────┐
//! │  execution  │  Adaptive launch per benchmark, `count` times
//! └──────┬──────┘
//!        │
//!        ▼
//! ┌─────────────┐
//! │ statistics  │  Summaries across runs (parallel)
//! └──────┬──────┘
//!        │
//!        ▼
//! ┌─────────────┐
//! │   report    │  Build Report with metadata
//! └──────┬──────┘
//!        │
//!        ▼
//! ┌─────────────┐
//! │ formatting  │  Human-readable output
//! └─────────────┘
//! ```

mod execution;
mod formatting;
mod metadata;
mod report;
mod statistics;

pub use execution::{BenchExecutionResult, ExecutionConfig, Executor};
pub use formatting::format_human_output;
pub use report::build_report;
pub use statistics::compute_statistics;
