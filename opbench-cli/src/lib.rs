#![warn(missing_docs)]
//! opbench CLI Library
//!
//! This module provides the CLI infrastructure for benchmark binaries.
//! Call `opbench::run()` (or `opbench_cli::run()`) from the `main` of a
//! `harness = false` bench target to get the full CLI with every
//! registered benchmark.
//!
//! # Example
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

mod baseline;
mod config;
mod executor;
mod planner;

pub use baseline::{
    DEFAULT_BASELINE_PATH, apply_baseline_comparison, load_baseline, resolve_baseline_path,
    resolve_save_path, save_baseline,
};
pub use config::*;
pub use executor::{
    BenchExecutionResult, ExecutionConfig, Executor, build_report, compute_statistics,
    format_human_output,
};
pub use planner::{ExecutionPlan, Selection, build_plan};

use anyhow::Context;
use clap::{Parser, Subcommand};
use opbench_core::{BenchTime, BenchmarkDef, LaunchConfig};
use opbench_report::{OutputFormat, Report, generate_csv_report, generate_json_report};
use regex::Regex;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Instant;

/// opbench CLI arguments
#[derive(Parser, Debug)]
#[command(name = "opbench")]
#[command(author, version, about = "opbench - adaptive micro-benchmark harness")]
pub struct Cli {
    /// Optional subcommand; defaults to running benchmarks
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Filter benchmarks by regex pattern on the id
    #[arg(default_value = ".*")]
    pub filter: String,

    /// Budget per benchmark: a duration ("1s", "500ms") or an iteration count ("100x")
    #[arg(long)]
    pub bench_time: Option<String>,

    /// Measure each benchmark this many times
    #[arg(long)]
    pub count: Option<u32>,

    /// Upper bound on the iteration count
    #[arg(long)]
    pub max_iterations: Option<u64>,

    /// Run benchmarks for this group only
    #[arg(long)]
    pub group: Option<String>,

    /// Filter by tag
    #[arg(long)]
    pub tag: Option<String>,

    /// Skip benchmarks with this tag
    #[arg(long)]
    pub skip_tag: Option<String>,

    /// Pin the measuring thread to this CPU (Linux only)
    #[arg(long, value_name = "CPU")]
    pub pin: Option<usize>,

    /// Output format: human, json, csv
    #[arg(long)]
    pub format: Option<String>,

    /// Output file (stdout if not specified)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Load baseline for comparison
    /// Optionally specify a path; defaults to config or target/opbench/baseline.json
    #[arg(long)]
    pub baseline: Option<Option<PathBuf>>,

    /// Save benchmark results as baseline JSON
    /// Optionally specify a path; defaults to config or target/opbench/baseline.json
    #[arg(long)]
    pub save_baseline: Option<Option<PathBuf>>,

    /// Regression threshold percentage
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Dry run - list benchmarks without executing
    #[arg(long)]
    pub dry_run: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Internal: Absorb cargo bench's --bench flag
    #[arg(long, hide = true)]
    pub bench: bool,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List all discovered benchmarks
    List,
    /// Run benchmarks (default)
    Run,
}

/// Run the opbench CLI with the process arguments.
/// This is the main entry point for benchmark binaries.
///
/// Exits the process with status 1 when a benchmark failed or crashed, or
/// when `fail_on_regression` is set and a regression was detected.
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    run_with_cli(cli)
}

/// Run the opbench CLI with pre-parsed arguments.
pub fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    let filter = if cli.verbose {
        "opbench=debug"
    } else {
        "opbench=info"
    };
    // A host binary may already have installed a subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    // Discover opbench.toml configuration (CLI flags override)
    let config = OpbenchConfig::discover().unwrap_or_default();

    match cli.command {
        Some(Commands::List) => list_benchmarks(&cli),
        Some(Commands::Run) => run_benchmarks(&cli, &config),
        None if cli.dry_run => list_benchmarks(&cli),
        None => run_benchmarks(&cli, &config),
    }
}

/// Filter benchmarks based on CLI options using the planner module.
fn filter_benchmarks(
    cli: &Cli,
    benchmarks: &[&'static BenchmarkDef],
) -> anyhow::Result<Vec<&'static BenchmarkDef>> {
    let filter_re =
        Regex::new(&cli.filter).with_context(|| format!("Invalid filter {:?}", cli.filter))?;

    let plan = build_plan(
        benchmarks.iter().copied(),
        &Selection {
            filter: Some(&filter_re),
            group: cli.group.as_deref(),
            tag: cli.tag.as_deref(),
            skip_tag: cli.skip_tag.as_deref(),
        },
    );

    Ok(plan.benchmarks)
}

fn list_benchmarks(cli: &Cli) -> anyhow::Result<()> {
    println!("opbench plan:");

    let all_benchmarks = opbench_core::registered();
    let benchmarks = filter_benchmarks(cli, &all_benchmarks)?;

    let mut groups: BTreeMap<&str, Vec<&BenchmarkDef>> = BTreeMap::new();
    for bench in &benchmarks {
        groups.entry(bench.group).or_default().push(bench);
    }

    for (group, benches) in &groups {
        println!("├── group: {}", group);
        for bench in benches {
            let tags = if bench.tags.is_empty() {
                String::new()
            } else {
                format!(" [{}]", bench.tags.join(", "))
            };
            println!(
                "│   ├── {}{} ({} at {}:{})",
                bench.id,
                tags,
                bench.path(),
                bench.file,
                bench.line
            );
        }
    }

    println!("{} benchmarks found.", benchmarks.len());

    // Tags across the whole suite, so filters can be discovered
    let mut tag_counts: BTreeMap<&str, usize> = BTreeMap::new();
    for bench in &all_benchmarks {
        for tag in bench.tags {
            *tag_counts.entry(tag).or_default() += 1;
        }
    }
    if !tag_counts.is_empty() {
        let tags_display: Vec<String> = tag_counts
            .iter()
            .map(|(tag, count)| format!("{} ({})", tag, count))
            .collect();
        println!("Tags: {}", tags_display.join(", "));
    }

    Ok(())
}

/// Build an ExecutionConfig by layering: opbench.toml defaults → CLI overrides.
fn build_execution_config(cli: &Cli, config: &OpbenchConfig) -> anyhow::Result<ExecutionConfig> {
    let bench_time = match &cli.bench_time {
        Some(s) => s
            .parse::<BenchTime>()
            .with_context(|| format!("Invalid --bench-time {:?}", s))?,
        None => config.runner.bench_time(),
    };

    Ok(ExecutionConfig {
        launch: LaunchConfig {
            bench_time,
            max_iterations: cli
                .max_iterations
                .unwrap_or_else(|| config.runner.max_iterations()),
        },
        count: cli.count.unwrap_or(config.runner.count).max(1),
        pin_cpu: cli.pin.or(config.runner.pin_cpu),
        stream: true,
    })
}

/// Run lines are streamed to stderr unless the human report on stdout
/// repeats them.
fn streams_run_lines(format: OutputFormat, to_file: bool) -> bool {
    to_file || format != OutputFormat::Human
}

fn output_format(cli: &Cli, config: &OpbenchConfig) -> OutputFormat {
    let requested = cli.format.as_deref().unwrap_or(&config.output.format);
    requested.parse().unwrap_or_else(|e: String| {
        tracing::warn!("{}; using human output", e);
        OutputFormat::Human
    })
}

fn run_benchmarks(cli: &Cli, config: &OpbenchConfig) -> anyhow::Result<()> {
    let format = output_format(cli, config);
    let mut exec_config = build_execution_config(cli, config)?;
    exec_config.stream = streams_run_lines(format, cli.output.is_some());

    let all_benchmarks = opbench_core::registered();
    let benchmarks = filter_benchmarks(cli, &all_benchmarks)?;

    if benchmarks.is_empty() {
        // If filtering by tag and no matches, check if the tag exists at all
        if let Some(ref tag) = cli.tag {
            let all_tags: std::collections::BTreeSet<&str> = all_benchmarks
                .iter()
                .flat_map(|b| b.tags.iter().copied())
                .collect();
            if !all_tags.contains(tag.as_str()) {
                let available: Vec<&str> = all_tags.into_iter().collect();
                tracing::warn!(
                    "tag '{}' not found. Available tags: {}",
                    tag,
                    available.join(", ")
                );
            }
        }
        println!("No benchmarks found.");
        return Ok(());
    }

    tracing::info!(
        benchmarks = benchmarks.len(),
        bench_time = %exec_config.launch.bench_time,
        count = exec_config.count,
        "running"
    );

    let start_time = Instant::now();
    let mut executor = Executor::new(exec_config.clone());
    let results = executor.execute(&benchmarks);
    let stats = compute_statistics(&results);

    let total_duration_ms = start_time.elapsed().as_secs_f64() * 1000.0;
    let mut report = build_report(&results, &stats, &exec_config, total_duration_ms);

    let threshold = cli.threshold.unwrap_or(config.ci.regression_threshold);
    if let Some(path) = resolve_baseline_path(&cli.baseline, config) {
        if path.exists() {
            match load_baseline(&path) {
                Ok(baseline) => apply_baseline_comparison(&mut report, &baseline, threshold),
                Err(e) => tracing::warn!("{:#}", e),
            }
        } else {
            tracing::warn!("baseline file not found: {}", path.display());
        }
    }

    write_output(cli, format, &report)?;

    if let Some(path) = resolve_save_path(&cli.save_baseline, config) {
        save_baseline(&path, &report)?;
    }

    if should_fail(&report, config.ci.fail_on_regression) {
        if report.has_failures() {
            eprintln!(
                "\n{} benchmark(s) failed, {} crashed",
                report.summary.failed, report.summary.crashed
            );
        }
        if report.summary.regressions > 0 {
            eprintln!(
                "\n{} regression(s) detected above {}% threshold",
                report.summary.regressions, threshold
            );
        }
        std::process::exit(1);
    }

    Ok(())
}

fn write_output(cli: &Cli, format: OutputFormat, report: &Report) -> anyhow::Result<()> {
    let output = match format {
        OutputFormat::Json => generate_json_report(report)?,
        OutputFormat::Csv => generate_csv_report(report),
        OutputFormat::Human => format_human_output(report),
    };

    match &cli.output {
        Some(path) => {
            std::fs::write(path, output)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("Report written to: {}", path.display());
        }
        None => print!("{}", output),
    }
    Ok(())
}

/// Whether the run should end with a non-zero exit status
fn should_fail(report: &Report, fail_on_regression: bool) -> bool {
    report.has_failures() || (fail_on_regression && report.summary.regressions > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use opbench_report::{
        BenchmarkReportResult, BenchmarkStatus, Comparison, ReportConfig, ReportMeta,
        ReportSummary, SystemInfo,
    };
    use std::time::Duration;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("opbench").chain(args.iter().copied()))
    }

    #[test]
    fn test_cli_defaults() {
        let cli = cli(&[]);
        assert_eq!(cli.filter, ".*");
        assert!(cli.command.is_none());
        assert!(cli.baseline.is_none());
        assert!(!cli.dry_run);
    }

    #[test]
    fn test_cli_absorbs_cargo_bench_flag() {
        let cli = cli(&["--bench", "int_add"]);
        assert!(cli.bench);
        assert_eq!(cli.filter, "int_add");
    }

    #[test]
    fn test_cli_optional_baseline_path() {
        assert_eq!(cli(&["--baseline"]).baseline, Some(None));
        assert_eq!(
            cli(&["--baseline", "old.json"]).baseline,
            Some(Some(PathBuf::from("old.json")))
        );
    }

    #[test]
    fn test_list_subcommand() {
        assert!(matches!(cli(&["list"]).command, Some(Commands::List)));
    }

    #[test]
    fn test_execution_config_from_file() {
        let mut config = OpbenchConfig::default();
        config.runner.bench_time = "200ms".to_string();
        config.runner.count = 3;
        config.runner.pin_cpu = Some(1);

        let exec = build_execution_config(&cli(&[]), &config).unwrap();

        assert_eq!(
            exec.launch.bench_time,
            BenchTime::Duration(Duration::from_millis(200))
        );
        assert_eq!(exec.count, 3);
        assert_eq!(exec.pin_cpu, Some(1));
        assert_eq!(exec.launch.max_iterations, opbench_core::MAX_ITERATIONS);
    }

    #[test]
    fn test_cli_overrides_config() {
        let mut config = OpbenchConfig::default();
        config.runner.bench_time = "200ms".to_string();
        config.runner.count = 3;

        let exec = build_execution_config(
            &cli(&["--bench-time", "100x", "--count", "5", "--max-iterations", "50", "--pin", "0"]),
            &config,
        )
        .unwrap();

        assert_eq!(exec.launch.bench_time, BenchTime::Iterations(100));
        assert_eq!(exec.count, 5);
        assert_eq!(exec.launch.max_iterations, 50);
        assert_eq!(exec.pin_cpu, Some(0));
    }

    #[test]
    fn test_invalid_bench_time_flag_is_an_error() {
        let result = build_execution_config(&cli(&["--bench-time", "fast"]), &OpbenchConfig::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_output_format_resolution() {
        let mut config = OpbenchConfig::default();
        assert_eq!(output_format(&cli(&[]), &config), OutputFormat::Human);
        config.output.format = "csv".to_string();
        assert_eq!(output_format(&cli(&[]), &config), OutputFormat::Csv);
        assert_eq!(
            output_format(&cli(&["--format", "json"]), &config),
            OutputFormat::Json
        );
        assert_eq!(
            output_format(&cli(&["--format", "html"]), &config),
            OutputFormat::Human
        );
    }

    #[test]
    fn test_invalid_filter_is_an_error() {
        assert!(filter_benchmarks(&cli(&["("]), &[]).is_err());
    }

    #[test]
    fn test_run_lines_streamed_unless_human_on_stdout() {
        assert!(!streams_run_lines(OutputFormat::Human, false));
        assert!(streams_run_lines(OutputFormat::Human, true));
        assert!(streams_run_lines(OutputFormat::Json, false));
        assert!(streams_run_lines(OutputFormat::Csv, false));
    }

    fn report(results: Vec<BenchmarkReportResult>) -> Report {
        let summary = ReportSummary::tally(&results, 10.0);
        Report {
            meta: ReportMeta {
                schema_version: opbench_report::SCHEMA_VERSION,
                version: "0.1.0".to_string(),
                timestamp: chrono::Utc::now(),
                git_commit: None,
                git_branch: None,
                system: SystemInfo {
                    os: "linux".to_string(),
                    arch: "x86_64".to_string(),
                    cpu: "Test CPU".to_string(),
                    cpu_cores: 1,
                },
                config: ReportConfig {
                    bench_time: "1s".to_string(),
                    count: 1,
                    max_iterations: opbench_core::MAX_ITERATIONS,
                    pinned_cpu: None,
                },
            },
            results,
            summary,
            baseline_meta: None,
        }
    }

    fn result(status: BenchmarkStatus, relative_change: Option<f64>) -> BenchmarkReportResult {
        BenchmarkReportResult {
            id: "benchmark_x".to_string(),
            group: "default".to_string(),
            status,
            file: "x.rs".to_string(),
            line: 1,
            runs: vec![],
            metrics: None,
            comparison: relative_change.map(|relative_change| Comparison {
                baseline_mean_ns: 100.0,
                absolute_change_ns: relative_change,
                relative_change,
                threshold: 5.0,
            }),
            failure: None,
        }
    }

    #[test]
    fn test_should_fail_on_failures() {
        let passing = report(vec![result(BenchmarkStatus::Passed, None)]);
        assert!(!should_fail(&passing, true));

        let failed = report(vec![result(BenchmarkStatus::Failed, None)]);
        assert!(should_fail(&failed, false));

        let crashed = report(vec![result(BenchmarkStatus::Crashed, None)]);
        assert!(should_fail(&crashed, false));

        let skipped = report(vec![result(BenchmarkStatus::Skipped, None)]);
        assert!(!should_fail(&skipped, true));
    }

    #[test]
    fn test_should_fail_on_regression_only_when_enabled() {
        let regressed = report(vec![result(BenchmarkStatus::Passed, Some(12.0))]);
        assert_eq!(regressed.summary.regressions, 1);
        assert!(should_fail(&regressed, true));
        assert!(!should_fail(&regressed, false));

        let within = report(vec![result(BenchmarkStatus::Passed, Some(3.0))]);
        assert!(!should_fail(&within, true));
    }
}
