//! Configuration loading from opbench.toml
//!
//! The configuration file is discovered by walking up from the current
//! directory. Command-line flags override anything set here.

use anyhow::Context;
use opbench_core::{BenchTime, DEFAULT_BENCH_TIME, MAX_ITERATIONS};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the configuration file
pub const CONFIG_FILE: &str = "opbench.toml";

/// opbench configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OpbenchConfig {
    /// Runner configuration
    #[serde(default)]
    pub runner: RunnerConfig,
    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,
    /// CI configuration
    #[serde(default)]
    pub ci: CiConfig,
}

/// Runner configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Per-benchmark budget: a duration ("1s", "500ms") or an iteration count ("100x")
    #[serde(default = "default_bench_time")]
    pub bench_time: String,
    /// How many times each benchmark is measured
    #[serde(default = "default_count")]
    pub count: u32,
    /// Upper bound on N
    #[serde(default)]
    pub max_iterations: Option<u64>,
    /// CPU to pin the measuring thread to
    #[serde(default)]
    pub pin_cpu: Option<usize>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            bench_time: default_bench_time(),
            count: default_count(),
            max_iterations: None,
            pin_cpu: None,
        }
    }
}

fn default_bench_time() -> String {
    BenchTime::Duration(DEFAULT_BENCH_TIME).to_string()
}
fn default_count() -> u32 {
    1
}

impl RunnerConfig {
    /// Parsed `bench_time`, falling back to the default with a warning.
    pub fn bench_time(&self) -> BenchTime {
        match self.bench_time.parse() {
            Ok(bench_time) => bench_time,
            Err(e) => {
                tracing::warn!(
                    value = %self.bench_time,
                    error = %e,
                    "invalid runner.bench_time in {}, using default", CONFIG_FILE
                );
                BenchTime::default()
            }
        }
    }

    /// Configured `max_iterations` or the global cap
    pub fn max_iterations(&self) -> u64 {
        self.max_iterations.unwrap_or(MAX_ITERATIONS)
    }
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Default output format: "human", "json", "csv"
    #[serde(default = "default_format")]
    pub format: String,
    /// Save JSON baseline after each run
    #[serde(default)]
    pub save_baseline: bool,
    /// Baseline file path
    #[serde(default)]
    pub baseline_path: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            save_baseline: false,
            baseline_path: None,
        }
    }
}

fn default_format() -> String {
    "human".to_string()
}

/// CI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CiConfig {
    /// Regression threshold percentage
    #[serde(default = "default_threshold")]
    pub regression_threshold: f64,
    /// Exit non-zero when a regression is detected
    #[serde(default)]
    pub fail_on_regression: bool,
}

impl Default for CiConfig {
    fn default() -> Self {
        Self {
            regression_threshold: default_threshold(),
            fail_on_regression: false,
        }
    }
}

fn default_threshold() -> f64 {
    5.0
}

impl OpbenchConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Try to discover and load configuration by walking up from current directory
    pub fn discover() -> Option<Self> {
        let mut dir = std::env::current_dir().ok()?;
        loop {
            let config_path = dir.join(CONFIG_FILE);
            if config_path.exists() {
                return match Self::load(&config_path) {
                    Ok(config) => {
                        tracing::debug!(path = %config_path.display(), "loaded configuration");
                        Some(config)
                    }
                    Err(e) => {
                        tracing::warn!("{:#}; using defaults", e);
                        None
                    }
                };
            }
            if !dir.pop() {
                break;
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_default_config() {
        let config = OpbenchConfig::default();
        assert_eq!(config.runner.bench_time, "1s");
        assert_eq!(config.runner.count, 1);
        assert_eq!(config.runner.max_iterations(), MAX_ITERATIONS);
        assert_eq!(config.output.format, "human");
        assert_eq!(config.ci.regression_threshold, 5.0);
        assert!(!config.ci.fail_on_regression);
    }

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
            [runner]
            bench_time = "250ms"
            count = 5

            [ci]
            fail_on_regression = true
        "#;

        let config: OpbenchConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(
            config.runner.bench_time(),
            BenchTime::Duration(Duration::from_millis(250))
        );
        assert_eq!(config.runner.count, 5);
        assert!(config.ci.fail_on_regression);
        // Defaults should still apply
        assert_eq!(config.output.format, "human");
        assert_eq!(config.ci.regression_threshold, 5.0);
    }

    #[test]
    fn test_iteration_bench_time() {
        let config: OpbenchConfig = toml::from_str("[runner]\nbench_time = \"100x\"").unwrap();
        assert_eq!(config.runner.bench_time(), BenchTime::Iterations(100));
    }

    #[test]
    fn test_invalid_bench_time_falls_back() {
        let config: OpbenchConfig = toml::from_str("[runner]\nbench_time = \"soon\"").unwrap();
        assert_eq!(config.runner.bench_time(), BenchTime::default());
    }
}
