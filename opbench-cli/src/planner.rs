//! Benchmark Planner
//!
//! Builds execution plan by filtering and ordering benchmarks.
//!
//! Filtering options:
//! - Regex pattern matching on benchmark ID
//! - Group filtering
//! - Tag inclusion/exclusion
//!
//! Benchmarks are sorted by ID so every run executes them in the same order.

use opbench_core::BenchmarkDef;

/// Execution plan for benchmarks
pub struct ExecutionPlan {
    /// Ordered list of benchmarks to run
    pub benchmarks: Vec<&'static BenchmarkDef>,
}

/// Selection criteria from the command line
#[derive(Debug, Default)]
pub struct Selection<'a> {
    /// Regex the id must match
    pub filter: Option<&'a regex::Regex>,
    /// Group the benchmark must belong to
    pub group: Option<&'a str>,
    /// Tag the benchmark must carry
    pub tag: Option<&'a str>,
    /// Tag the benchmark must not carry
    pub skip_tag: Option<&'a str>,
}

impl Selection<'_> {
    fn matches(&self, b: &BenchmarkDef) -> bool {
        if self.filter.is_some_and(|re| !re.is_match(b.id)) {
            return false;
        }
        if self.group.is_some_and(|g| b.group != g) {
            return false;
        }
        if self.tag.is_some_and(|t| !b.tags.contains(&t)) {
            return false;
        }
        if self.skip_tag.is_some_and(|t| b.tags.contains(&t)) {
            return false;
        }
        true
    }
}

/// Build execution plan from discovered benchmarks
pub fn build_plan(
    benchmarks: impl IntoIterator<Item = &'static BenchmarkDef>,
    selection: &Selection<'_>,
) -> ExecutionPlan {
    let mut selected: Vec<_> = benchmarks
        .into_iter()
        .filter(|b| selection.matches(b))
        .collect();

    selected.sort_by_key(|b| b.id);

    ExecutionPlan {
        benchmarks: selected,
    }
}
