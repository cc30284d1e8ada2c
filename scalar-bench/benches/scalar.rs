//! Scalar accumulation benchmarks
//!
//! ```text
//! cargo bench -p scalar-bench
//! cargo bench -p scalar-bench -- double --bench-time 100000x --count 5
//! ```

use opbench::bench;
use opbench::prelude::*;

#[bench(group = "scalar", tags = "int, add")]
fn benchmark_int_add_int(b: &mut Bencher) {
    scalar_bench::int_add_int(b);
}

#[bench(group = "scalar", tags = "float, add")]
fn benchmark_float_add_int(b: &mut Bencher) {
    scalar_bench::float_add_int(b);
}

#[bench(group = "scalar", tags = "float, add")]
fn benchmark_double_add_int(b: &mut Bencher) {
    scalar_bench::double_add_int(b);
}

fn main() -> anyhow::Result<()> {
    opbench::run()
}
