//! Scalar arithmetic micro-benchmarks
//!
//! Each benchmark starts an accumulator at 1 and adds the loop index,
//! converted to the accumulator's type, `N` times:
//!
//! | benchmark | accumulator |
//! |-----------|-------------|
//! | [`int_add_int`] | `i64` |
//! | [`float_add_int`] | `f32` |
//! | [`double_add_int`] | `f64` |
//!
//! Left alone, the optimizer folds the integer loop into a closed form and
//! drops any loop whose result is unused. The index therefore passes through
//! [`black_box`] before the add, and the final value goes to the
//! never-inlined [`Bencher::consume`] sink, which also stops the timer.

use opbench::Bencher;
use std::hint::black_box;

/// Scalar that a benchmark loop accumulates into.
pub trait Accumulator: Copy {
    /// Value before the first iteration
    const SEED: Self;

    /// Add the loop index converted to `Self`.
    fn add_index(self, i: u64) -> Self;
}

impl Accumulator for i64 {
    const SEED: Self = 1;

    #[inline(always)]
    fn add_index(self, i: u64) -> Self {
        self.wrapping_add(i as i64)
    }
}

impl Accumulator for f32 {
    const SEED: Self = 1.0;

    #[inline(always)]
    fn add_index(self, i: u64) -> Self {
        self + i as f32
    }
}

impl Accumulator for f64 {
    const SEED: Self = 1.0;

    #[inline(always)]
    fn add_index(self, i: u64) -> Self {
        self + i as f64
    }
}

/// Run the accumulation loop for `n` iterations and return the final value.
#[inline(always)]
pub fn accumulate<A: Accumulator>(n: u64) -> A {
    let mut val = A::SEED;
    for i in 0..n {
        val = val.add_index(black_box(i));
    }
    val
}

/// `i64 += i` for `i` in `0..N`
pub fn int_add_int(b: &mut Bencher) {
    let val = accumulate::<i64>(b.n());
    b.consume(val);
}

/// `f32 += i as f32` for `i` in `0..N`
pub fn float_add_int(b: &mut Bencher) {
    let val = accumulate::<f32>(b.n());
    b.consume(val);
}

/// `f64 += i as f64` for `i` in `0..N`
pub fn double_add_int(b: &mut Bencher) {
    let val = accumulate::<f64>(b.n());
    b.consume(val);
}
