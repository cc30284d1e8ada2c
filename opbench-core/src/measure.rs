//! High-Precision Timing
//!
//! Wall-clock time comes from `std::time::Instant`. Alongside it the timer
//! samples the CPU tick counter (RDTSCP on x86_64, CNTVCT_EL0 on AArch64) so
//! reports can show cycles per operation where the hardware provides them.

use std::ops::AddAssign;
use std::time::Duration;

/// Read the CPU cycle/tick counter (platform-specific).
#[cfg(target_arch = "x86_64")]
#[inline(always)]
fn read_cycles() -> u64 {
    // SAFETY: RDTSCP is available on every x86_64 CPU this crate targets and
    // has no memory side effects.
    unsafe {
        let mut _aux: u32 = 0;
        std::arch::x86_64::__rdtscp(&mut _aux)
    }
}

/// Read the virtual counter timer on AArch64.
#[cfg(target_arch = "aarch64")]
#[inline(always)]
fn read_cycles() -> u64 {
    let cnt: u64;
    // SAFETY: CNTVCT_EL0 is readable from EL0 on all AArch64 implementations.
    unsafe {
        std::arch::asm!("mrs {}, cntvct_el0", out(reg) cnt, options(nostack, nomem));
    }
    cnt
}

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
#[inline(always)]
fn read_cycles() -> u64 {
    0
}

/// Whether this platform provides a cycle counter. When `false`, cycle
/// counts are always 0.
pub const HAS_CYCLE_COUNTER: bool = cfg!(target_arch = "x86_64") || cfg!(target_arch = "aarch64");

/// Time accumulated while a [`Timer`] was running.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Elapsed {
    /// Wall-clock nanoseconds
    pub nanos: u64,
    /// Cycle counter ticks (0 without a cycle counter)
    pub cycles: u64,
}

impl Elapsed {
    /// Elapsed wall-clock time as a `Duration`
    pub fn duration(&self) -> Duration {
        Duration::from_nanos(self.nanos)
    }
}

impl AddAssign for Elapsed {
    fn add_assign(&mut self, rhs: Self) {
        self.nanos = self.nanos.saturating_add(rhs.nanos);
        self.cycles = self.cycles.saturating_add(rhs.cycles);
    }
}

/// A running stopwatch. Created by [`Timer::start`], read with
/// [`Timer::elapsed`].
#[derive(Debug)]
pub struct Timer {
    start: std::time::Instant,
    cycles_start: u64,
}

impl Timer {
    /// Start a new timer
    #[inline(always)]
    pub fn start() -> Self {
        let cycles_start = read_cycles();
        Self {
            start: std::time::Instant::now(),
            cycles_start,
        }
    }

    /// Time since `start`
    #[inline(always)]
    pub fn elapsed(&self) -> Elapsed {
        let nanos = u64::try_from(self.start.elapsed().as_nanos()).unwrap_or(u64::MAX);
        let cycles = read_cycles().saturating_sub(self.cycles_start);
        Elapsed { nanos, cycles }
    }
}

/// Pin the current thread to one CPU.
///
/// Keeps the measuring thread from migrating between cores mid-run, which
/// also keeps TSC readings comparable.
#[cfg(target_os = "linux")]
pub fn pin_to_cpu(cpu: usize) -> std::io::Result<()> {
    use std::mem::MaybeUninit;

    // SAFETY: the cpu_set_t is zero-initialised before use and only passed
    // to libc by reference for the duration of the call.
    unsafe {
        let mut set = MaybeUninit::<libc::cpu_set_t>::zeroed();
        let set_ref = set.assume_init_mut();

        libc::CPU_ZERO(set_ref);
        libc::CPU_SET(cpu, set_ref);

        let result = libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), set_ref);

        if result == 0 {
            Ok(())
        } else {
            Err(std::io::Error::last_os_error())
        }
    }
}

/// CPU pinning is only implemented on Linux.
#[cfg(not(target_os = "linux"))]
pub fn pin_to_cpu(_cpu: usize) -> std::io::Result<()> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "CPU pinning is only supported on Linux",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_measures_sleep() {
        let timer = Timer::start();
        std::thread::sleep(Duration::from_millis(10));
        let elapsed = timer.elapsed();

        assert!(elapsed.nanos >= 5_000_000);
        assert!(elapsed.duration() >= Duration::from_millis(5));
    }

    #[test]
    fn test_elapsed_accumulates() {
        let mut total = Elapsed::default();
        total += Elapsed {
            nanos: 10,
            cycles: 30,
        };
        total += Elapsed {
            nanos: 5,
            cycles: 15,
        };
        assert_eq!(
            total,
            Elapsed {
                nanos: 15,
                cycles: 45
            }
        );
    }

    #[test]
    fn test_elapsed_saturates() {
        let mut total = Elapsed {
            nanos: u64::MAX - 1,
            cycles: 0,
        };
        total += Elapsed {
            nanos: 10,
            cycles: 0,
        };
        assert_eq!(total.nanos, u64::MAX);
    }

    #[test]
    fn test_cycle_counter() {
        if HAS_CYCLE_COUNTER {
            let a = read_cycles();
            let b = read_cycles();
            assert!(b >= a, "cycle counter should be monotonic");
        }
    }
}
