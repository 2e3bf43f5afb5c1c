#![allow(dead_code)]

use litmus_harness::{RoundedTestRunner, RunnerConfig, WaitStrategy};

/// A runner for machines that may have fewer cores than workers: short settle
/// delay, and barrier waits that eventually yield instead of burning time slices.
pub fn quick_runner(iterations: u64) -> RoundedTestRunner {
    RoundedTestRunner::new(quick_config(iterations))
}

pub fn quick_config(iterations: u64) -> RunnerConfig {
    RunnerConfig {
        iterations,
        settle_spins: 32,
        wait: WaitStrategy::SpinThenYield { spins: 256 },
        ..RunnerConfig::default()
    }
}
