//! Drives worker threads through synchronized rounds.

use std::any::Any;
use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Once, OnceLock};
use std::thread;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng as _, SeedableRng as _};

use crate::concurrency::affinity::pin_current_thread;
use crate::concurrency::barrier::{RoundBarrier, WaitStrategy};
use crate::concurrency::gate::InvariantGate;
use crate::scenario::{Body, Scenario};

/// The number of rounds the original experiments ran per scenario.
pub const DEFAULT_ITERATIONS: u64 = 10_000_000;

/// The default length of the post-body busy delay, in loop iterations.
pub const DEFAULT_SETTLE_SPINS: u32 = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Rounds per scenario.
    pub iterations: u64,
    /// Busy-loop iterations every worker spends after its body, before the exit
    /// barrier. Widens the window in which the other bodies' effects can show up
    /// before the barrier's own synchronization kicks in. Hardware-dependent.
    pub settle_spins: u32,
    /// Up to this many extra settle iterations, drawn per worker and round.
    pub settle_jitter: u32,
    /// Seeds the jitter; worker `i` uses `seed + i`.
    pub seed: u64,
    /// Pin worker `i` to CPU `i`.
    pub pin_workers: bool,
    pub wait: WaitStrategy,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            settle_spins: DEFAULT_SETTLE_SPINS,
            settle_jitter: 0,
            seed: 0,
            pin_workers: false,
            wait: WaitStrategy::Spin,
        }
    }
}

/// The outcome of running one scenario.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct TestResult {
    pub total: u64,
    pub failed: u64,
}

impl TestResult {
    pub fn passed(&self) -> bool {
        self.failed == 0
    }
}

/// Spins for `spins` iterations without yielding and without touching memory.
#[inline]
pub fn settle(spins: u32) {
    for i in 0..spins {
        std::hint::black_box(i);
    }
}

thread_local! {
    /// Set on worker threads, whose panics are caught and tallied per run.
    static QUIET_PANICS: Cell<bool> = const { Cell::new(false) };
}

/// Wraps the current panic hook so that panics on worker threads print nothing.
/// Other threads keep the previous behavior.
fn install_panic_hook() {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if !QUIET_PANICS.try_with(Cell::get).unwrap_or(false) {
                previous(info);
            }
        }));
    });
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}

/// Body panics of one run.
#[derive(Debug, Default)]
struct PanicTally {
    count: AtomicU64,
    first: OnceLock<String>,
}

impl PanicTally {
    fn record(&self, payload: &(dyn Any + Send)) {
        self.count.fetch_add(1, Ordering::Relaxed);
        if self.first.get().is_none() {
            let _ = self.first.set(panic_message(payload).to_owned());
        }
    }

    fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RoundedTestRunner {
    config: RunnerConfig,
}

impl RoundedTestRunner {
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Runs every body of `scenario` on its own thread for `iterations` rounds.
    ///
    /// Within a round all bodies run between the same pair of barrier passes, and the
    /// checker runs exactly once, after every worker left the round and before any
    /// worker enters the next one.
    pub fn run(&self, scenario: &Scenario) -> TestResult {
        self.run_tallied(scenario).0
    }

    fn run_tallied(&self, scenario: &Scenario) -> (TestResult, PanicTally) {
        let bodies = scenario.bodies();
        let iterations = self.config.iterations;
        debug!(
            "running `{}` on {} workers for {iterations} rounds",
            scenario.name(),
            bodies.len()
        );
        let started = Instant::now();

        // The round barrier's capacity is the body count by construction, so it
        // always matches the number of workers.
        let round = RoundBarrier::with_strategy(bodies.len(), self.config.wait);
        let start = RoundBarrier::with_strategy(bodies.len() + 1, self.config.wait);
        let gate = InvariantGate::new();
        let panics = PanicTally::default();
        install_panic_hook();

        thread::scope(|s| {
            for (index, body) in bodies.iter().enumerate() {
                let worker = Worker {
                    index,
                    body,
                    scenario,
                    round: &round,
                    start: &start,
                    gate: &gate,
                    panics: &panics,
                    config: &self.config,
                };
                let spawned = thread::Builder::new()
                    .name(format!("litmus-{}-{index}", scenario.name()))
                    .spawn_scoped(s, move || worker.run());
                if let Err(err) = spawned {
                    // The workers spawned so far are parked at the start barrier and
                    // can never be released, so the scope would never join.
                    error!("failed to spawn worker {index} of `{}`: {err}", scenario.name());
                    std::process::abort();
                }
            }
            start.wait();
        });

        let result = TestResult { total: iterations, failed: gate.failed() };
        debug_assert_eq!(gate.checked_rounds(), iterations);
        debug!(
            "`{}` finished: {}/{} failed in {:?}",
            scenario.name(),
            result.failed,
            result.total,
            started.elapsed()
        );
        if panics.count() > 0 || gate.checker_panics() > 0 {
            warn!(
                "`{}`: {} body and {} checker panics counted as failed rounds, first body panic: {}",
                scenario.name(),
                panics.count(),
                gate.checker_panics(),
                panics.first.get().map_or("none", String::as_str)
            );
        }
        (result, panics)
    }
}

struct Worker<'a> {
    index: usize,
    body: &'a Body,
    scenario: &'a Scenario,
    round: &'a RoundBarrier,
    start: &'a RoundBarrier,
    gate: &'a InvariantGate,
    panics: &'a PanicTally,
    config: &'a RunnerConfig,
}

impl Worker<'_> {
    fn run(self) {
        QUIET_PANICS.set(true);
        if self.config.pin_workers {
            match pin_current_thread(self.index) {
                Ok(()) => trace!("worker {} pinned to cpu {}", self.index, self.index),
                Err(err) => warn!("could not pin worker {}: {err}", self.index),
            }
        }
        let mut rng = StdRng::seed_from_u64(self.config.seed.wrapping_add(self.index as u64));
        let flag = self.gate.flag();
        let checker = self.scenario.checker();

        self.start.wait();
        for i in 0..self.config.iterations {
            self.round.wait();
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| (self.body)(flag))) {
                self.panics.record(&*payload);
                flag.require(false);
            }
            let jitter = match self.config.settle_jitter {
                0 => 0,
                max => rng.random_range(0..=max),
            };
            // Stay away from the barrier for a while, so its synchronization does not
            // order the bodies' accesses for us.
            settle(self.config.settle_spins.saturating_add(jitter));
            self.round.wait();
            self.gate.attempt(i, |flag| checker(flag));
        }
    }
}
