//! Properties of the round protocol itself, checked with instrumented scenarios.

mod utils;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use litmus_harness::{Harness, Outcome, Scenario, TestResult};

use crate::utils::quick_runner;

#[test]
fn checker_runs_exactly_once_per_round() {
    for workers in [1, 2, 3, 4, 8] {
        let checks = Arc::new(AtomicU64::new(0));
        let mut builder = Scenario::builder(format!("exclusive-{workers}"));
        for _ in 0..workers {
            builder = builder.body(|_| {});
        }
        let scenario = builder
            .checker({
                let checks = checks.clone();
                move |_| {
                    checks.fetch_add(1, Ordering::Relaxed);
                }
            })
            .build()
            .unwrap();
        let result = quick_runner(2_000).run(&scenario);
        assert_eq!(result, TestResult { total: 2_000, failed: 0 });
        assert_eq!(checks.load(Ordering::Relaxed), 2_000, "with {workers} workers");
    }
}

#[test]
fn rounds_never_interleave() {
    const WORKERS: usize = 4;
    const ROUNDS: u64 = 1_000;

    // (worker, round) pairs in the order the bodies ran. The lock is test-only
    // instrumentation and adds synchronization the harness itself does not have.
    let log: Arc<Mutex<Vec<(usize, u64)>>> = Arc::default();
    let round = Arc::new(AtomicU64::new(0));
    let mut builder = Scenario::builder("alignment");
    for worker in 0..WORKERS {
        let log = log.clone();
        let round = round.clone();
        builder = builder.body(move |_| {
            let current = round.load(Ordering::Relaxed);
            log.lock().unwrap().push((worker, current));
        });
    }
    let scenario = builder
        .checker(move |_| {
            round.fetch_add(1, Ordering::Relaxed);
        })
        .build()
        .unwrap();
    quick_runner(ROUNDS).run(&scenario);

    let log = log.lock().unwrap();
    assert_eq!(log.len(), WORKERS * ROUNDS as usize);
    for (expected_round, chunk) in log.chunks(WORKERS).enumerate() {
        let mut workers: Vec<usize> = chunk
            .iter()
            .map(|&(worker, round)| {
                assert_eq!(round, expected_round as u64, "round {expected_round} interleaved");
                worker
            })
            .collect();
        workers.sort_unstable();
        assert_eq!(workers, (0..WORKERS).collect::<Vec<_>>());
    }
}

#[test]
fn checker_sees_all_bodies_of_its_round() {
    let hits = Arc::new(AtomicU64::new(0));
    let mut builder = Scenario::builder("visibility");
    for _ in 0..3 {
        let hits = hits.clone();
        builder = builder.body(move |_| {
            hits.fetch_add(1, Ordering::Relaxed);
        });
    }
    let scenario = builder
        .checker(move |flag| {
            flag.require(hits.swap(0, Ordering::Relaxed) == 3);
        })
        .build()
        .unwrap();
    assert_eq!(quick_runner(2_000).run(&scenario).failed, 0);
}

#[test]
fn always_failing_checker_fails_every_round() {
    let scenario = Scenario::builder("always")
        .body(|_| {})
        .body(|_| {})
        .checker(|flag| flag.require(false))
        .build()
        .unwrap();
    assert_eq!(quick_runner(1_000).run(&scenario), TestResult { total: 1_000, failed: 1_000 });
}

#[test]
fn never_failing_checker_fails_no_round() {
    let scenario = Scenario::builder("never")
        .body(|_| {})
        .body(|_| {})
        .checker(|flag| flag.require(true))
        .build()
        .unwrap();
    assert_eq!(quick_runner(1_000).run(&scenario), TestResult { total: 1_000, failed: 0 });
}

#[test]
fn body_assertions_count_once_per_round() {
    // Both bodies fail every other round; the round still counts once.
    let round = Arc::new(AtomicU64::new(0));
    let mut builder = Scenario::builder("body-require");
    for _ in 0..2 {
        let round = round.clone();
        builder = builder.body(move |flag| flag.require(round.load(Ordering::Relaxed) % 2 == 0));
    }
    let scenario = builder
        .checker(move |_| {
            round.fetch_add(1, Ordering::Relaxed);
        })
        .build()
        .unwrap();
    assert_eq!(quick_runner(1_000).run(&scenario), TestResult { total: 1_000, failed: 500 });
}

#[test]
fn skipped_scenario_spawns_no_workers() {
    let calls = Arc::new(AtomicU64::new(0));
    let mut builder = Scenario::builder("needs-four");
    for _ in 0..4 {
        let calls = calls.clone();
        builder = builder.body(move |_| {
            calls.fetch_add(1, Ordering::Relaxed);
        });
    }
    let scenario = builder.build().unwrap();
    let harness = Harness::new(quick_runner(100), 2);
    assert_eq!(harness.execute(&scenario), Outcome::Skipped { required: 4, available: 2 });
    assert_eq!(calls.load(Ordering::Relaxed), 0);
}
