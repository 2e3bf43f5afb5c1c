//! Store buffering: each thread stores to one variable and then loads the other.
//! Under sequential consistency at least one of them must see the other's store;
//! release/acquire allows both to read 0.

use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};

use crate::marker;
use crate::scenario::{Scenario, ScenarioError};

#[derive(Debug, Default)]
struct State {
    x: AtomicI32,
    y: AtomicI32,
    r1: AtomicI32,
    r2: AtomicI32,
}

impl State {
    fn check_and_reset(&self, flag: &crate::RequireFlag) {
        flag.require(self.r1.load(Ordering::Relaxed) == 1 || self.r2.load(Ordering::Relaxed) == 1);
        for var in [&self.x, &self.y, &self.r1, &self.r2] {
            var.store(0, Ordering::Relaxed);
        }
    }
}

pub(super) fn seq_cst_acq_rel_2() -> Result<Scenario, ScenarioError> {
    let state = Arc::new(State::default());
    Scenario::builder("SeqCstAcqRel2")
        .body({
            let state = state.clone();
            move |_| {
                marker!("SeqCstAcqRel2|Thread 0");
                state.x.store(1, Ordering::Release);
                let r1 = state.y.load(Ordering::Acquire);
                marker!("end");
                state.r1.store(r1, Ordering::Relaxed);
            }
        })
        .body({
            let state = state.clone();
            move |_| {
                marker!("SeqCstAcqRel2|Thread 1");
                state.y.store(1, Ordering::Release);
                let r2 = state.x.load(Ordering::Acquire);
                marker!("end");
                state.r2.store(r2, Ordering::Relaxed);
            }
        })
        .checker(move |flag| state.check_and_reset(flag))
        .build()
}

pub(super) fn seq_cst_2() -> Result<Scenario, ScenarioError> {
    let state = Arc::new(State::default());
    Scenario::builder("SeqCst2")
        .body({
            let state = state.clone();
            move |_| {
                marker!("SeqCst2|Thread 0");
                state.x.store(1, Ordering::SeqCst);
                let r1 = state.y.load(Ordering::SeqCst);
                marker!("end");
                state.r1.store(r1, Ordering::Relaxed);
            }
        })
        .body({
            let state = state.clone();
            move |_| {
                marker!("SeqCst2|Thread 1");
                state.y.store(1, Ordering::SeqCst);
                let r2 = state.x.load(Ordering::SeqCst);
                marker!("end");
                state.r2.store(r2, Ordering::Relaxed);
            }
        })
        .checker(move |flag| state.check_and_reset(flag))
        .build()
}
