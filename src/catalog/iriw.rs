//! Independent reads of independent writes. Two writers set `x` and `y`; two
//! readers read them in opposite orders. Under sequential consistency the readers
//! cannot disagree on which write came first.

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
    r3: AtomicI32,
    r4: AtomicI32,
}

impl State {
    fn check_and_reset(&self, flag: &crate::RequireFlag) {
        let [r1, r2, r3, r4] =
            [&self.r1, &self.r2, &self.r3, &self.r4].map(|r| r.load(Ordering::Relaxed));
        // Reader 1 saw x before y while reader 2 saw y before x.
        flag.require(!(r1 != 0 && r2 == 0 && r3 != 0 && r4 == 0));
        for var in [&self.x, &self.y, &self.r1, &self.r2, &self.r3, &self.r4] {
            var.store(0, Ordering::Relaxed);
        }
    }
}

pub(super) fn seq_cst_acq_rel_4() -> Result<Scenario, ScenarioError> {
    let state = Arc::new(State::default());
    Scenario::builder("SeqCstAcqRel4")
        .body({
            let state = state.clone();
            move |_| {
                marker!("SeqCstAcqRel4|Thread 0");
                state.x.store(1, Ordering::Release);
                marker!("end");
            }
        })
        .body({
            let state = state.clone();
            move |_| {
                marker!("SeqCstAcqRel4|Thread 1");
                state.y.store(1, Ordering::Release);
                marker!("end");
            }
        })
        .body({
            let state = state.clone();
            move |_| {
                marker!("SeqCstAcqRel4|Thread 2");
                let r1 = state.x.load(Ordering::Acquire);
                let r2 = state.y.load(Ordering::Acquire);
                marker!("end");
                state.r1.store(r1, Ordering::Relaxed);
                state.r2.store(r2, Ordering::Relaxed);
            }
        })
        .body({
            let state = state.clone();
            move |_| {
                marker!("SeqCstAcqRel4|Thread 3");
                let r3 = state.y.load(Ordering::Acquire);
                let r4 = state.x.load(Ordering::Acquire);
                marker!("end");
                state.r3.store(r3, Ordering::Relaxed);
                state.r4.store(r4, Ordering::Relaxed);
            }
        })
        .checker(move |flag| state.check_and_reset(flag))
        .build()
}

pub(super) fn seq_cst_4() -> Result<Scenario, ScenarioError> {
    let state = Arc::new(State::default());
    Scenario::builder("SeqCst4")
        .body({
            let state = state.clone();
            move |_| {
                marker!("SeqCst4|Thread 0");
                state.x.store(1, Ordering::SeqCst);
                marker!("end");
            }
        })
        .body({
            let state = state.clone();
            move |_| {
                marker!("SeqCst4|Thread 1");
                state.y.store(1, Ordering::SeqCst);
                marker!("end");
            }
        })
        .body({
            let state = state.clone();
            move |_| {
                marker!("SeqCst4|Thread 2");
                let r1 = state.x.load(Ordering::SeqCst);
                let r2 = state.y.load(Ordering::SeqCst);
                marker!("end");
                state.r1.store(r1, Ordering::Relaxed);
                state.r2.store(r2, Ordering::Relaxed);
            }
        })
        .body({
            let state = state.clone();
            move |_| {
                marker!("SeqCst4|Thread 3");
                let r3 = state.y.load(Ordering::SeqCst);
                let r4 = state.x.load(Ordering::SeqCst);
                marker!("end");
                state.r3.store(r3, Ordering::Relaxed);
                state.r4.store(r4, Ordering::Relaxed);
            }
        })
        .checker(move |flag| state.check_and_reset(flag))
        .build()
}
