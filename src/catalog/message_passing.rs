//! Message passing: thread 0 writes `y` and then raises `x`; thread 1 spins until it
//! sees `x` and then reads `y`, which must be 1.
//!
//! Only the release/acquire and sequentially consistent variants guarantee that.
//! The `Regular` variants publish `y` as a plain variable.

use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};

use crate::marker;
use crate::scenario::{Plain, Scenario, ScenarioError};

#[derive(Debug, Default)]
struct Flags {
    x: AtomicI32,
    y: AtomicI32,
}

impl Flags {
    fn reset(&self) {
        self.x.store(0, Ordering::Relaxed);
        self.y.store(0, Ordering::Relaxed);
    }
}

/// Like [`Flags`], but the payload is a plain variable.
#[derive(Debug, Default)]
struct PlainPayload {
    x: AtomicI32,
    y: Plain,
}

impl PlainPayload {
    fn reset(&self) {
        self.x.store(0, Ordering::Relaxed);
        self.y.set(0);
    }
}

pub(super) fn spin_use_relaxed_regular() -> Result<Scenario, ScenarioError> {
    let state = Arc::new(PlainPayload::default());
    Scenario::builder("SpinUseRelaxedRegular")
        .body({
            let state = state.clone();
            move |_| {
                marker!("SpinUseRelaxedRegular|Thread 0");
                state.y.set(1);
                state.x.store(1, Ordering::Relaxed);
                marker!("end");
            }
        })
        .body({
            let state = state.clone();
            move |flag| {
                marker!("SpinUseRelaxedRegular|Thread 1");
                while state.x.load(Ordering::Relaxed) == 0 {
                    std::hint::spin_loop();
                }
                let r1 = state.y.get();
                marker!("end");
                flag.require(r1 != 0);
            }
        })
        .checker(move |_| state.reset())
        .build()
}

pub(super) fn spin_use_relaxed() -> Result<Scenario, ScenarioError> {
    let state = Arc::new(Flags::default());
    Scenario::builder("SpinUseRelaxed")
        .body({
            let state = state.clone();
            move |_| {
                marker!("SpinUseRelaxed|Thread 0");
                state.y.store(1, Ordering::Relaxed);
                state.x.store(1, Ordering::Relaxed);
                marker!("end");
            }
        })
        .body({
            let state = state.clone();
            move |flag| {
                marker!("SpinUseRelaxed|Thread 1");
                while state.x.load(Ordering::Relaxed) == 0 {
                    std::hint::spin_loop();
                }
                let r1 = state.y.load(Ordering::Relaxed);
                marker!("end");
                flag.require(r1 == 1);
            }
        })
        .checker(move |_| state.reset())
        .build()
}

pub(super) fn spin_use_acq_rel() -> Result<Scenario, ScenarioError> {
    let state = Arc::new(Flags::default());
    Scenario::builder("SpinUseAcqRel")
        .body({
            let state = state.clone();
            move |_| {
                marker!("SpinUseAcqRel|Thread 0");
                state.y.store(1, Ordering::Release);
                state.x.store(1, Ordering::Release);
                marker!("end");
            }
        })
        .body({
            let state = state.clone();
            move |flag| {
                marker!("SpinUseAcqRel|Thread 1");
                while state.x.load(Ordering::Acquire) == 0 {
                    std::hint::spin_loop();
                }
                let r1 = state.y.load(Ordering::Acquire);
                marker!("end");
                flag.require(r1 == 1);
            }
        })
        .checker(move |_| state.reset())
        .build()
}

pub(super) fn spin_use_acq_rel_regular() -> Result<Scenario, ScenarioError> {
    let state = Arc::new(PlainPayload::default());
    Scenario::builder("SpinUseAcqRelRegular")
        .body({
            let state = state.clone();
            move |_| {
                marker!("SpinUseAcqRelRegular|Thread 0");
                state.y.set(1);
                state.x.store(1, Ordering::Release);
                marker!("end");
            }
        })
        .body({
            let state = state.clone();
            move |flag| {
                marker!("SpinUseAcqRelRegular|Thread 1");
                while state.x.load(Ordering::Acquire) == 0 {
                    std::hint::spin_loop();
                }
                let r1 = state.y.get();
                marker!("end");
                flag.require(r1 == 1);
            }
        })
        .checker(move |_| state.reset())
        .build()
}

pub(super) fn spin_use_seq_cst() -> Result<Scenario, ScenarioError> {
    let state = Arc::new(Flags::default());
    Scenario::builder("SpinUseSeqCst")
        .body({
            let state = state.clone();
            move |_| {
                marker!("SpinUseSeqCst|Thread 0");
                state.y.store(1, Ordering::SeqCst);
                state.x.store(1, Ordering::SeqCst);
                marker!("end");
            }
        })
        .body({
            let state = state.clone();
            move |flag| {
                marker!("SpinUseSeqCst|Thread 1");
                while state.x.load(Ordering::SeqCst) == 0 {
                    std::hint::spin_loop();
                }
                let r1 = state.y.load(Ordering::SeqCst);
                marker!("end");
                flag.require(r1 == 1);
            }
        })
        .checker(move |_| state.reset())
        .build()
}
