//! Two threads increment one counter; the checker expects 2.
//!
//! The atomic read-modify-write variants can never lose an update. The plain
//! variant is a separate load and store and can.

use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};

use crate::marker;
use crate::scenario::{Plain, Scenario, ScenarioError};

pub(super) fn increment_regular() -> Result<Scenario, ScenarioError> {
    let x = Arc::new(Plain::new(0));
    Scenario::builder("IncrementRegular")
        .body({
            let x = x.clone();
            move |_| {
                marker!("IncrementRegular|Thread 0");
                x.increment();
                marker!("end");
            }
        })
        .body({
            let x = x.clone();
            move |_| {
                marker!("IncrementRegular|Thread 1");
                x.increment();
                marker!("end");
            }
        })
        .checker(move |flag| {
            flag.require(x.get() == 2);
            x.set(0);
        })
        .build()
}

pub(super) fn increment_relaxed() -> Result<Scenario, ScenarioError> {
    let x = Arc::new(AtomicI32::new(0));
    Scenario::builder("IncrementRelaxed")
        .body({
            let x = x.clone();
            move |_| {
                marker!("IncrementRelaxed|Thread 0");
                x.fetch_add(1, Ordering::Relaxed);
                marker!("end");
            }
        })
        .body({
            let x = x.clone();
            move |_| {
                marker!("IncrementRelaxed|Thread 1");
                x.fetch_add(1, Ordering::Relaxed);
                marker!("end");
            }
        })
        .checker(move |flag| {
            flag.require(x.load(Ordering::Relaxed) == 2);
            x.store(0, Ordering::Relaxed);
        })
        .build()
}

pub(super) fn increment_seq_cst() -> Result<Scenario, ScenarioError> {
    let x = Arc::new(AtomicI32::new(0));
    Scenario::builder("IncrementSeqCst")
        .body({
            let x = x.clone();
            move |_| {
                marker!("IncrementSeqCst|Thread 0");
                x.fetch_add(1, Ordering::SeqCst);
                marker!("end");
            }
        })
        .body({
            let x = x.clone();
            move |_| {
                marker!("IncrementSeqCst|Thread 1");
                x.fetch_add(1, Ordering::SeqCst);
                marker!("end");
            }
        })
        .checker(move |flag| {
            flag.require(x.load(Ordering::SeqCst) == 2);
            x.store(0, Ordering::SeqCst);
        })
        .build()
}
