//! A round-synchronized litmus-test harness.
//!
//! Every scenario is a handful of worker bodies plus a checker. The
//! [`RoundedTestRunner`] runs all bodies concurrently, once per round, between two
//! passes through a shared [`RoundBarrier`]; after each round exactly one worker
//! runs the checker through the [`InvariantGate`], which folds the round's
//! [`RequireFlag`] into the failure tally and resets the shared state.
//!
//! The harness's own bookkeeping only uses the orderings its protocol needs, so the
//! orderings chosen by a scenario are the only ones that constrain its bodies
//! within a round.

#![warn(rust_2018_idioms)]

#[macro_use]
extern crate log;

mod concurrency;
mod harness;
mod runner;
mod scenario;

pub mod catalog;
pub mod report;
pub mod summary;

pub use crate::concurrency::affinity::pin_current_thread;
pub use crate::concurrency::barrier::{RoundBarrier, WaitStrategy};
pub use crate::concurrency::gate::{InvariantGate, RequireFlag};
pub use crate::harness::{Harness, Outcome};
pub use crate::runner::{RoundedTestRunner, RunnerConfig, TestResult, settle};
pub use crate::scenario::{Body, Checker, Plain, Scenario, ScenarioBuilder, ScenarioError};

/// The concurrency the CLI assumes when none is given.
pub const DEFAULT_AVAILABLE_CONCURRENCY: usize = 4;
