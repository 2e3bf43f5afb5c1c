//! The built-in litmus scenarios.
//!
//! Every scenario labels each body's litmus section with `marker!`, named
//! `<Scenario>|Thread <i>`, so its code can be found in the generated assembly.
//!
//! Only the harness reads the per-thread results the bodies publish, after the exit
//! barrier, so publishing them uses `Relaxed` stores.

use crate::scenario::{Scenario, ScenarioError};

mod increment;
mod iriw;
mod message_passing;
mod store_buffering;

/// All built-in scenarios, in reporting order.
pub fn catalog() -> Result<Vec<Scenario>, ScenarioError> {
    Ok(vec![
        increment::increment_regular()?,
        increment::increment_relaxed()?,
        increment::increment_seq_cst()?,
        message_passing::spin_use_relaxed_regular()?,
        message_passing::spin_use_relaxed()?,
        message_passing::spin_use_acq_rel()?,
        message_passing::spin_use_acq_rel_regular()?,
        message_passing::spin_use_seq_cst()?,
        store_buffering::seq_cst_acq_rel_2()?,
        store_buffering::seq_cst_2()?,
        iriw::seq_cst_acq_rel_4()?,
        iriw::seq_cst_4()?,
    ])
}

/// The scenarios whose name contains any of `filters`, or all of them if `filters`
/// is empty.
pub fn select(scenarios: Vec<Scenario>, filters: &[String]) -> Vec<Scenario> {
    if filters.is_empty() {
        return scenarios;
    }
    scenarios
        .into_iter()
        .filter(|scenario| filters.iter().any(|filter| scenario.name().contains(filter.as_str())))
        .collect()
}
