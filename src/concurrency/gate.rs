//! Exactly-once invariant checking at round boundaries.
//!
//! All atomics here are `Relaxed`. Every access happens on one side or the other
//! of a round barrier, and the barrier already orders bodies before the checker and
//! the checker before the next round's bodies. Anything stronger would add fences
//! the scenario under test did not ask for.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// The per-round "something went wrong" bit.
///
/// Bodies and checkers may only raise it; the [`InvariantGate`] is the only one
/// that clears it, after folding it into the failure tally.
#[derive(Debug, Default)]
pub struct RequireFlag {
    raised: AtomicBool,
}

impl RequireFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a failed round unless `condition` holds.
    #[inline]
    pub fn require(&self, condition: bool) {
        if !condition {
            self.raised.store(true, Ordering::Relaxed);
        }
    }

    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::Relaxed)
    }

    /// Clears the flag, returning whether it was raised.
    fn take(&self) -> bool {
        self.raised.swap(false, Ordering::Relaxed)
    }
}

/// Elects exactly one checker per round and tallies failed rounds.
#[derive(Debug, Default)]
pub struct InvariantGate {
    /// The next round whose checker has not run yet.
    next_round: AtomicU64,
    failed: AtomicU64,
    checker_panics: AtomicU64,
    flag: RequireFlag,
}

impl InvariantGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// The flag bodies report their assertions to.
    pub fn flag(&self) -> &RequireFlag {
        &self.flag
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    /// The number of rounds whose checker panicked.
    pub fn checker_panics(&self) -> u64 {
        self.checker_panics.load(Ordering::Relaxed)
    }

    /// The number of rounds whose checker already ran.
    pub fn checked_rounds(&self) -> u64 {
        self.next_round.load(Ordering::Relaxed)
    }

    /// Runs `checker` if the caller is the first to attempt `round`, returning
    /// whether it did.
    ///
    /// All workers attempt each round after leaving its exit barrier and before
    /// entering the next round, so for every round exactly one compare-exchange wins.
    /// A panicking checker counts as a failed round.
    pub fn attempt(&self, round: u64, checker: impl FnOnce(&RequireFlag)) -> bool {
        if self
            .next_round
            .compare_exchange(round, round + 1, Ordering::Relaxed, Ordering::Relaxed)
            .is_err()
        {
            return false;
        }
        if panic::catch_unwind(AssertUnwindSafe(|| checker(&self.flag))).is_err() {
            self.checker_panics.fetch_add(1, Ordering::Relaxed);
            self.flag.require(false);
        }
        if self.flag.take() {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
        true
    }
}
