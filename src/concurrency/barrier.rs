//! Implements the reusable round barrier.

use std::sync::atomic::{AtomicUsize, Ordering};

/// How a participant waits for the rest of the round to arrive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WaitStrategy {
    /// Busy-wait until the round is released. Waiters never give up their core.
    #[default]
    Spin,
    /// Busy-wait for `spins` polls, then yield to the OS scheduler between polls.
    /// Only meant for machines with fewer cores than participants, where a pure
    /// spin would burn every time slice waiting for a descheduled thread.
    SpinThenYield { spins: u32 },
}

/// A rendezvous point for a fixed number of participants, re-armed every round.
///
/// Everything a participant did before calling [`wait`](Self::wait) happens-before
/// everything any participant does after its matching `wait` returns. The barrier
/// guarantees nothing beyond that.
///
/// A participant must not call `wait` again before every participant has left the
/// previous round. If fewer than `capacity` threads call `wait`, they hang.
#[derive(Debug)]
pub struct RoundBarrier {
    capacity: usize,
    /// Participants still missing in the current generation.
    remaining: AtomicUsize,
    generation: AtomicUsize,
    strategy: WaitStrategy,
}

impl RoundBarrier {
    pub fn new(capacity: usize) -> Self {
        Self::with_strategy(capacity, WaitStrategy::Spin)
    }

    pub fn with_strategy(capacity: usize, strategy: WaitStrategy) -> Self {
        assert!(capacity > 0, "a round barrier needs at least one participant");
        Self {
            capacity,
            remaining: AtomicUsize::new(capacity),
            generation: AtomicUsize::new(0),
            strategy,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The number of completed rounds.
    pub fn generation(&self) -> usize {
        self.generation.load(Ordering::Acquire)
    }

    /// Blocks until all `capacity` participants of the current generation arrived.
    pub fn wait(&self) {
        // We left the previous generation only after observing its bump, so this
        // cannot be stale: the current generation needs our arrival to complete.
        let my_generation = self.generation.load(Ordering::Relaxed);
        // AcqRel: the last arrival must acquire every earlier arrival's writes
        // before it publishes them all with the generation bump below.
        if self.remaining.fetch_sub(1, Ordering::AcqRel) == 1 {
            // Ordered before the bump, so nobody can decrement before the reset.
            self.remaining.store(self.capacity, Ordering::Relaxed);
            self.generation.fetch_add(1, Ordering::Release);
            return;
        }
        match self.strategy {
            WaitStrategy::Spin =>
                while self.generation.load(Ordering::Acquire) == my_generation {
                    std::hint::spin_loop();
                },
            WaitStrategy::SpinThenYield { spins } => {
                let mut polls = 0u32;
                while self.generation.load(Ordering::Acquire) == my_generation {
                    if polls < spins {
                        polls += 1;
                        std::hint::spin_loop();
                    } else {
                        std::thread::yield_now();
                    }
                }
            }
        }
    }
}
