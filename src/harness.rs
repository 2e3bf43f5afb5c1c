use crate::runner::{RoundedTestRunner, TestResult};
use crate::scenario::Scenario;

/// What happened to one scenario.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
#[cfg_attr(feature = "json", serde(tag = "status", rename_all = "snake_case"))]
pub enum Outcome {
    /// All rounds ran; `failed` may still be non-zero.
    Completed(TestResult),
    /// The scenario needs more cores than are available, so no thread was spawned.
    Skipped { required: usize, available: usize },
}

/// Runs scenarios after checking they fit on the available cores.
#[derive(Debug, Clone)]
pub struct Harness {
    runner: RoundedTestRunner,
    available_concurrency: usize,
}

impl Harness {
    pub fn new(runner: RoundedTestRunner, available_concurrency: usize) -> Self {
        Self { runner, available_concurrency }
    }

    pub fn available_concurrency(&self) -> usize {
        self.available_concurrency
    }

    pub fn runner(&self) -> &RoundedTestRunner {
        &self.runner
    }

    /// The pre-flight capacity check: `Some` skip outcome if `scenario` cannot run.
    pub fn preflight(&self, scenario: &Scenario) -> Option<Outcome> {
        let required = scenario.required_concurrency();
        (required > self.available_concurrency)
            .then_some(Outcome::Skipped { required, available: self.available_concurrency })
    }

    pub fn execute(&self, scenario: &Scenario) -> Outcome {
        if let Some(skipped) = self.preflight(scenario) {
            info!(
                "skipping `{}`: requires {} cores, {} available",
                scenario.name(),
                scenario.required_concurrency(),
                self.available_concurrency
            );
            return skipped;
        }
        Outcome::Completed(self.runner.run(scenario))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::concurrency::barrier::WaitStrategy;
    use crate::runner::RunnerConfig;

    fn harness(available: usize) -> Harness {
        let runner = RoundedTestRunner::new(RunnerConfig {
            iterations: 50,
            settle_spins: 0,
            wait: WaitStrategy::SpinThenYield { spins: 64 },
            ..RunnerConfig::default()
        });
        Harness::new(runner, available)
    }

    fn counting_scenario(bodies: usize, calls: &Arc<AtomicUsize>) -> Scenario {
        let mut builder = Scenario::builder("counting");
        for _ in 0..bodies {
            let calls = calls.clone();
            builder = builder.body(move |_| {
                calls.fetch_add(1, Ordering::Relaxed);
            });
        }
        let checker_calls = calls.clone();
        builder
            .checker(move |_| {
                checker_calls.fetch_add(1, Ordering::Relaxed);
            })
            .build()
            .unwrap()
    }

    #[test]
    fn insufficient_concurrency_spawns_nothing() {
        let calls = Arc::new(AtomicUsize::new(0));
        let scenario = counting_scenario(4, &calls);
        assert_eq!(harness(2).execute(&scenario), Outcome::Skipped { required: 4, available: 2 });
        assert_eq!(calls.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn exact_fit_runs() {
        let calls = Arc::new(AtomicUsize::new(0));
        let scenario = counting_scenario(2, &calls);
        let harness = harness(2);
        assert_eq!(harness.available_concurrency(), 2);
        assert_eq!(harness.runner().config().iterations, 50);
        let outcome = harness.execute(&scenario);
        assert_eq!(outcome, Outcome::Completed(TestResult { total: 50, failed: 0 }));
        // 2 bodies and 1 checker per round.
        assert_eq!(calls.load(Ordering::Relaxed), 150);
    }
}
