use std::collections::HashSet;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use super::{TestRankStrategy, sort_descending_by};
use crate::config::RankConfig;
use crate::executor::{Executor, OutcomeMatrix};
use crate::prune;
use crate::refine::{Verdict, reference_verdict};

/// Ground truth some strategies peek at.
#[derive(Debug, Clone, Copy, Default)]
pub struct RankInputs<'a> {
    /// Reference program answering for the user under `greedy` and `ideal`.
    pub reference: Option<&'a str>,
    /// Held-out tests separating good programs from bad ones under `ideal`.
    pub validation: &'a [String],
}

/// Orders candidate tests by how useful asking about them would be.
pub struct TestRanker {
    strategy: Option<TestRankStrategy>,
    rng: StdRng,
}

impl TestRanker {
    pub fn new(config: &RankConfig) -> Self {
        Self {
            strategy: config.tests,
            rng: StdRng::seed_from_u64(config.seed),
        }
    }

    pub fn strategy(&self) -> Option<TestRankStrategy> {
        self.strategy
    }

    #[tracing::instrument(skip_all, fields(strategy = ?self.strategy, tests = tests.len(), programs = programs.len()))]
    pub fn rank(
        &mut self,
        executor: &mut Executor,
        tests: &[String],
        programs: &[String],
        inputs: RankInputs<'_>,
    ) -> Vec<String> {
        let Some(strategy) = self.strategy else {
            return tests.to_vec();
        };
        match strategy {
            TestRankStrategy::FailedCount => {
                let matrix = executor.outcomes(programs, tests);
                sort_descending_by(tests, |t| {
                    (matrix.assertion_failure_count(t), programs.len() - matrix.pass_count(t))
                })
            }
            TestRankStrategy::Distinguishing => {
                let matrix = executor.outcomes(programs, tests);
                sort_descending_by(tests, |t| {
                    balance(matrix.pass_count(t) as f64, matrix.assertion_failure_count(t) as f64)
                })
            }
            TestRankStrategy::DistinguishingSimple => {
                let matrix = executor.outcomes(programs, tests);
                sort_descending_by(tests, |t| {
                    let pass = matrix.pass_count(t);
                    balance(pass as f64, (programs.len() - pass) as f64)
                })
            }
            TestRankStrategy::Weighted => {
                let matrix = executor.outcomes(programs, tests);
                let keys = weighted_keys(&matrix);
                sort_descending_by(tests, |t| keys[t])
            }
            TestRankStrategy::Greedy => sort_descending_by(tests, |t| greedy_key(executor, &tests[t], programs, inputs)),
            TestRankStrategy::Ideal => {
                let (good, bad): (Vec<String>, Vec<String>) = programs
                    .iter()
                    .cloned()
                    .partition(|p| executor.satisfies_validation_tests(p, inputs.validation));
                sort_descending_by(tests, |t| ideal_key(executor, &tests[t], &good, &bad, inputs))
            }
            TestRankStrategy::Random => {
                let mut shuffled = tests.to_vec();
                shuffled.shuffle(&mut self.rng);
                shuffled
            }
        }
    }
}

/// `min / max(1, max)` of the two sides.
fn balance(pass: f64, fail: f64) -> f64 {
    pass.min(fail) / pass.max(fail).max(1.0)
}

/// Weighted balance per test. A program counts `(T - n) * 100 / T` on a side, where `n` is the
/// number of tests it lands on that side of.
fn weighted_keys(matrix: &OutcomeMatrix) -> Vec<f64> {
    let total = matrix.num_tests() as f64;
    let passed_by: Vec<f64> = (0..matrix.num_programs())
        .map(|p| matrix.passed_tests(p).len() as f64)
        .collect();
    let failed_by: Vec<f64> = (0..matrix.num_programs())
        .map(|p| matrix.assertion_failures_of(p) as f64)
        .collect();
    (0..matrix.num_tests())
        .map(|t| {
            let (mut pass, mut fail) = (0.0, 0.0);
            for (p, outcome) in matrix.test_row(t).iter().enumerate() {
                if outcome.is_pass() {
                    pass += (total - passed_by[p]) * 100.0 / total;
                } else if outcome.is_assertion_failure() {
                    fail += (total - failed_by[p]) * 100.0 / total;
                }
            }
            balance(pass, fail)
        })
        .collect()
}

fn pruned_under(executor: &mut Executor, verdict: Verdict, test: &str, programs: &[String]) -> usize {
    let none = HashSet::new();
    let kept = match verdict {
        Verdict::Approve => prune::prune_programs_that_dont_pass_test(executor, test, programs, &none),
        Verdict::Reject => prune::prune_programs_that_pass_test(executor, test, programs, &none),
        Verdict::Skip => return 0,
    };
    programs.len() - kept.len()
}

fn verdict_for(executor: &mut Executor, test: &str, inputs: RankInputs<'_>) -> Verdict {
    inputs
        .reference
        .map_or(Verdict::Skip, |reference| reference_verdict(executor, reference, test))
}

fn greedy_key(executor: &mut Executor, test: &str, programs: &[String], inputs: RankInputs<'_>) -> usize {
    let verdict = verdict_for(executor, test, inputs);
    pruned_under(executor, verdict, test, programs)
}

/// `(bad programs pruned, good programs kept)`.
fn ideal_key(
    executor: &mut Executor,
    test: &str,
    good: &[String],
    bad: &[String],
    inputs: RankInputs<'_>,
) -> (usize, usize) {
    let verdict = verdict_for(executor, test, inputs);
    if verdict == Verdict::Skip {
        return (0, 0);
    }
    let bad_pruned = pruned_under(executor, verdict, test, bad);
    let good_kept = good.len() - pruned_under(executor, verdict, test, good);
    (bad_pruned, good_kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SandboxConfig;
    use crate::sandbox::{ErrorKind, Outcome, TableSandbox};

    fn s(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn ranker(strategy: TestRankStrategy) -> TestRanker {
        TestRanker::new(&RankConfig::default().with_tests(Some(strategy)))
    }

    fn type_error() -> Outcome {
        Outcome::Error(ErrorKind::Runtime {
            name: "TypeError".into(),
        })
    }

    /// Programs p1..p3 against tests:
    /// - `even`: p1 passes, p2 and p3 assertion-fail
    /// - `split`: p1 and p2 pass, p3 assertion-fails
    /// - `noisy`: p1 passes, p2 and p3 error
    /// - `all`: everyone passes
    fn executor() -> Executor {
        let sandbox = TableSandbox::new()
            .with_outcome("p1", "even", Outcome::Pass)
            .with_outcome("p1", "split", Outcome::Pass)
            .with_outcome("p2", "split", Outcome::Pass)
            .with_outcome("p1", "noisy", Outcome::Pass)
            .with_outcome("p2", "noisy", type_error())
            .with_outcome("p3", "noisy", type_error())
            .with_outcome("p1", "all", Outcome::Pass)
            .with_outcome("p2", "all", Outcome::Pass)
            .with_outcome("p3", "all", Outcome::Pass)
            .with_outcome("ref", "even", Outcome::Pass)
            .with_outcome("ref", "split", Outcome::AssertionFailure)
            .with_outcome("ref", "all", Outcome::Pass)
            .with_outcome("ref", "noisy", type_error())
            .with_fallback(Outcome::AssertionFailure);
        Executor::new(sandbox, SandboxConfig::default().with_preamble(false), "f")
    }

    fn tests() -> Vec<String> {
        s(&["all", "noisy", "split", "even"])
    }

    fn programs() -> Vec<String> {
        s(&["p1", "p2", "p3"])
    }

    #[test]
    fn test_no_strategy_keeps_order() {
        let mut ranker = TestRanker::new(&RankConfig::default());
        let ranked = ranker.rank(&mut executor(), &tests(), &programs(), RankInputs::default());
        assert_eq!(ranked, tests());
    }

    #[test]
    fn test_failed_count() {
        let ranked = ranker(TestRankStrategy::FailedCount).rank(&mut executor(), &tests(), &programs(), RankInputs::default());
        // even (2, 2), split (1, 1), noisy (0, 2), all (0, 0)
        assert_eq!(ranked, s(&["even", "split", "noisy", "all"]));
    }

    #[test]
    fn test_distinguishing_counts_only_assertion_failures() {
        let ranked =
            ranker(TestRankStrategy::Distinguishing).rank(&mut executor(), &tests(), &programs(), RankInputs::default());
        // split 1/2, even 1/2, all 0, noisy 0: ties keep incoming order.
        assert_eq!(ranked, s(&["split", "even", "all", "noisy"]));

        let simple = ranker(TestRankStrategy::DistinguishingSimple).rank(
            &mut executor(),
            &tests(),
            &programs(),
            RankInputs::default(),
        );
        assert_eq!(simple, s(&["noisy", "split", "even", "all"]));
    }

    #[test]
    fn test_weighted_prefers_tests_rare_programs_pass() {
        let ranked = ranker(TestRankStrategy::Weighted).rank(&mut executor(), &tests(), &programs(), RankInputs::default());
        // p1 passes all 4 tests so contributes nothing on the pass side; only split balances.
        assert_eq!(ranked, s(&["split", "all", "noisy", "even"]));
    }

    #[test]
    fn test_greedy_uses_reference_verdict() {
        let inputs = RankInputs {
            reference: Some("ref"),
            validation: &[],
        };
        let ranked = ranker(TestRankStrategy::Greedy).rank(&mut executor(), &tests(), &programs(), inputs);
        // even: approve prunes 2; split: reject prunes 2; noisy: skip; all: approve prunes 0.
        assert_eq!(ranked, s(&["split", "even", "all", "noisy"]));
    }

    #[test]
    fn test_ideal_prefers_pruning_bad_programs() {
        let validation = s(&["even"]);
        let inputs = RankInputs {
            reference: Some("ref"),
            validation: &validation,
        };
        let ranked = ranker(TestRankStrategy::Ideal).rank(&mut executor(), &tests(), &programs(), inputs);
        // good = {p1}. even: (2, 1); split: (1, 0); all: (0, 1); noisy: (0, 0).
        assert_eq!(ranked, s(&["even", "split", "all", "noisy"]));
    }

    #[test]
    fn test_random_is_a_seeded_permutation() {
        let a = ranker(TestRankStrategy::Random).rank(&mut executor(), &tests(), &programs(), RankInputs::default());
        let b = ranker(TestRankStrategy::Random).rank(&mut executor(), &tests(), &programs(), RankInputs::default());
        assert_eq!(a, b);
        let mut sorted = a.clone();
        sorted.sort();
        let mut expected = tests();
        expected.sort();
        assert_eq!(sorted, expected);
    }
}
