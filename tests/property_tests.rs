//! Property-based tests for the refinement engine
//!
//! Outcome tables are generated at random and replayed through a table-driven sandbox, so these
//! properties hold for the engine logic independently of any interpreter.

use std::collections::HashSet;

use candor::cluster::{clusters, dedupe};
use candor::config::{RankConfig, SandboxConfig, SessionConfig};
use candor::prune::{prune_programs_that_dont_pass_test, prune_programs_that_pass_test};
use candor::rank::TestRankStrategy;
use candor::refine::{ReferenceOracle, SessionInputs};
use candor::sandbox::{ErrorKind, TableSandbox};
use candor::{CancellationToken, Executor, Outcome, run_session};
use proptest::prelude::*;

// =============================================================================
// Generators
// =============================================================================

fn program(i: usize) -> String {
    format!("def f(x): return x+{i}")
}

fn test(j: usize) -> String {
    format!("def test_f():\n    assert f(0) == {j}")
}

fn outcome(code: u8) -> Outcome {
    match code {
        0 => Outcome::Pass,
        1 => Outcome::AssertionFailure,
        _ => Outcome::Error(ErrorKind::Runtime {
            name: "TypeError".to_string(),
        }),
    }
}

/// An outcome table: `table[p][t]` is the outcome code of test `t` against program `p`.
fn table_strategy() -> impl Strategy<Value = Vec<Vec<u8>>> {
    (1usize..6, 0usize..6).prop_flat_map(|(programs, tests)| {
        prop::collection::vec(prop::collection::vec(0u8..3, tests), programs)
    })
}

fn fixture(table: &[Vec<u8>]) -> (Executor, Vec<String>, Vec<String>) {
    let num_tests = table.first().map_or(0, Vec::len);
    let programs: Vec<String> = (0..table.len()).map(program).collect();
    let tests: Vec<String> = (0..num_tests).map(test).collect();
    let mut sandbox = TableSandbox::new();
    for (p, row) in table.iter().enumerate() {
        for (t, &code) in row.iter().enumerate() {
            sandbox = sandbox.with_outcome(program(p), test(t), outcome(code));
        }
    }
    let executor = Executor::new(sandbox, SandboxConfig::default().with_preamble(false), "f");
    (executor, programs, tests)
}

fn strategy_of(index: usize) -> Option<TestRankStrategy> {
    [
        None,
        Some(TestRankStrategy::FailedCount),
        Some(TestRankStrategy::Distinguishing),
        Some(TestRankStrategy::DistinguishingSimple),
        Some(TestRankStrategy::Weighted),
        Some(TestRankStrategy::Greedy),
        Some(TestRankStrategy::Random),
    ][index]
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    /// Property: Clusters partition the programs, and members share their signature
    #[test]
    fn clusters_partition_programs(table in table_strategy()) {
        let (mut exec, programs, tests) = fixture(&table);
        let found = clusters(&mut exec, &programs, &tests);

        let members: Vec<String> = found.iter().flat_map(|c| c.members.clone()).collect();
        prop_assert_eq!(members.len(), programs.len());
        prop_assert_eq!(members.iter().collect::<HashSet<_>>(), programs.iter().collect::<HashSet<_>>());

        let signatures: HashSet<&Vec<usize>> = found.iter().map(|c| &c.signature).collect();
        prop_assert_eq!(signatures.len(), found.len());
        for cluster in &found {
            for member in &cluster.members {
                let p: usize = programs.iter().position(|q| q == member).unwrap();
                let passed: Vec<usize> = (0..tests.len()).filter(|&t| table[p][t] == 0).collect();
                prop_assert_eq!(&passed, &cluster.signature);
            }
        }
    }

    /// Property: Pruning keeps a subsequence, and the two prunes split the programs
    #[test]
    fn pruning_splits_programs(table in table_strategy()) {
        let (mut exec, programs, tests) = fixture(&table);
        let none = HashSet::new();
        for t in &tests {
            let passing = prune_programs_that_dont_pass_test(&mut exec, t, &programs, &none);
            let failing = prune_programs_that_pass_test(&mut exec, t, &programs, &none);
            prop_assert_eq!(passing.len() + failing.len(), programs.len());
            prop_assert!(passing.iter().all(|p| !failing.contains(p)));

            let mut rest = programs.iter();
            prop_assert!(passing.iter().all(|p| rest.any(|q| q == p)));
        }
    }

    /// Property: Protected programs survive every prune
    #[test]
    fn protected_programs_survive(table in table_strategy(), keep in 0usize..6) {
        let (mut exec, programs, tests) = fixture(&table);
        let protected: HashSet<String> = programs.get(keep).cloned().into_iter().collect();
        for t in &tests {
            let approved = prune_programs_that_dont_pass_test(&mut exec, t, &programs, &protected);
            let rejected = prune_programs_that_pass_test(&mut exec, t, &programs, &protected);
            for p in &protected {
                prop_assert!(approved.contains(p));
                prop_assert!(rejected.contains(p));
            }
        }
    }

    /// Property: Deduplication is idempotent and keeps first occurrences in order
    #[test]
    fn dedupe_is_idempotent(items in prop::collection::vec("[a-c]{1,2}", 0..12)) {
        let once = dedupe(&items);
        prop_assert_eq!(dedupe(&once), once.clone());
        prop_assert_eq!(once.iter().collect::<HashSet<_>>(), items.iter().collect::<HashSet<_>>());
        let firsts: Vec<usize> = once.iter().map(|u| items.iter().position(|i| i == u).unwrap()).collect();
        prop_assert!(firsts.windows(2).all(|w| w[0] < w[1]));
    }

    /// Property: Sessions terminate within budget, shrink monotonically, and keep the reference
    #[test]
    fn session_is_bounded_and_monotone(
        table in table_strategy(),
        max_queries in 0usize..8,
        strategy in 0usize..7,
    ) {
        let (mut exec, programs, tests) = fixture(&table);
        let inputs = SessionInputs {
            programs: &programs,
            tests: &tests,
            reference: Some(programs[0].as_str()),
            validation: &[],
        };
        let rank = RankConfig::default().with_tests(strategy_of(strategy));
        let trace = run_session(
            &mut exec,
            &mut ReferenceOracle::new(programs[0].clone()),
            inputs,
            &SessionConfig::default().with_max_queries(max_queries),
            &rank,
            &CancellationToken::new(),
        )
        .unwrap();

        prop_assert!(trace.queries() <= max_queries.min(tests.len()));
        prop_assert_eq!(trace.snapshots().len(), trace.queries() + 1);
        for pair in trace.snapshots().windows(2) {
            let before: HashSet<&String> = pair[0].remaining_programs.iter().collect();
            prop_assert!(pair[1].remaining_programs.iter().all(|p| before.contains(p)));
        }
        let last = trace.last();
        prop_assert!(last.remaining_programs.contains(&programs[0]));
        prop_assert!(last.approved_tests.iter().all(|t| !last.rejected_tests.contains(t)));
    }
}
