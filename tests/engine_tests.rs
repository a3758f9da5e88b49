//! End-to-end tests of the refinement engine on a table-driven sandbox.

use candor::config::{CandorConfig, PipelineConfig, RankConfig, SandboxConfig, SessionConfig};
use candor::dataset::Task;
use candor::generate::ReplayGenerator;
use candor::pipeline::run_task;
use candor::rank::{CodeRankStrategy, RankInputs, TestRankStrategy, TestRanker};
use candor::refine::{ReferenceOracle, SessionInputs};
use candor::regression::RegressionPolicy;
use candor::sandbox::TableSandbox;
use candor::{CancellationToken, Executor, Outcome, run_session};

const PLUS: &str = "def f(x): return x+1";
const MINUS: &str = "def f(x): return x-1";
const IDENT: &str = "def f(x): return x";
const TWO: &str = "def test_f():\n    assert f(1) == 2";
const ZERO: &str = "def test_f():\n    assert f(1) == 0";
const ONE: &str = "def test_f():\n    assert f(1) == 1";

fn s(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Each of the three programs passes exactly the test naming its own `f(1)`.
fn sandbox() -> TableSandbox {
    TableSandbox::new()
        .with_outcome(PLUS, TWO, Outcome::Pass)
        .with_outcome(MINUS, ZERO, Outcome::Pass)
        .with_outcome(IDENT, ONE, Outcome::Pass)
        .with_value(PLUS, "f(1)", "2")
        .with_value(MINUS, "f(1)", "0")
        .with_value(IDENT, "f(1)", "1")
        .with_fallback(Outcome::AssertionFailure)
}

fn executor() -> Executor {
    Executor::new(sandbox(), SandboxConfig::default().with_preamble(false), "f")
}

#[test]
fn failed_count_ranks_the_discriminating_test_first_and_approval_leaves_the_right_program() {
    let programs = s(&[PLUS, MINUS, IDENT]);
    let tautology = "def test_f():\n    assert True";
    let tests = s(&[tautology, TWO]);
    let mut exec = Executor::new(
        sandbox().with_outcome(PLUS, tautology, Outcome::Pass)
            .with_outcome(MINUS, tautology, Outcome::Pass)
            .with_outcome(IDENT, tautology, Outcome::Pass),
        SandboxConfig::default().with_preamble(false),
        "f",
    );

    let rank = RankConfig::default().with_tests(Some(TestRankStrategy::FailedCount));
    let ranked = TestRanker::new(&rank).rank(&mut exec, &tests, &programs, RankInputs::default());
    assert_eq!(ranked[0], TWO);

    let inputs = SessionInputs {
        programs: &programs,
        tests: &tests,
        reference: Some(PLUS),
        validation: &[],
    };
    let trace = run_session(
        &mut exec,
        &mut ReferenceOracle::new(PLUS),
        inputs,
        &SessionConfig::default().with_max_queries(1),
        &rank,
        &CancellationToken::new(),
    )
    .unwrap();
    assert_eq!(trace.last().remaining_programs, s(&[PLUS]));
    assert_eq!(trace.last().approved_tests, s(&[TWO]));
}

#[test]
fn trace_is_monotone_and_invariants_hold() {
    let programs = s(&[PLUS, MINUS, IDENT]);
    let tests = s(&[ZERO, ONE, TWO]);
    let inputs = SessionInputs {
        programs: &programs,
        tests: &tests,
        reference: Some(PLUS),
        validation: &[],
    };
    let mut exec = executor();
    let trace = run_session(
        &mut exec,
        &mut ReferenceOracle::new(PLUS),
        inputs,
        &SessionConfig::default(),
        &RankConfig::default().with_code(Some(CodeRankStrategy::PassingCount)),
        &CancellationToken::new(),
    )
    .unwrap();

    assert_eq!(trace.snapshots().len(), 4);
    for pair in trace.snapshots().windows(2) {
        assert!(pair[1].remaining_programs.len() <= pair[0].remaining_programs.len());
        assert!(pair[1].remaining_programs.iter().all(|p| pair[0].remaining_programs.contains(p)));
        assert_eq!(pair[1].query_count, pair[0].query_count + 1);
    }
    let last = trace.last();
    assert!(last.approved_tests.iter().all(|t| !last.rejected_tests.contains(t)));
    for test in &last.approved_tests {
        for program in &last.remaining_programs {
            assert!(exec.passes(program, test));
        }
    }
    assert_eq!(last.remaining_programs, s(&[PLUS]));
    assert_eq!(last.rejected_tests.len(), 2);
}

#[test]
fn pipeline_with_regression_tests_finds_the_reference() {
    let task = Task::new("regress", "f")
        .with_oracle(PLUS)
        .with_programs(s(&[PLUS, MINUS, IDENT, PLUS]))
        .with_tests(s(&["def test_f():\n    assert f(1) == 42"]))
        .with_val_tests(s(&["assert f(1) == 2"]));
    let config = CandorConfig::default()
        .with_rank(
            RankConfig::default()
                .with_tests(Some(TestRankStrategy::FailedCount))
                .with_code(Some(CodeRankStrategy::WeightedPassing)),
        )
        .with_session(SessionConfig::default().with_max_queries(3))
        .with_pipeline(PipelineConfig::default().with_regression(RegressionPolicy::All));

    let record = run_task(
        &task,
        &mut executor(),
        &mut ReplayGenerator,
        &mut ReferenceOracle::new(PLUS),
        &config,
        &CancellationToken::new(),
    )
    .unwrap();

    // The guessed test plus one regression test per distinct behavior.
    assert_eq!(record.stats.session_tests, 4);
    let last = record.snapshots.last().unwrap();
    assert_eq!(last.status, vec![true]);
    assert_eq!(last.weights, vec![2]);
    assert_eq!(record.final_precision(), Some(1.0));
}

#[test]
fn session_without_tests_returns_programs_unpruned() {
    let programs = s(&[PLUS, MINUS]);
    let inputs = SessionInputs {
        programs: &programs,
        tests: &[],
        reference: Some(PLUS),
        validation: &[],
    };
    let trace = run_session(
        &mut executor(),
        &mut ReferenceOracle::new(PLUS),
        inputs,
        &SessionConfig::default(),
        &RankConfig::default(),
        &CancellationToken::new(),
    )
    .unwrap();
    assert_eq!(trace.snapshots().len(), 1);
    assert_eq!(trace.last().remaining_programs, programs);
}
