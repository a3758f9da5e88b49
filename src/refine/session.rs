use std::collections::HashSet;

use serde::Serialize;

use super::{CancellationToken, Oracle, SessionError, Verdict};
use crate::cluster;
use crate::config::{RankConfig, SessionConfig};
use crate::executor::Executor;
use crate::prune;
use crate::rank::{CodeRanker, RankInputs, TestRanker};
use crate::rewrite;

/// Candidates and ground truth for one session.
#[derive(Debug, Clone, Copy)]
pub struct SessionInputs<'a> {
    pub programs: &'a [String],
    pub tests: &'a [String],
    /// Known-correct program, used by reference-driven rankings and test repair.
    pub reference: Option<&'a str>,
    /// Held-out tests; never shown to the oracle.
    pub validation: &'a [String],
}

/// Session state after some number of verdicts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub query_count: usize,
    pub remaining_programs: Vec<String>,
    pub approved_tests: Vec<String>,
    pub rejected_tests: Vec<String>,
}

/// Every snapshot of a session, starting with the initial state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionTrace {
    snapshots: Vec<Snapshot>,
}

impl SessionTrace {
    /// Every snapshot in query order; never empty.
    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    /// The state the session ended in.
    pub fn last(&self) -> &Snapshot {
        // A trace always holds the initial snapshot.
        &self.snapshots[self.snapshots.len() - 1]
    }

    pub fn queries(&self) -> usize {
        self.last().query_count
    }
}

struct SessionState {
    remaining_programs: Vec<String>,
    remaining_tests: Vec<String>,
    approved_tests: Vec<String>,
    rejected_tests: Vec<String>,
    query_count: usize,
}

impl SessionState {
    fn snapshot(&self) -> Snapshot {
        Snapshot {
            query_count: self.query_count,
            remaining_programs: self.remaining_programs.clone(),
            approved_tests: self.approved_tests.clone(),
            rejected_tests: self.rejected_tests.clone(),
        }
    }

    fn exhausted(&self, config: &SessionConfig) -> bool {
        if self.remaining_tests.is_empty() || config.max_queries == 0 {
            return true;
        }
        if config.count_accepted_only {
            self.approved_tests.len() >= config.max_queries || self.query_count >= config.accepted_query_ceiling
        } else {
            self.query_count >= config.max_queries
        }
    }

    fn approve(&mut self, test: String) {
        self.remaining_tests.retain(|t| *t != test);
        if !self.approved_tests.contains(&test) && !self.rejected_tests.contains(&test) {
            self.approved_tests.push(test);
        }
    }

    fn reject(&mut self, test: String) {
        self.remaining_tests.retain(|t| *t != test);
        if !self.approved_tests.contains(&test) && !self.rejected_tests.contains(&test) {
            self.rejected_tests.push(test);
        }
    }
}

/// Run one refinement session to termination.
///
/// ## Errors
/// Returns [`SessionError::Cancelled`] if `cancel` fires or the oracle gives up. Nothing else
/// escapes: a session without tests completes with the programs untouched.
#[tracing::instrument(skip_all, fields(programs = inputs.programs.len(), tests = inputs.tests.len()))]
pub fn run_session(
    executor: &mut Executor,
    oracle: &mut dyn Oracle,
    inputs: SessionInputs<'_>,
    config: &SessionConfig,
    rank: &RankConfig,
    cancel: &CancellationToken,
) -> Result<SessionTrace, SessionError> {
    let mut test_ranker = TestRanker::new(rank);
    let code_ranker = CodeRanker::new(rank);
    let rank_inputs = RankInputs {
        reference: inputs.reference,
        validation: inputs.validation,
    };
    let protect = oracle.is_automatic() && config.protect_validated && !inputs.validation.is_empty();

    let mut state = SessionState {
        remaining_programs: inputs.programs.to_vec(),
        remaining_tests: cluster::dedupe(inputs.tests),
        approved_tests: Vec::new(),
        rejected_tests: Vec::new(),
        query_count: 0,
    };
    let mut snapshots = vec![state.snapshot()];

    loop {
        cancel.check()?;
        if state.exhausted(config) {
            break;
        }

        let mut ranked = test_ranker.rank(executor, &state.remaining_tests, &state.remaining_programs, rank_inputs);
        let test = ranked.remove(0);
        state.remaining_tests = ranked;

        let verdict = oracle.verdict(&test, executor)?;
        let protected: HashSet<String> = if protect && verdict != Verdict::Skip {
            state
                .remaining_programs
                .iter()
                .filter(|p| executor.satisfies_validation_tests(p, inputs.validation))
                .cloned()
                .collect()
        } else {
            HashSet::new()
        };

        match verdict {
            Verdict::Approve => {
                state.remaining_programs =
                    prune::prune_programs_that_dont_pass_test(executor, &test, &state.remaining_programs, &protected);
                tracing::debug!(remaining = state.remaining_programs.len(), "approved test");
                state.approve(test);
            }
            Verdict::Reject => match repaired(executor, config, inputs.reference, &test) {
                Some(fixed) => {
                    state.remaining_programs =
                        prune::prune_programs_that_dont_pass_test(executor, &fixed, &state.remaining_programs, &protected);
                    tracing::debug!(remaining = state.remaining_programs.len(), "approved repaired test");
                    state.approve(fixed);
                }
                None => {
                    state.remaining_programs =
                        prune::prune_programs_that_pass_test(executor, &test, &state.remaining_programs, &protected);
                    tracing::debug!(remaining = state.remaining_programs.len(), "rejected test");
                    state.reject(test);
                }
            },
            Verdict::Skip => tracing::debug!("skipped test"),
        }

        state.query_count += 1;
        state.remaining_programs = code_ranker.rank(executor, &state.remaining_programs, &state.remaining_tests);
        snapshots.push(state.snapshot());
    }

    tracing::info!(
        queries = state.query_count,
        remaining = state.remaining_programs.len(),
        approved = state.approved_tests.len(),
        rejected = state.rejected_tests.len(),
        "session finished"
    );
    Ok(SessionTrace { snapshots })
}

/// The test repaired against the reference, if repair is enabled, concretized something, and the
/// reference passes the result.
fn repaired(executor: &mut Executor, config: &SessionConfig, reference: Option<&str>, test: &str) -> Option<String> {
    if !config.user_fixes_tests {
        return None;
    }
    let reference = reference?;
    match rewrite::rewrite(executor, reference, test) {
        Ok(fixed) if fixed.rewritten > 0 => {
            if executor.passes(reference, &fixed.text) {
                Some(fixed.text)
            } else {
                tracing::debug!("repaired test still fails the reference; rejecting");
                None
            }
        }
        Ok(_) => None,
        Err(errors) => {
            tracing::debug!(errors = errors.len(), "rejected test does not parse; not repairing");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SandboxConfig;
    use crate::rank::TestRankStrategy;
    use crate::refine::ReferenceOracle;
    use crate::sandbox::{Outcome, TableSandbox};

    const PLUS: &str = "def f(x): return x+1";
    const MINUS: &str = "def f(x): return x-1";
    const IDENT: &str = "def f(x): return x";
    const TWO: &str = "def test_f():\n    assert f(1) == 2";
    const ZERO: &str = "def test_f():\n    assert f(1) == 0";

    fn s(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn sandbox() -> TableSandbox {
        TableSandbox::new()
            .with_outcome(PLUS, TWO, Outcome::Pass)
            .with_outcome(MINUS, ZERO, Outcome::Pass)
            .with_fallback(Outcome::AssertionFailure)
    }

    fn executor(sandbox: TableSandbox) -> Executor {
        Executor::new(sandbox, SandboxConfig::default().with_preamble(false), "f")
    }

    fn failed_count() -> RankConfig {
        RankConfig::default().with_tests(Some(TestRankStrategy::FailedCount))
    }

    #[test]
    fn test_approval_prunes_disagreeing_programs() {
        let programs = s(&[PLUS, MINUS, IDENT]);
        let tests = s(&[TWO]);
        let inputs = SessionInputs {
            programs: &programs,
            tests: &tests,
            reference: Some(PLUS),
            validation: &[],
        };
        let trace = run_session(
            &mut executor(sandbox()),
            &mut ReferenceOracle::new(PLUS),
            inputs,
            &SessionConfig::default(),
            &failed_count(),
            &CancellationToken::new(),
        )
        .unwrap();
        assert_eq!(trace.snapshots().len(), 2);
        assert_eq!(trace.snapshots()[0].remaining_programs, programs);
        assert_eq!(trace.last().remaining_programs, s(&[PLUS]));
        assert_eq!(trace.last().approved_tests, s(&[TWO]));
        assert_eq!(trace.queries(), 1);
    }

    #[test]
    fn test_rejection_prunes_passing_programs() {
        let programs = s(&[PLUS, MINUS, IDENT]);
        let tests = s(&[ZERO, ZERO]);
        let inputs = SessionInputs {
            programs: &programs,
            tests: &tests,
            reference: Some(PLUS),
            validation: &[],
        };
        let trace = run_session(
            &mut executor(sandbox()),
            &mut ReferenceOracle::new(PLUS),
            inputs,
            &SessionConfig::default(),
            &RankConfig::default(),
            &CancellationToken::new(),
        )
        .unwrap();
        // Duplicates are asked about once.
        assert_eq!(trace.queries(), 1);
        assert_eq!(trace.last().remaining_programs, s(&[PLUS, IDENT]));
        assert_eq!(trace.last().rejected_tests, s(&[ZERO]));
    }

    #[test]
    fn test_query_budget_and_empty_tests() {
        let programs = s(&[PLUS, MINUS]);
        let tests = s(&[TWO, ZERO]);
        let mut inputs = SessionInputs {
            programs: &programs,
            tests: &tests,
            reference: Some(PLUS),
            validation: &[],
        };
        let run = |inputs, config: &SessionConfig| {
            run_session(
                &mut executor(sandbox()),
                &mut ReferenceOracle::new(PLUS),
                inputs,
                config,
                &RankConfig::default(),
                &CancellationToken::new(),
            )
            .unwrap()
        };
        assert_eq!(run(inputs, &SessionConfig::default().with_max_queries(1)).queries(), 1);
        assert_eq!(run(inputs, &SessionConfig::default().with_max_queries(0)).snapshots().len(), 1);

        inputs.tests = &[];
        let trace = run(inputs, &SessionConfig::default());
        assert_eq!(trace.snapshots().len(), 1);
        assert_eq!(trace.last().remaining_programs, programs);
    }

    #[test]
    fn test_accepted_only_counting() {
        // Every test is rejected, so only the ceiling stops the session.
        let programs = s(&[PLUS]);
        let tests: Vec<String> = (0..20).map(|i| format!("def test_f():\n    assert f({i}) == -1")).collect();
        let inputs = SessionInputs {
            programs: &programs,
            tests: &tests,
            reference: Some(PLUS),
            validation: &[],
        };
        let config = SessionConfig::default().with_max_queries(2).with_count_accepted_only(true);
        let trace = run_session(
            &mut executor(sandbox()),
            &mut ReferenceOracle::new(PLUS),
            inputs,
            &config,
            &RankConfig::default(),
            &CancellationToken::new(),
        )
        .unwrap();
        assert_eq!(trace.queries(), 10);
        assert_eq!(trace.last().rejected_tests.len(), 10);
    }

    #[test]
    fn test_validated_programs_are_protected() {
        let validation = s(&["def test_f():\n    assert f(5) == 4"]);
        let sandbox = sandbox().with_outcome(MINUS, &validation[0], Outcome::Pass);
        let programs = s(&[PLUS, MINUS]);
        let tests = s(&[TWO]);
        let inputs = SessionInputs {
            programs: &programs,
            tests: &tests,
            reference: Some(PLUS),
            validation: &validation,
        };
        let run = |config: SessionConfig| {
            run_session(
                &mut executor(sandbox.clone()),
                &mut ReferenceOracle::new(PLUS),
                inputs,
                &config,
                &RankConfig::default(),
                &CancellationToken::new(),
            )
            .unwrap()
        };
        assert_eq!(run(SessionConfig::default()).last().remaining_programs, programs);
        assert_eq!(
            run(SessionConfig::default().with_protect_validated(false)).last().remaining_programs,
            s(&[PLUS])
        );
    }

    #[test]
    fn test_rejected_test_is_repaired_against_reference() {
        let wrong = "def test_f():\n    assert f(1) == 7\n";
        let fixed = "def test_f():\n    assert f(1) == 2\n";
        let sandbox = sandbox()
            .with_outcome(PLUS, fixed, Outcome::Pass)
            .with_value(PLUS, "f(1)", "2");
        let programs = s(&[PLUS, MINUS]);
        let tests = s(&[wrong]);
        let inputs = SessionInputs {
            programs: &programs,
            tests: &tests,
            reference: Some(PLUS),
            validation: &[],
        };
        let trace = run_session(
            &mut executor(sandbox),
            &mut ReferenceOracle::new(PLUS),
            inputs,
            &SessionConfig::default().with_user_fixes_tests(true),
            &RankConfig::default(),
            &CancellationToken::new(),
        )
        .unwrap();
        assert_eq!(trace.last().approved_tests, s(&[fixed]));
        assert!(trace.last().rejected_tests.is_empty());
        assert_eq!(trace.last().remaining_programs, s(&[PLUS]));
    }

    #[test]
    fn test_repair_never_approves_what_the_reference_fails() {
        // `!=` and `is not` keep their operator, so concretizing them leaves tests the reference fails.
        let not_equal = "def test_f():\n    assert f(1) != 2";
        let not_same = "def test_f():\n    assert f(1) is not 2";
        let sandbox = TableSandbox::new()
            .with_outcome(MINUS, not_equal, Outcome::Pass)
            .with_outcome(MINUS, not_same, Outcome::Pass)
            .with_value(PLUS, "f(1)", "2")
            .with_fallback(Outcome::AssertionFailure);
        let programs = s(&[PLUS, MINUS]);
        let tests = s(&[not_equal, not_same]);
        let inputs = SessionInputs {
            programs: &programs,
            tests: &tests,
            reference: Some(PLUS),
            validation: &[],
        };
        let trace = run_session(
            &mut executor(sandbox),
            &mut ReferenceOracle::new(PLUS),
            inputs,
            &SessionConfig::default().with_user_fixes_tests(true),
            &RankConfig::default(),
            &CancellationToken::new(),
        )
        .unwrap();
        assert!(trace.last().approved_tests.is_empty());
        assert_eq!(trace.last().rejected_tests, tests);
        assert_eq!(trace.last().remaining_programs, s(&[PLUS]));
    }

    #[test]
    fn test_cancellation_aborts() {
        let programs = s(&[PLUS]);
        let tests = s(&[TWO]);
        let inputs = SessionInputs {
            programs: &programs,
            tests: &tests,
            reference: None,
            validation: &[],
        };
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = run_session(
            &mut executor(sandbox()),
            &mut ReferenceOracle::new(PLUS),
            inputs,
            &SessionConfig::default(),
            &RankConfig::default(),
            &cancel,
        );
        assert!(matches!(result, Err(SessionError::Cancelled(_))));
    }
}
