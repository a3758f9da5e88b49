//! Outcome-driven pruning of tests and programs.

use std::collections::HashSet;

use crate::executor::Executor;

/// Keep tests that run to completion (pass or assertion failure) against at least one program.
///
/// A test that errors everywhere is malformed rather than discriminating.
#[tracing::instrument(skip_all, fields(programs = programs.len(), tests = tests.len()))]
pub fn prune_tests_that_dont_pass_code(executor: &mut Executor, programs: &[String], tests: &[String]) -> Vec<String> {
    let kept: Vec<String> = tests
        .iter()
        .filter(|test| programs.iter().any(|p| executor.execute(p, test).is_well_formed()))
        .cloned()
        .collect();
    tracing::info!(kept = kept.len(), dropped = tests.len() - kept.len(), "pruned malformed tests");
    kept
}

/// Keep programs against which at least one test runs to completion.
#[tracing::instrument(skip_all, fields(programs = programs.len(), tests = tests.len()))]
pub fn prune_programs_that_dont_pass_any_tests(
    executor: &mut Executor,
    programs: &[String],
    tests: &[String],
) -> Vec<String> {
    let kept: Vec<String> = programs
        .iter()
        .filter(|program| tests.iter().any(|t| executor.execute(program, t).is_well_formed()))
        .cloned()
        .collect();
    tracing::info!(kept = kept.len(), dropped = programs.len() - kept.len(), "pruned programs");
    kept
}

/// Drop programs that do not pass `test` (after an approval). Protected programs always stay.
pub fn prune_programs_that_dont_pass_test(
    executor: &mut Executor,
    test: &str,
    programs: &[String],
    protected: &HashSet<String>,
) -> Vec<String> {
    programs
        .iter()
        .filter(|p| protected.contains(p.as_str()) || executor.passes(p, test))
        .cloned()
        .collect()
}

/// Drop programs that pass `test` (after a rejection). Protected programs always stay.
pub fn prune_programs_that_pass_test(
    executor: &mut Executor,
    test: &str,
    programs: &[String],
    protected: &HashSet<String>,
) -> Vec<String> {
    programs
        .iter()
        .filter(|p| protected.contains(p.as_str()) || !executor.passes(p, test))
        .cloned()
        .collect()
}
