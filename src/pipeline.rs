//! Per-task synthesis pipeline.
//!
//! Candidates flow through these stages:
//!
//! 1. generate programs (deduplicated, multiplicities kept for scoring)
//! 2. generate tests and count the valid ones
//! 3. normalize and split (skipped for the baseline)
//! 4. dynamic test pruning, then optimistic program pruning
//! 5. deduplicate tests
//! 6. regression rewrites and regression clustering
//! 7. the refinement session
//!
//! The result is a [`SessionRecord`] with one entry per snapshot.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::cluster;
use crate::config::CandorConfig;
use crate::dataset::Task;
use crate::executor::Executor;
use crate::generate::Generator;
use crate::normalize::{self, Normalizer};
use crate::prune;
use crate::refine::{CancellationToken, Oracle, SessionError, SessionInputs, run_session};
use crate::regression::{self, RegressionPolicy};

/// Candidate counts at each stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineStats {
    pub generated_programs: usize,
    pub unique_programs: usize,
    pub generated_tests: usize,
    /// Generated tests that parse (possibly after repair) and assert something.
    pub valid_tests: usize,
    pub normalized_tests: usize,
    pub pruned_programs: usize,
    /// Tests handed to the session.
    pub session_tests: usize,
    pub valid_session_tests: usize,
    /// Distinct rewrites seen by the rare-rewrite policy.
    pub distinct_rewrites: usize,
}

/// Scoring view of one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub num_tests: usize,
    pub num_queries: usize,
    pub num_programs: usize,
    pub num_pos_tests: usize,
    pub num_neg_tests: usize,
    /// Whether each remaining program satisfies the validation tests.
    pub status: Vec<bool>,
    /// How often each remaining program was generated.
    pub weights: Vec<usize>,
}

/// Outcome of one task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub task_id: String,
    /// Why the task produced no session, if it did not.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skipped: Option<String>,
    #[serde(default)]
    pub stats: PipelineStats,
    #[serde(default)]
    pub snapshots: Vec<SnapshotRecord>,
}

impl SessionRecord {
    pub fn skipped(task_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            skipped: Some(reason.into()),
            stats: PipelineStats::default(),
            snapshots: Vec::new(),
        }
    }

    pub fn is_skipped(&self) -> bool {
        self.skipped.is_some()
    }

    /// Fraction of weighted remaining programs that are correct after the last query.
    pub fn final_precision(&self) -> Option<f64> {
        let last = self.snapshots.last()?;
        let total: usize = last.weights.iter().sum();
        if total == 0 {
            return None;
        }
        let correct: usize = last
            .status
            .iter()
            .zip(&last.weights)
            .filter(|(ok, _)| **ok)
            .map(|(_, w)| w)
            .sum();
        Some(correct as f64 / total as f64)
    }
}

/// Run every stage for `task`.
///
/// ## Errors
/// Only cancellation escapes; generation failures produce a skipped record.
#[tracing::instrument(skip_all, fields(task = %task.id))]
pub fn run_task(
    task: &Task,
    executor: &mut Executor,
    generator: &mut dyn Generator,
    oracle: &mut dyn Oracle,
    config: &CandorConfig,
    cancel: &CancellationToken,
) -> Result<SessionRecord, SessionError> {
    let pipeline = &config.pipeline;
    let mut stats = PipelineStats::default();

    let generated = match generator.generate_programs(task) {
        Ok(programs) => programs,
        Err(e) => return Ok(SessionRecord::skipped(&task.id, e.to_string())),
    };
    stats.generated_programs = generated.len();
    let mut programs = cluster::dedupe(&generated);
    stats.unique_programs = programs.len();

    let mut tests = match generator.generate_tests(task, &programs, pipeline.tests_per_task) {
        Ok(tests) => tests,
        Err(e) => return Ok(SessionRecord::skipped(&task.id, e.to_string())),
    };
    stats.generated_tests = tests.len();
    stats.valid_tests = tests.iter().filter(|t| normalize::is_valid_assert_test(t)).count();
    cancel.check()?;

    if !pipeline.baseline {
        tests = Normalizer::new(config.normalize.clone()).normalize_all(&tests);
        stats.normalized_tests = tests.len();
        if pipeline.dynamic_test_pruning {
            tests = prune::prune_tests_that_dont_pass_code(executor, &programs, &tests);
        }
        if pipeline.optimistic_program_pruning && !tests.is_empty() {
            programs = prune::prune_programs_that_dont_pass_any_tests(executor, &programs, &tests);
        }
    }
    stats.pruned_programs = stats.unique_programs - programs.len();
    tests = cluster::dedupe(&tests);
    cancel.check()?;

    if !tests.is_empty() {
        let mut normalizer = Normalizer::new(config.normalize.clone());
        match pipeline.regression {
            RegressionPolicy::Off => {}
            RegressionPolicy::All => {
                tests = regression::assert_rewrite_all(executor, &mut normalizer, &programs, &tests);
            }
            RegressionPolicy::Rare => {
                let (rare, frequencies) =
                    regression::assert_rewrite_rare(executor, &mut normalizer, &programs, &tests, pipeline.top_rare_pct);
                tests = rare;
                stats.distinct_rewrites = frequencies.len();
            }
        }
    }
    if pipeline.cluster_regression_tests && !tests.is_empty() {
        tests = regression::cluster_using_regression_tests(executor, &programs, &tests);
    }
    stats.session_tests = tests.len();
    stats.valid_session_tests = tests.iter().filter(|t| normalize::is_valid_assert_test(t)).count();

    let validation = task.validation_tests();
    let inputs = SessionInputs {
        programs: &programs,
        tests: &tests,
        reference: task.oracle.as_deref(),
        validation: &validation,
    };
    let trace = run_session(executor, oracle, inputs, &config.session, &config.rank, cancel)?;

    let mut multiplicity: HashMap<&str, usize> = HashMap::new();
    for program in &generated {
        *multiplicity.entry(program.as_str()).or_insert(0) += 1;
    }
    let snapshots = trace
        .snapshots()
        .iter()
        .map(|snapshot| SnapshotRecord {
            num_tests: pipeline.tests_per_task,
            num_queries: snapshot.query_count,
            num_programs: snapshot.remaining_programs.len(),
            num_pos_tests: snapshot.approved_tests.len(),
            num_neg_tests: snapshot.rejected_tests.len(),
            status: snapshot
                .remaining_programs
                .iter()
                .map(|p| executor.satisfies_validation_tests(p, &validation))
                .collect(),
            weights: snapshot
                .remaining_programs
                .iter()
                .map(|p| multiplicity.get(p.as_str()).copied().unwrap_or(1))
                .collect(),
        })
        .collect();

    tracing::info!(
        programs = stats.unique_programs,
        tests = stats.session_tests,
        queries = trace.queries(),
        "task finished"
    );
    Ok(SessionRecord {
        task_id: task.id.clone(),
        skipped: None,
        stats,
        snapshots,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PipelineConfig, RankConfig, SandboxConfig};
    use crate::generate::ReplayGenerator;
    use crate::rank::TestRankStrategy;
    use crate::refine::ReferenceOracle;
    use crate::sandbox::{Outcome, TableSandbox};

    const PLUS: &str = "def f(x): return x+1";
    const MINUS: &str = "def f(x): return x-1";
    const TWO: &str = "def test_f():\n    assert f(1) == 2";

    fn task() -> Task {
        Task::new("demo", "f")
            .with_oracle(PLUS)
            .with_programs(vec![PLUS.into(), MINUS.into(), PLUS.into()])
            .with_tests(vec![
                TWO.into(),
                "def test_f():\n    pass".into(),
                format!("{TWO}\n    assert f(2) == 3"),
            ])
            .with_val_tests(vec!["assert f(1) == 2".into()])
    }

    fn executor() -> Executor {
        let sandbox = TableSandbox::new()
            .with_outcome(PLUS, TWO, Outcome::Pass)
            .with_fallback(Outcome::AssertionFailure);
        Executor::new(sandbox, SandboxConfig::default().with_preamble(false), "f")
    }

    fn config() -> CandorConfig {
        CandorConfig::default()
            .with_rank(RankConfig::default().with_tests(Some(TestRankStrategy::FailedCount)))
            .with_pipeline(PipelineConfig::default().with_dynamic_pruning(true, true))
    }

    #[test]
    fn test_task_runs_to_a_record() {
        let record = run_task(
            &task(),
            &mut executor(),
            &mut ReplayGenerator,
            &mut ReferenceOracle::new(PLUS),
            &config(),
            &CancellationToken::new(),
        )
        .unwrap();
        assert!(!record.is_skipped());
        assert_eq!(record.stats.generated_programs, 3);
        assert_eq!(record.stats.unique_programs, 2);
        assert_eq!(record.stats.generated_tests, 3);
        assert_eq!(record.stats.valid_tests, 2);
        // The placeholder test is dropped; the other two normalize to the same test.
        assert_eq!(record.stats.session_tests, 1);

        let first = &record.snapshots[0];
        assert_eq!(first.num_queries, 0);
        assert_eq!(first.status, vec![true, false]);
        assert_eq!(first.weights, vec![2, 1]);

        let last = record.snapshots.last().unwrap();
        assert_eq!(last.num_programs, 1);
        assert_eq!(last.num_pos_tests, 1);
        assert_eq!(record.final_precision(), Some(1.0));
    }

    #[test]
    fn test_missing_candidates_skip_the_task() {
        let record = run_task(
            &Task::new("empty", "f"),
            &mut executor(),
            &mut ReplayGenerator,
            &mut ReferenceOracle::new(PLUS),
            &config(),
            &CancellationToken::new(),
        )
        .unwrap();
        assert!(record.is_skipped());
        assert!(record.snapshots.is_empty());
    }
}
