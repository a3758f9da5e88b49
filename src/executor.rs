//! Memoizing front end to a [`Sandbox`].
//!
//! The executor composes run units for one task's entry point, remembers the outcome of every
//! `(program, test)` pair it has seen, and exposes the outcome matrix the rankers and clustering
//! work from. It is not reentrant: every method takes `&mut self`, so at most one unit is in flight.

use std::collections::HashMap;

use crate::config::SandboxConfig;
use crate::sandbox::{Evaluation, Outcome, PythonSandbox, Sandbox, harness};

pub struct Executor {
    sandbox: Box<dyn Sandbox>,
    config: SandboxConfig,
    entry_name: String,
    memo: HashMap<String, HashMap<String, Outcome>>,
}

impl Executor {
    pub fn new(sandbox: impl Sandbox + 'static, config: SandboxConfig, entry_name: impl Into<String>) -> Self {
        Self {
            sandbox: Box::new(sandbox),
            config,
            entry_name: entry_name.into(),
            memo: HashMap::new(),
        }
    }

    /// Executor backed by a [`PythonSandbox`] for `config.interpreter`.
    pub fn python(config: SandboxConfig, entry_name: impl Into<String>) -> std::io::Result<Self> {
        let sandbox = PythonSandbox::new(config.interpreter.clone())?;
        Ok(Self::new(sandbox, config, entry_name))
    }

    pub fn entry_name(&self) -> &str {
        &self.entry_name
    }

    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    /// Number of distinct pairs executed so far.
    pub fn memo_len(&self) -> usize {
        self.memo.values().map(HashMap::len).sum()
    }

    /// Run `test` against `program`. Each distinct pair reaches the sandbox once.
    pub fn execute(&mut self, program: &str, test: &str) -> Outcome {
        if let Some(outcome) = self.memo.get(program).and_then(|row| row.get(test)) {
            return outcome.clone();
        }
        let source = harness::compose_run(program, test, &self.entry_name, &self.config);
        let outcome = self.sandbox.run(&source, self.config.deadline());
        tracing::debug!(entry = %self.entry_name, %outcome, "executed pair");
        self.memo
            .entry(program.to_string())
            .or_default()
            .insert(test.to_string(), outcome.clone());
        outcome
    }

    pub fn passes(&mut self, program: &str, test: &str) -> bool {
        self.execute(program, test).is_pass()
    }

    /// Outcomes of every test against every program.
    pub fn outcomes(&mut self, programs: &[String], tests: &[String]) -> OutcomeMatrix {
        let rows = tests
            .iter()
            .map(|test| programs.iter().map(|program| self.execute(program, test)).collect())
            .collect();
        OutcomeMatrix {
            rows,
            programs: programs.len(),
        }
    }

    /// Evaluate `expr` after `context` and `assignments`, returning its literal spelling.
    ///
    /// Evaluations are not memoized and run under the rewrite deadline.
    pub fn evaluate(&mut self, context: &str, assignments: &[&str], expr: &str) -> Evaluation {
        let source = harness::compose_evaluation(context, assignments, expr, &self.config);
        self.sandbox.evaluate(
            &source,
            candor_core::conventions::RESULT_BINDING,
            self.config.rewrite_deadline(),
        )
    }

    /// Whether `program` passes every held-out validation test.
    pub fn satisfies_validation_tests(&mut self, program: &str, validation: &[String]) -> bool {
        validation.iter().all(|test| self.passes(program, test))
    }
}

/// Outcomes for an ordered test list (rows) against an ordered program list (columns).
#[derive(Debug, Clone, PartialEq)]
pub struct OutcomeMatrix {
    rows: Vec<Vec<Outcome>>,
    programs: usize,
}

impl OutcomeMatrix {
    pub fn num_tests(&self) -> usize {
        self.rows.len()
    }

    pub fn num_programs(&self) -> usize {
        self.programs
    }

    pub fn get(&self, test: usize, program: usize) -> &Outcome {
        &self.rows[test][program]
    }

    /// Outcomes of one test across all programs.
    pub fn test_row(&self, test: usize) -> &[Outcome] {
        &self.rows[test]
    }

    pub fn pass_count(&self, test: usize) -> usize {
        self.rows[test].iter().filter(|o| o.is_pass()).count()
    }

    pub fn assertion_failure_count(&self, test: usize) -> usize {
        self.rows[test].iter().filter(|o| o.is_assertion_failure()).count()
    }

    /// Indices of the tests `program` passes, ascending.
    pub fn passed_tests(&self, program: usize) -> Vec<usize> {
        (0..self.rows.len()).filter(|&t| self.rows[t][program].is_pass()).collect()
    }

    /// Number of tests that fail `program` with an assertion failure.
    pub fn assertion_failures_of(&self, program: usize) -> usize {
        self.rows.iter().filter(|row| row[program].is_assertion_failure()).count()
    }
}
