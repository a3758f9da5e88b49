//! Table-driven sandbox.
//!
//! Answers from recorded rules instead of running anything. A run rule matches when the composed
//! source contains both the program and the test text; an evaluation rule matches when the source
//! contains the context and ends by binding the given expression.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::{ErrorKind, Evaluation, Outcome, Sandbox};

#[derive(Debug, Clone)]
struct RunRule {
    program: String,
    test: String,
    outcome: Outcome,
}

#[derive(Debug, Clone)]
struct ValueRule {
    context: String,
    expr: String,
    literal: String,
}

/// Sandbox that replays recorded outcomes.
#[derive(Debug, Clone)]
pub struct TableSandbox {
    runs: Vec<RunRule>,
    values: Vec<ValueRule>,
    fallback: Outcome,
    calls: Arc<AtomicUsize>,
}

impl Default for TableSandbox {
    fn default() -> Self {
        Self::new()
    }
}

impl TableSandbox {
    /// Empty table; unmatched runs fail with a `NameError`.
    pub fn new() -> Self {
        Self {
            runs: Vec::new(),
            values: Vec::new(),
            fallback: Outcome::Error(ErrorKind::Runtime {
                name: "NameError".to_string(),
            }),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Record the outcome of running `test` against `program`. Earlier rules win.
    pub fn with_outcome(mut self, program: impl Into<String>, test: impl Into<String>, outcome: Outcome) -> Self {
        self.runs.push(RunRule {
            program: program.into(),
            test: test.into(),
            outcome,
        });
        self
    }

    /// Record the literal that `expr` evaluates to under `context`.
    pub fn with_value(mut self, context: impl Into<String>, expr: impl Into<String>, literal: impl Into<String>) -> Self {
        self.values.push(ValueRule {
            context: context.into(),
            expr: expr.into(),
            literal: literal.into(),
        });
        self
    }

    /// Outcome for sources no rule matches.
    pub fn with_fallback(mut self, outcome: Outcome) -> Self {
        self.fallback = outcome;
        self
    }

    /// Shared counter of `run` and `evaluate` calls.
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

fn contains_line_block(source: &str, block: &str) -> bool {
    source.contains(&format!("{block}\n"))
}

impl Sandbox for TableSandbox {
    fn run(&mut self, source: &str, _deadline: Duration) -> Outcome {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.runs
            .iter()
            .find(|rule| contains_line_block(source, &rule.program) && contains_line_block(source, &rule.test))
            .map_or_else(|| self.fallback.clone(), |rule| rule.outcome.clone())
    }

    fn evaluate(&mut self, source: &str, _binding: &str, _deadline: Duration) -> Evaluation {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let tail = source.trim_end();
        self.values
            .iter()
            .find(|rule| contains_line_block(source, &rule.context) && tail.ends_with(&format!("= {}", rule.expr)))
            .map_or_else(
                || Evaluation::Failed(self.fallback.clone()),
                |rule| Evaluation::Value(rule.literal.clone()),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEADLINE: Duration = Duration::from_secs(1);

    #[test]
    fn test_run_rules_match_whole_lines() {
        let mut sandbox = TableSandbox::new()
            .with_outcome("def f(x): return x+1", "T", Outcome::Pass)
            .with_outcome("def f(x): return x", "T", Outcome::AssertionFailure);
        assert_eq!(sandbox.run("def f(x): return x\nT\ntest_f()\n", DEADLINE), Outcome::AssertionFailure);
        assert_eq!(sandbox.run("def f(x): return x+1\nT\ntest_f()\n", DEADLINE), Outcome::Pass);
        assert!(matches!(sandbox.run("other\n", DEADLINE), Outcome::Error(_)));
        assert_eq!(sandbox.call_counter().load(Ordering::Relaxed), 3);
    }

    #[test]
    fn test_value_rules() {
        let mut sandbox = TableSandbox::new().with_value("def f(x): return x", "f(1)", "1");
        let found = sandbox.evaluate("def f(x): return x\n_result_ = f(1)\n", "_result_", DEADLINE);
        assert_eq!(found, Evaluation::Value("1".into()));
        let missing = sandbox.evaluate("def f(x): return x\n_result_ = f(2)\n", "_result_", DEADLINE);
        assert!(matches!(missing, Evaluation::Failed(_)));
    }
}
