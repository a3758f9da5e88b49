//! Assertion rewriting: turn a guessed expected value into the value a program actually produces.
//!
//! Only one closed shape is rewritten: an `assert` whose test is a single comparison
//! `<left> <op> <expected>` with `op` in `==`, `!=`, `is`, `is not`, `<`, `>`, inside a test
//! procedure. The left-hand side is evaluated against the context program (with any bare-name call
//! arguments bound by earlier assignments spliced in front), the captured literal is parsed and
//! printed canonically, and only the span of that assert statement is replaced. Ordering
//! comparisons become `==` against the captured value. Anything else, including every evaluation
//! fault, leaves the assertion exactly as it was.

use std::collections::HashMap;

use candor_core::lang::conventions::is_test_procedure;
use candor_core::lang::operators;
use candor_syntax::SyntaxError;
use candor_syntax::ast::{Arg, CmpOp, Expr, Span, Spanned, Stmt};
use candor_syntax::{parse_expression, parse_source, unparse_expr};

use crate::executor::Executor;
use crate::sandbox::Evaluation;

/// A rewritten test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub text: String,
    /// Assertions whose expected value was concretized (including ones already correct).
    pub rewritten: usize,
}

/// Rewrite every supported assertion of `test` against `context`.
///
/// ## Errors
/// Returns the parse errors if `test` does not parse. Evaluation faults are not errors.
#[tracing::instrument(skip_all, fields(test_len = test.len()))]
pub fn rewrite(executor: &mut Executor, context: &str, test: &str) -> Result<Rewrite, Vec<SyntaxError>> {
    let module = parse_source(test)?;
    let prefix = executor.config().test_prefix.clone();
    let mut rewriter = Rewriter {
        executor,
        context,
        source: test,
        assignments: HashMap::new(),
        edits: Vec::new(),
        rewritten: 0,
    };
    rewriter.procedures(&module.body, &prefix);

    let Rewriter { edits, rewritten, .. } = rewriter;
    let mut text = test.to_string();
    for (span, replacement) in edits.into_iter().rev() {
        text.replace_range(span.start..span.end, &replacement);
    }
    Ok(Rewrite { text, rewritten })
}

struct Rewriter<'a> {
    executor: &'a mut Executor,
    context: &'a str,
    source: &'a str,
    /// Latest assignment statement text per bound name, in visit order.
    assignments: HashMap<String, &'a str>,
    /// Non-overlapping replacements in source order.
    edits: Vec<(Span, String)>,
    rewritten: usize,
}

impl<'a> Rewriter<'a> {
    /// Visit the test procedures among `body`, including methods of (nested) classes.
    fn procedures(&mut self, body: &'a [Spanned<Stmt>], prefix: &str) {
        for stmt in body {
            match &stmt.node {
                Stmt::FunctionDef(def) if is_test_procedure(&def.name, prefix) => {
                    self.assignments.clear();
                    self.block(&def.body);
                }
                Stmt::ClassDef(class) => self.procedures(&class.body, prefix),
                _ => {}
            }
        }
    }

    fn block(&mut self, body: &'a [Spanned<Stmt>]) {
        for stmt in body {
            self.stmt(stmt);
        }
    }

    fn stmt(&mut self, stmt: &'a Spanned<Stmt>) {
        match &stmt.node {
            Stmt::Assign { targets, .. } => {
                let text = stmt.span.text(self.source);
                for target in targets {
                    if let Expr::Name(name) = &target.node {
                        self.assignments.insert(name.clone(), text);
                    }
                }
            }
            Stmt::Assert { test, msg } => self.assertion(stmt.span, test, msg.as_ref()),
            Stmt::If { body, orelse, .. } | Stmt::While { body, orelse, .. } | Stmt::For { body, orelse, .. } => {
                self.block(body);
                self.block(orelse);
            }
            Stmt::With { body, .. } => self.block(body),
            Stmt::Try {
                body,
                handlers,
                orelse,
                finalbody,
            } => {
                self.block(body);
                for handler in handlers {
                    self.block(&handler.body);
                }
                self.block(orelse);
                self.block(finalbody);
            }
            _ => {}
        }
    }

    fn assertion(&mut self, span: Span, test: &'a Spanned<Expr>, msg: Option<&'a Spanned<Expr>>) {
        let Expr::Compare { left, ops, comparators } = test.node.unparenthesized() else {
            return;
        };
        let ([op], [expected]) = (ops.as_slice(), comparators.as_slice()) else {
            return;
        };
        if !operators::is_rewritable_comparison(op.as_str()) {
            return;
        }

        let left_text = left.span.text(self.source);
        let spliced = self.spliced_assignments(&left.node);
        let literal = match self.executor.evaluate(self.context, &spliced, left_text) {
            Evaluation::Value(literal) => literal,
            Evaluation::Failed(outcome) => {
                tracing::debug!(%outcome, left = left_text, "left-hand side did not evaluate");
                return;
            }
        };
        let Ok(value) = parse_expression(&literal) else {
            tracing::debug!(%literal, "captured value is not a literal");
            return;
        };
        let canonical = unparse_expr(&value.node);
        self.rewritten += 1;

        let new_op = match op {
            CmpOp::Lt | CmpOp::Gt => CmpOp::Eq,
            other => *other,
        };
        if new_op == *op && unparse_expr(&expected.node) == canonical {
            return;
        }
        let mut replacement = format!("assert {left_text} {new_op} {canonical}");
        if let Some(msg) = msg {
            replacement.push_str(", ");
            replacement.push_str(msg.span.text(self.source));
        }
        tracing::debug!(%replacement, "rewrote assertion");
        self.edits.push((span, replacement));
    }

    /// Assignments binding the bare-name positional arguments of a top-level call.
    fn spliced_assignments(&self, left: &Expr) -> Vec<&'a str> {
        let Expr::Call { args, .. } = left.unparenthesized() else {
            return Vec::new();
        };
        let mut spliced: Vec<&'a str> = Vec::new();
        for arg in args {
            if let Arg::Positional(value) = arg {
                if let Some(text) = value.node.as_name().and_then(|name| self.assignments.get(name)) {
                    if !spliced.contains(text) {
                        spliced.push(*text);
                    }
                }
            }
        }
        spliced
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SandboxConfig;
    use crate::sandbox::TableSandbox;

    const REVERSE: &str = "def f(x): return list(reversed(x))";

    fn executor(sandbox: TableSandbox) -> Executor {
        Executor::new(sandbox, SandboxConfig::default(), "f")
    }

    fn rewrite_with(sandbox: TableSandbox, test: &str) -> Rewrite {
        rewrite(&mut executor(sandbox), REVERSE, test).unwrap()
    }

    #[test]
    fn test_expected_value_is_concretized() {
        let sandbox = TableSandbox::new().with_value(REVERSE, "f([0,1,2])", "[2, 1, 0]");
        let out = rewrite_with(sandbox, "def test_f(): assert f([0,1,2]) == [9,9,9]");
        insta::assert_snapshot!(out.text, @"def test_f(): assert f([0,1,2]) == [2, 1, 0]");
        assert_eq!(out.rewritten, 1);
    }

    #[test]
    fn test_rewrite_is_idempotent() {
        let sandbox = TableSandbox::new().with_value(REVERSE, "f([0,1,2])", "[2, 1, 0]");
        let mut exec = executor(sandbox);
        let once = rewrite(&mut exec, REVERSE, "def test_f():\n    assert f([0,1,2]) == [9,9,9]\n").unwrap();
        let twice = rewrite(&mut exec, REVERSE, &once.text).unwrap();
        assert_eq!(once.text, twice.text);
        // Correct but differently spaced expectations are left byte for byte.
        let spaced = "def test_f():\n    assert (f([0,1,2]) == [2,1,0])\n";
        assert_eq!(rewrite(&mut exec, REVERSE, spaced).unwrap().text, spaced);
    }

    #[test]
    fn test_ordering_becomes_equality_and_parens_drop() {
        let sandbox = TableSandbox::new().with_value(REVERSE, "len(f([1]))", "1");
        let out = rewrite_with(sandbox, "def test_f():\n    assert (len(f([1])) > 5), 'too short'\n");
        assert_eq!(out.text, "def test_f():\n    assert len(f([1])) == 1, 'too short'\n");
    }

    #[test]
    fn test_other_operators_are_kept() {
        let sandbox = TableSandbox::new().with_value(REVERSE, "f([])", "[]");
        let out = rewrite_with(sandbox, "def test_f():\n    assert f([]) is not None\n");
        assert_eq!(out.text, "def test_f():\n    assert f([]) is not []\n");
    }

    #[test]
    fn test_text_values_are_quoted() {
        let sandbox = TableSandbox::new().with_value(REVERSE, "g('ab')", "'ba'");
        let out = rewrite_with(sandbox, "def test_g():\n    assert g('ab') != 'x'\n");
        assert_eq!(out.text, "def test_g():\n    assert g('ab') != 'ba'\n");
    }

    #[test]
    fn test_local_assignments_are_spliced() {
        let sandbox = TableSandbox::new().with_value("xs = [5, 6]", "f(xs)", "[6, 5]");
        let test = "def test_f():\n    xs = [5, 6]\n    n = 2\n    assert f(xs) == [1]\n";
        let out = rewrite_with(sandbox, test);
        assert_eq!(out.text, "def test_f():\n    xs = [5, 6]\n    n = 2\n    assert f(xs) == [6, 5]\n");
    }

    #[test]
    fn test_faults_leave_assertion_unchanged() {
        let test = "def test_f():\n    assert f(undefined) == 1\n";
        let out = rewrite_with(TableSandbox::new(), test);
        assert_eq!(out.text, test);
        assert_eq!(out.rewritten, 0);
    }

    #[test]
    fn test_unparseable_values_are_abandoned() {
        let sandbox = TableSandbox::new().with_value(REVERSE, "f(1)", "<object at 0x10>");
        let test = "def test_f():\n    assert f(1) == 1\n";
        assert_eq!(rewrite_with(sandbox, test).text, test);
    }

    #[test]
    fn test_unsupported_shapes_are_untouched() {
        let sandbox = TableSandbox::new()
            .with_value(REVERSE, "f(1)", "7")
            .with_value(REVERSE, "0", "0");
        let test = "def test_f():\n    assert 0 < f(1) < 3\n    assert f(1) == 1 and f(1)\n    assert f(1) in [1]\n    assert f(1) <= 2\n";
        assert_eq!(rewrite_with(sandbox, test).text, test);
    }

    #[test]
    fn test_only_test_procedures_are_rewritten() {
        let sandbox = TableSandbox::new().with_value(REVERSE, "f(1)", "7");
        let test = "def check(candidate):\n    assert f(1) == 1\n\ndef test_f():\n    if True:\n        assert f(1) == 1\n";
        let out = rewrite_with(sandbox, test);
        assert_eq!(
            out.text,
            "def check(candidate):\n    assert f(1) == 1\n\ndef test_f():\n    if True:\n        assert f(1) == 7\n"
        );
    }

    #[test]
    fn test_class_methods_are_rewritten() {
        let sandbox = TableSandbox::new().with_value(REVERSE, "f([0,1,2])", "[2, 1, 0]");
        let test = "class TestF:\n    def helper(self):\n        assert f([0,1,2]) == [9]\n\n    def test_f(self):\n        assert f([0,1,2]) == [9,9,9]\n";
        let out = rewrite_with(sandbox, test);
        assert_eq!(
            out.text,
            "class TestF:\n    def helper(self):\n        assert f([0,1,2]) == [9]\n\n    def test_f(self):\n        assert f([0,1,2]) == [2, 1, 0]\n"
        );
        assert_eq!(out.rewritten, 1);
    }

    #[test]
    fn test_unparseable_test_is_error() {
        assert!(rewrite(&mut executor(TableSandbox::new()), REVERSE, "def test_f(:\n").is_err());
    }
}
