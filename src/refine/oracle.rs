use std::io::{BufRead, Write};

use super::SessionError;
use crate::executor::Executor;
use crate::sandbox::Outcome;

/// Answer to "is this test right?".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Approve,
    Reject,
    Skip,
}

/// Something that judges candidate tests: a person or a reference program.
pub trait Oracle {
    /// ## Errors
    /// Returns [`SessionError::Cancelled`] when the oracle can no longer answer.
    fn verdict(&mut self, test: &str, executor: &mut Executor) -> Result<Verdict, SessionError>;

    /// Automatic oracles have the hidden validation tests at hand, so the loop may protect programs
    /// that satisfy them.
    fn is_automatic(&self) -> bool {
        false
    }
}

/// What the reference program says about `test`: pass approves, an assertion failure rejects,
/// anything else is skipped.
pub fn reference_verdict(executor: &mut Executor, reference: &str, test: &str) -> Verdict {
    match executor.execute(reference, test) {
        Outcome::Pass => Verdict::Approve,
        Outcome::AssertionFailure => Verdict::Reject,
        _ => Verdict::Skip,
    }
}

/// Oracle answering from a known-correct program.
#[derive(Debug, Clone)]
pub struct ReferenceOracle {
    reference: String,
}

impl ReferenceOracle {
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
        }
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }
}

impl Oracle for ReferenceOracle {
    fn verdict(&mut self, test: &str, executor: &mut Executor) -> Result<Verdict, SessionError> {
        let verdict = reference_verdict(executor, &self.reference, test);
        tracing::debug!(?verdict, "reference verdict");
        Ok(verdict)
    }

    fn is_automatic(&self) -> bool {
        true
    }
}

/// Oracle that shows each test to a person and reads `y`, `n` or an empty line (skip).
///
/// End of input or `q` cancels the session.
pub struct InteractiveOracle<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> InteractiveOracle<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn prompt(&mut self, test: &str) -> std::io::Result<()> {
        writeln!(self.output, "Test **\n{test}")?;
        write!(self.output, "Do you approve this test? (y/n) Press enter to skip: ")?;
        self.output.flush()
    }
}

impl<R: BufRead, W: Write> Oracle for InteractiveOracle<R, W> {
    fn verdict(&mut self, test: &str, _executor: &mut Executor) -> Result<Verdict, SessionError> {
        loop {
            self.prompt(test)
                .map_err(|e| SessionError::Cancelled(format!("failed to prompt: {e}")))?;
            let mut line = String::new();
            let read = self
                .input
                .read_line(&mut line)
                .map_err(|e| SessionError::Cancelled(format!("failed to read answer: {e}")))?;
            if read == 0 {
                return Err(SessionError::Cancelled("end of input".to_string()));
            }
            match line.trim().to_ascii_lowercase().as_str() {
                "y" | "yes" => return Ok(Verdict::Approve),
                "n" | "no" => return Ok(Verdict::Reject),
                "" => return Ok(Verdict::Skip),
                "q" | "quit" => return Err(SessionError::Cancelled("quit by user".to_string())),
                other => {
                    let _ = writeln!(self.output, "unrecognized answer '{other}'");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::config::SandboxConfig;
    use crate::sandbox::TableSandbox;

    fn executor() -> Executor {
        let sandbox = TableSandbox::new()
            .with_outcome("ref", "good", Outcome::Pass)
            .with_outcome("ref", "bad", Outcome::AssertionFailure);
        Executor::new(sandbox, SandboxConfig::default().with_preamble(false), "f")
    }

    #[test]
    fn test_reference_oracle_verdicts() {
        let mut exec = executor();
        let mut oracle = ReferenceOracle::new("ref");
        assert!(oracle.is_automatic());
        assert_eq!(oracle.verdict("good", &mut exec), Ok(Verdict::Approve));
        assert_eq!(oracle.verdict("bad", &mut exec), Ok(Verdict::Reject));
        assert_eq!(oracle.verdict("broken", &mut exec), Ok(Verdict::Skip));
    }

    #[test]
    fn test_interactive_answers() {
        let mut exec = executor();
        let input = Cursor::new("y\nmaybe\nn\n\nq\n");
        let mut output = Vec::new();
        let mut oracle = InteractiveOracle::new(input, &mut output);
        assert!(!oracle.is_automatic());
        assert_eq!(oracle.verdict("t", &mut exec), Ok(Verdict::Approve));
        assert_eq!(oracle.verdict("t", &mut exec), Ok(Verdict::Reject));
        assert_eq!(oracle.verdict("t", &mut exec), Ok(Verdict::Skip));
        assert!(matches!(oracle.verdict("t", &mut exec), Err(SessionError::Cancelled(_))));
        assert!(matches!(oracle.verdict("t", &mut exec), Err(SessionError::Cancelled(_))));
        drop(oracle);
        let shown = String::from_utf8(output).unwrap();
        assert!(shown.contains("unrecognized answer 'maybe'"));
        assert!(shown.starts_with("Test **\nt\n"));
    }
}
