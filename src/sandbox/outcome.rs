//! Classified results of running untrusted code.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Fault category for an [`Outcome::Error`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The composed source could not be compiled (`SyntaxError`, `ValueError`, ...).
    Compile { name: String },
    /// A fault raised while running: `NameError`, `TypeError`, `SystemExit`, ...
    Runtime { name: String },
    /// The interpreter process died, could not be started, or produced no usable report.
    Crash { detail: String },
}

/// Result of running one composed source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Pass,
    AssertionFailure,
    Error(ErrorKind),
    Timeout,
}

impl Outcome {
    pub fn is_pass(&self) -> bool {
        matches!(self, Outcome::Pass)
    }

    pub fn is_assertion_failure(&self) -> bool {
        matches!(self, Outcome::AssertionFailure)
    }

    /// Pass or assertion failure: the test ran to its assertion against this program.
    pub fn is_well_formed(&self) -> bool {
        matches!(self, Outcome::Pass | Outcome::AssertionFailure)
    }

    pub(crate) fn crash(detail: impl Into<String>) -> Self {
        Outcome::Error(ErrorKind::Crash { detail: detail.into() })
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Pass => f.write_str("pass"),
            Outcome::AssertionFailure => f.write_str("assertion failure"),
            Outcome::Error(ErrorKind::Compile { name }) => write!(f, "compile error ({name})"),
            Outcome::Error(ErrorKind::Runtime { name }) => write!(f, "runtime error ({name})"),
            Outcome::Error(ErrorKind::Crash { detail }) => write!(f, "crash: {detail}"),
            Outcome::Timeout => f.write_str("timeout"),
        }
    }
}

/// Result of evaluating a unit for the value of one binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evaluation {
    /// Literal spelling of the bound value (`repr` for text, `str` otherwise).
    Value(String),
    /// The unit did not run to completion.
    Failed(Outcome),
}

impl Evaluation {
    pub fn value(self) -> Option<String> {
        match self {
            Evaluation::Value(literal) => Some(literal),
            Evaluation::Failed(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_formed_outcomes() {
        assert!(Outcome::Pass.is_well_formed());
        assert!(Outcome::AssertionFailure.is_well_formed());
        assert!(!Outcome::Timeout.is_well_formed());
        assert!(!Outcome::crash("boom").is_well_formed());
    }

    #[test]
    fn test_outcome_serialization() {
        let outcome = Outcome::Error(ErrorKind::Runtime {
            name: "NameError".into(),
        });
        let json = serde_json::to_string(&outcome).unwrap();
        assert_eq!(json, r#"{"error":{"runtime":{"name":"NameError"}}}"#);
        assert_eq!(serde_json::from_str::<Outcome>(&json).unwrap(), outcome);
        assert_eq!(serde_json::to_string(&Outcome::Timeout).unwrap(), r#""timeout""#);
    }

    #[test]
    fn test_display() {
        assert_eq!(Outcome::AssertionFailure.to_string(), "assertion failure");
        let outcome = Outcome::Error(ErrorKind::Compile {
            name: "SyntaxError".into(),
        });
        assert_eq!(outcome.to_string(), "compile error (SyntaxError)");
    }
}
