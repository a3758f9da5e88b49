//! Isolated, time-bounded execution of candidate code.
//!
//! The engine only talks to the [`Sandbox`] capability. [`PythonSandbox`] runs every unit in a fresh
//! interpreter process; [`TableSandbox`] answers from a fixed table and is used to drive the engine
//! without an interpreter (tests, dry runs).
//!
//! ## Modules
//!
//! - `harness` - composes program, test, and invocation into one runnable source
//! - `outcome` - the [`Outcome`] classification
//! - `python` - subprocess-backed implementation
//! - `table` - table-driven implementation

pub mod harness;
mod outcome;
mod python;
mod table;

use std::time::Duration;

pub use outcome::{ErrorKind, Evaluation, Outcome};
pub use python::PythonSandbox;
pub use table::TableSandbox;

/// Capability to run untrusted source under a wall-clock deadline.
///
/// Implementations never panic or return errors for faults inside the executed code: every path,
/// including interpreter crashes, is reported as an [`Outcome`]. A sandbox runs one unit at a time.
pub trait Sandbox: Send {
    /// Run `source` to completion or until `deadline` expires.
    fn run(&mut self, source: &str, deadline: Duration) -> Outcome;

    /// Run `source` and capture the literal spelling of the top-level `binding`.
    fn evaluate(&mut self, source: &str, binding: &str, deadline: Duration) -> Evaluation;
}

impl<S: Sandbox + ?Sized> Sandbox for Box<S> {
    fn run(&mut self, source: &str, deadline: Duration) -> Outcome {
        (**self).run(source, deadline)
    }

    fn evaluate(&mut self, source: &str, binding: &str, deadline: Duration) -> Evaluation {
        (**self).evaluate(source, binding, deadline)
    }
}
