//! Subprocess-backed sandbox.
//!
//! Every unit runs in a fresh `python3 -I` process driven by a small embedded script. The script
//! reads `{source, binding}` as JSON on stdin, executes the source with console output redirected,
//! and prints exactly one report line to the real stdout before exiting. The deadline covers
//! interpreter start-up; on expiry the child is killed.

use std::process::{Output, Stdio};
use std::time::Duration;

use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::runtime::{Builder, Runtime};

use super::{ErrorKind, Evaluation, Outcome, Sandbox};

const REPORT_MARKER: &str = "__candor_report__";

const DRIVER: &str = r#"
import contextlib, io, json, os, sys

def report(payload):
    sys.__stdout__.write("__candor_report__ " + json.dumps(payload) + "\n")
    sys.__stdout__.flush()
    os._exit(0)

request = json.loads(sys.stdin.read())
try:
    code = compile(request["source"], "<candidate>", "exec")
except (SyntaxError, ValueError, OverflowError) as e:
    report({"status": "compile_error", "name": type(e).__name__})

namespace = {"__name__": "__candidate__"}
sink = io.StringIO()
try:
    with contextlib.redirect_stdout(sink), contextlib.redirect_stderr(sink):
        exec(code, namespace)
except AssertionError:
    report({"status": "assertion_failure"})
except BaseException as e:
    report({"status": "runtime_error", "name": type(e).__name__})

binding = request.get("binding")
if binding is None:
    report({"status": "pass"})
try:
    value = namespace[binding]
    literal = repr(value) if isinstance(value, str) else str(value)
except BaseException as e:
    report({"status": "runtime_error", "name": type(e).__name__})
report({"status": "value", "literal": literal})
"#;

#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum Report {
    Pass,
    AssertionFailure,
    CompileError { name: String },
    RuntimeError { name: String },
    Value { literal: String },
}

impl From<Report> for Outcome {
    fn from(report: Report) -> Self {
        match report {
            Report::Pass | Report::Value { .. } => Outcome::Pass,
            Report::AssertionFailure => Outcome::AssertionFailure,
            Report::CompileError { name } => Outcome::Error(ErrorKind::Compile { name }),
            Report::RuntimeError { name } => Outcome::Error(ErrorKind::Runtime { name }),
        }
    }
}

/// Sandbox that runs each unit in a fresh interpreter process.
pub struct PythonSandbox {
    interpreter: String,
    runtime: Runtime,
}

impl PythonSandbox {
    /// Create a sandbox for `interpreter` (a program name on `PATH` or a path).
    ///
    /// ## Errors
    /// Fails only if the private I/O runtime cannot be built. A missing interpreter is not detected
    /// here; it shows up as [`ErrorKind::Crash`] on the first run.
    pub fn new(interpreter: impl Into<String>) -> std::io::Result<Self> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        Ok(Self {
            interpreter: interpreter.into(),
            runtime,
        })
    }

    pub fn interpreter(&self) -> &str {
        &self.interpreter
    }

    fn execute(&mut self, source: &str, binding: Option<&str>, deadline: Duration) -> Result<Report, Outcome> {
        let payload = serde_json::json!({ "source": source, "binding": binding }).to_string();
        let interpreter = self.interpreter.clone();
        self.runtime
            .block_on(run_driver(interpreter, payload.into_bytes(), deadline))
    }
}

impl Sandbox for PythonSandbox {
    #[tracing::instrument(skip_all, fields(source_len = source.len()))]
    fn run(&mut self, source: &str, deadline: Duration) -> Outcome {
        match self.execute(source, None, deadline) {
            Ok(report) => report.into(),
            Err(outcome) => outcome,
        }
    }

    #[tracing::instrument(skip_all, fields(source_len = source.len(), binding = %binding))]
    fn evaluate(&mut self, source: &str, binding: &str, deadline: Duration) -> Evaluation {
        match self.execute(source, Some(binding), deadline) {
            Ok(Report::Value { literal }) => Evaluation::Value(literal),
            Ok(report) => Evaluation::Failed(report.into()),
            Err(outcome) => Evaluation::Failed(outcome),
        }
    }
}

async fn run_driver(interpreter: String, payload: Vec<u8>, deadline: Duration) -> Result<Report, Outcome> {
    let mut child = Command::new(&interpreter)
        .arg("-I")
        .arg("-c")
        .arg(DRIVER)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| Outcome::crash(format!("failed to start `{interpreter}`: {e}")))?;

    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| Outcome::crash("interpreter stdin unavailable"))?;

    // Dropping this future on timeout drops the child, which kills it.
    let exchange = async move {
        // A child that dies before reading its request is reported from its exit status below.
        let _ = stdin.write_all(&payload).await;
        drop(stdin);
        child.wait_with_output().await
    };

    match tokio::time::timeout(deadline, exchange).await {
        Err(_) => {
            tracing::debug!(?deadline, "sandbox deadline expired");
            Err(Outcome::Timeout)
        }
        Ok(Err(e)) => Err(Outcome::crash(format!("sandbox i/o failed: {e}"))),
        Ok(Ok(output)) => parse_report(&output),
    }
}

fn parse_report(output: &Output) -> Result<Report, Outcome> {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let line = stdout.lines().rev().find_map(|line| line.strip_prefix(REPORT_MARKER));
    match line {
        Some(json) => {
            serde_json::from_str(json.trim()).map_err(|e| Outcome::crash(format!("malformed sandbox report: {e}")))
        }
        None => Err(Outcome::crash(match output.status.code() {
            Some(code) => format!("interpreter exited with status {code} without a report"),
            None => "interpreter terminated by signal".to_string(),
        })),
    }
}
