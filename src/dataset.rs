//! Task files.
//!
//! A task file is either a JSON array of tasks or JSON Lines (one task per non-blank line):
//!
//! ```json
//! {"id": "HumanEval/0", "func_name": "f", "oracle": "def f(x): ...",
//!  "val_tests": ["assert f(1) == 2"], "programs": ["def f(x): ..."], "tests": ["def test_f(): ..."]}
//! ```
//!
//! `programs` and `tests` are the recorded candidates a replay generator serves. Validation tests
//! that are bare statements are wrapped into a test procedure for the entry point.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("failed to read tasks from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid task on line {line}: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid task {id}: {reason}")]
    Invalid { id: String, reason: String },
}

/// One synthesis problem with its recorded candidates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Defaults to the task's position in the file.
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub prompt: String,
    /// Entry point the tests exercise.
    pub func_name: String,
    /// Known-correct program, if the task has one.
    #[serde(default)]
    pub oracle: Option<String>,
    #[serde(default)]
    pub val_tests: Vec<String>,
    #[serde(default)]
    pub programs: Vec<String>,
    #[serde(default)]
    pub tests: Vec<String>,
}

impl Task {
    pub fn new(id: impl Into<String>, func_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            func_name: func_name.into(),
            ..Self::default()
        }
    }

    pub fn with_oracle(mut self, oracle: impl Into<String>) -> Self {
        self.oracle = Some(oracle.into());
        self
    }

    pub fn with_programs(mut self, programs: Vec<String>) -> Self {
        self.programs = programs;
        self
    }

    pub fn with_tests(mut self, tests: Vec<String>) -> Self {
        self.tests = tests;
        self
    }

    pub fn with_val_tests(mut self, val_tests: Vec<String>) -> Self {
        self.val_tests = val_tests;
        self
    }

    /// Validation tests as runnable test procedures.
    pub fn validation_tests(&self) -> Vec<String> {
        self.val_tests
            .iter()
            .map(|body| wrap_validation_test(&self.func_name, body))
            .collect()
    }

    fn validate(&self) -> Result<(), TaskError> {
        if self.func_name.trim().is_empty() {
            return Err(TaskError::Invalid {
                id: self.id.clone(),
                reason: "func_name must not be empty".into(),
            });
        }
        Ok(())
    }
}

/// Wrap a bare validation statement into `def test_<func>():`.
pub fn wrap_validation_test(func_name: &str, body: &str) -> String {
    if body.trim_start().starts_with("def ") {
        return body.to_string();
    }
    let indented: Vec<String> = body.lines().map(|line| format!("    {line}")).collect();
    format!(
        "def {}():\n{}",
        candor_core::conventions::test_procedure_name(func_name),
        indented.join("\n")
    )
}

/// Parse tasks from JSON array or JSON Lines text.
pub fn parse_tasks(text: &str) -> Result<Vec<Task>, TaskError> {
    let mut tasks: Vec<Task> = if text.trim_start().starts_with('[') {
        serde_json::from_str(text).map_err(|source| TaskError::Json {
            line: source.line(),
            source,
        })?
    } else {
        text.lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(i, line)| serde_json::from_str(line).map_err(|source| TaskError::Json { line: i + 1, source }))
            .collect::<Result<_, _>>()?
    };
    for (index, task) in tasks.iter_mut().enumerate() {
        if task.id.is_empty() {
            task.id = index.to_string();
        }
        task.validate()?;
    }
    Ok(tasks)
}

/// Load a task file.
pub fn load_tasks(path: &Path) -> Result<Vec<Task>, TaskError> {
    let text = std::fs::read_to_string(path).map_err(|source| TaskError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let tasks = parse_tasks(&text)?;
    tracing::info!(path = %path.display(), tasks = tasks.len(), "loaded tasks");
    Ok(tasks)
}
