//! Sources of candidate programs and tests.
//!
//! The engine never talks to a model directly: it asks a [`Generator`]. [`ReplayGenerator`] serves
//! candidates recorded in the task file; [`BudgetedGenerator`] and [`CachedGenerator`] wrap any
//! generator with a shared token budget and a persistent response cache.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::dataset::Task;
use crate::limiter::{BudgetError, TokenBudget};

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error(transparent)]
    Budget(#[from] BudgetError),
    #[error("no candidates available for task {task}: {reason}")]
    Unavailable { task: String, reason: String },
    #[error("response cache {path}: {message}")]
    Cache { path: PathBuf, message: String },
}

/// Produces candidate programs and tests for a task.
pub trait Generator: Send {
    fn generate_programs(&mut self, task: &Task) -> Result<Vec<String>, GenerateError>;

    /// Up to `n` candidate tests, optionally conditioned on sample programs.
    fn generate_tests(&mut self, task: &Task, samples: &[String], n: usize) -> Result<Vec<String>, GenerateError>;
}

impl<G: Generator + ?Sized> Generator for Box<G> {
    fn generate_programs(&mut self, task: &Task) -> Result<Vec<String>, GenerateError> {
        (**self).generate_programs(task)
    }

    fn generate_tests(&mut self, task: &Task, samples: &[String], n: usize) -> Result<Vec<String>, GenerateError> {
        (**self).generate_tests(task, samples, n)
    }
}

/// Serves the candidates recorded with each task.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplayGenerator;

impl Generator for ReplayGenerator {
    fn generate_programs(&mut self, task: &Task) -> Result<Vec<String>, GenerateError> {
        if task.programs.is_empty() {
            return Err(GenerateError::Unavailable {
                task: task.id.clone(),
                reason: "no recorded programs".into(),
            });
        }
        Ok(task.programs.clone())
    }

    fn generate_tests(&mut self, task: &Task, _samples: &[String], n: usize) -> Result<Vec<String>, GenerateError> {
        Ok(task.tests.iter().take(n).cloned().collect())
    }
}

/// Reserves an estimate of each request's tokens from a shared budget before delegating.
pub struct BudgetedGenerator<G> {
    inner: G,
    budget: Arc<TokenBudget>,
    completion_tokens: u64,
}

impl<G: Generator> BudgetedGenerator<G> {
    pub fn new(inner: G, budget: Arc<TokenBudget>, completion_tokens: u64) -> Self {
        Self {
            inner,
            budget,
            completion_tokens,
        }
    }

    /// Roughly four characters per prompt token, plus the completion allowance per candidate.
    fn estimate(&self, prompt_chars: usize, candidates: usize) -> u64 {
        (prompt_chars / 4) as u64 + candidates.max(1) as u64 * self.completion_tokens
    }
}

impl<G: Generator> Generator for BudgetedGenerator<G> {
    fn generate_programs(&mut self, task: &Task) -> Result<Vec<String>, GenerateError> {
        self.budget.reserve(self.estimate(task.prompt.len(), 1))?;
        self.inner.generate_programs(task)
    }

    fn generate_tests(&mut self, task: &Task, samples: &[String], n: usize) -> Result<Vec<String>, GenerateError> {
        let prompt_chars = task.prompt.len() + samples.iter().map(String::len).sum::<usize>();
        self.budget.reserve(self.estimate(prompt_chars, n))?;
        self.inner.generate_tests(task, samples, n)
    }
}

/// Responses keyed by a digest of the request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseCache {
    entries: BTreeMap<String, Vec<String>>,
}

impl ResponseCache {
    /// Load a cache file; a missing file is an empty cache.
    pub fn load(path: &Path) -> Result<Self, GenerateError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(cache_error(path, e)),
        };
        serde_json::from_str(&text).map_err(|e| cache_error(path, e))
    }

    pub fn save(&self, path: &Path) -> Result<(), GenerateError> {
        let text = serde_json::to_string_pretty(self).map_err(|e| cache_error(path, e))?;
        std::fs::write(path, text).map_err(|e| cache_error(path, e))
    }

    /// Digest of a request: its kind, entry point, prompt, extra context and count.
    pub fn key(kind: &str, task: &Task, context: &[String], n: usize) -> String {
        let mut h = Sha256::new();
        h.update(kind.as_bytes());
        h.update(b"\n");
        h.update(task.func_name.as_bytes());
        h.update(b"\n");
        h.update(task.prompt.as_bytes());
        for item in context {
            h.update(b"\n");
            h.update(item.as_bytes());
        }
        h.update(b"\n");
        h.update(n.to_le_bytes());
        format!("{:x}", h.finalize())
    }

    pub fn get(&self, key: &str) -> Option<&Vec<String>> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: String, response: Vec<String>) {
        self.entries.insert(key, response);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn cache_error(path: &Path, e: impl std::fmt::Display) -> GenerateError {
    GenerateError::Cache {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}

/// Answers repeated requests from a shared [`ResponseCache`].
pub struct CachedGenerator<G> {
    inner: G,
    cache: Arc<Mutex<ResponseCache>>,
}

impl<G: Generator> CachedGenerator<G> {
    pub fn new(inner: G, cache: Arc<Mutex<ResponseCache>>) -> Self {
        Self { inner, cache }
    }

    fn cached(
        &mut self,
        key: String,
        fetch: impl FnOnce(&mut G) -> Result<Vec<String>, GenerateError>,
    ) -> Result<Vec<String>, GenerateError> {
        if let Some(hit) = self.cache.lock().unwrap_or_else(|e| e.into_inner()).get(&key) {
            tracing::debug!(%key, "response cache hit");
            return Ok(hit.clone());
        }
        let response = fetch(&mut self.inner)?;
        self.cache
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key, response.clone());
        Ok(response)
    }
}

impl<G: Generator> Generator for CachedGenerator<G> {
    fn generate_programs(&mut self, task: &Task) -> Result<Vec<String>, GenerateError> {
        let key = ResponseCache::key("programs", task, &[], 0);
        self.cached(key, |inner| inner.generate_programs(task))
    }

    fn generate_tests(&mut self, task: &Task, samples: &[String], n: usize) -> Result<Vec<String>, GenerateError> {
        let key = ResponseCache::key("tests", task, samples, n);
        self.cached(key, |inner| inner.generate_tests(task, samples, n))
    }
}
