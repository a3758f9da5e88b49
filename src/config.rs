//! Engine configuration.
//!
//! One immutable [`CandorConfig`] value is threaded through every component. Each section has
//! serde per-field defaults, so a JSON config file only needs the keys it changes; CLI flags are
//! applied on top through the `with_*` builders.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::normalize::AssertionChoice;
use crate::rank::{CodeRankStrategy, TestRankStrategy};
use crate::regression::RegressionPolicy;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Aggregate configuration for a refinement run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CandorConfig {
    pub sandbox: SandboxConfig,
    pub normalize: NormalizeConfig,
    pub rank: RankConfig,
    pub session: SessionConfig,
    pub pipeline: PipelineConfig,
}

impl CandorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a JSON config file. Missing keys take their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings no run can honor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sandbox.deadline_ms == 0 || self.sandbox.rewrite_deadline_ms == 0 {
            return Err(ConfigError::Invalid("sandbox deadlines must be positive".into()));
        }
        if self.sandbox.interpreter.trim().is_empty() {
            return Err(ConfigError::Invalid("sandbox interpreter must not be empty".into()));
        }
        if self.pipeline.jobs == 0 {
            return Err(ConfigError::Invalid("jobs must be at least 1".into()));
        }
        if !(0.0..=100.0).contains(&self.pipeline.top_rare_pct) {
            return Err(ConfigError::Invalid(format!(
                "top_rare_pct must be within 0..=100, got {}",
                self.pipeline.top_rare_pct
            )));
        }
        if self.pipeline.token_window_secs == 0 {
            return Err(ConfigError::Invalid("token window must be positive".into()));
        }
        let per_request = (self.pipeline.tests_per_task.max(1) as u64).saturating_mul(self.pipeline.completion_tokens);
        if per_request > self.pipeline.token_limit {
            return Err(ConfigError::Invalid(format!(
                "one test request reserves {per_request} tokens ({} tests x {} completion tokens), over the token limit of {}",
                self.pipeline.tests_per_task, self.pipeline.completion_tokens, self.pipeline.token_limit
            )));
        }
        Ok(())
    }

    pub fn with_sandbox(mut self, sandbox: SandboxConfig) -> Self {
        self.sandbox = sandbox;
        self
    }

    pub fn with_normalize(mut self, normalize: NormalizeConfig) -> Self {
        self.normalize = normalize;
        self
    }

    pub fn with_rank(mut self, rank: RankConfig) -> Self {
        self.rank = rank;
        self
    }

    pub fn with_session(mut self, session: SessionConfig) -> Self {
        self.session = session;
        self
    }

    pub fn with_pipeline(mut self, pipeline: PipelineConfig) -> Self {
        self.pipeline = pipeline;
        self
    }

    /// Use one seed for every randomized component.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.normalize.seed = seed;
        self.rank.seed = seed;
        self
    }
}

// ============================================================================
// Sections
// ============================================================================

/// How candidate code is executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    /// Interpreter used by the subprocess sandbox.
    pub interpreter: String,
    /// Wall-clock bound for one program/test run.
    pub deadline_ms: u64,
    /// Wall-clock bound for one assertion evaluation.
    pub rewrite_deadline_ms: u64,
    /// Prefix marking test procedures.
    pub test_prefix: String,
    /// Call `check(<entry>)` for tests written against the check protocol.
    pub check_protocol: bool,
    /// Prepend the standard-library preamble to composed sources.
    pub include_preamble: bool,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            interpreter: "python3".to_string(),
            deadline_ms: 1000,
            rewrite_deadline_ms: 1000,
            test_prefix: candor_core::conventions::TEST_PREFIX.to_string(),
            check_protocol: true,
            include_preamble: true,
        }
    }
}

impl SandboxConfig {
    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }

    pub fn rewrite_deadline(&self) -> Duration {
        Duration::from_millis(self.rewrite_deadline_ms)
    }

    pub fn with_interpreter(mut self, interpreter: impl Into<String>) -> Self {
        self.interpreter = interpreter.into();
        self
    }

    pub fn with_deadline_ms(mut self, ms: u64) -> Self {
        self.deadline_ms = ms;
        self
    }

    pub fn with_rewrite_deadline_ms(mut self, ms: u64) -> Self {
        self.rewrite_deadline_ms = ms;
        self
    }

    pub fn with_check_protocol(mut self, enabled: bool) -> Self {
        self.check_protocol = enabled;
        self
    }

    pub fn with_preamble(mut self, enabled: bool) -> Self {
        self.include_preamble = enabled;
        self
    }
}

/// Static test normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    /// Cut multi-assertion tests down to one assertion.
    pub single_assert_per_test: bool,
    /// Which assertion survives the cut.
    pub assertion_choice: AssertionChoice,
    /// Explode multi-assertion tests into single-assertion tests instead of cutting them.
    pub split_asserts: bool,
    /// Cap on split tests kept per batch.
    pub max_split_tests: usize,
    pub seed: u64,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            single_assert_per_test: true,
            assertion_choice: AssertionChoice::First,
            split_asserts: false,
            max_split_tests: 100,
            seed: 0,
        }
    }
}

impl NormalizeConfig {
    pub fn with_assertion_choice(mut self, choice: AssertionChoice) -> Self {
        self.assertion_choice = choice;
        self
    }

    pub fn with_split_asserts(mut self, split: bool) -> Self {
        self.split_asserts = split;
        self
    }

    pub fn with_single_assert(mut self, single: bool) -> Self {
        self.single_assert_per_test = single;
        self
    }
}

/// Test and program ranking.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankConfig {
    /// `None` keeps tests in their incoming order.
    pub tests: Option<TestRankStrategy>,
    /// `None` keeps programs in their incoming order.
    pub code: Option<CodeRankStrategy>,
    pub seed: u64,
}

impl RankConfig {
    pub fn with_tests(mut self, strategy: Option<TestRankStrategy>) -> Self {
        self.tests = strategy;
        self
    }

    pub fn with_code(mut self, strategy: Option<CodeRankStrategy>) -> Self {
        self.code = strategy;
        self
    }
}

/// Refinement loop budget and policies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub max_queries: usize,
    /// Count only approved tests against `max_queries`.
    pub count_accepted_only: bool,
    /// Hard cap on total queries when only approvals are counted.
    pub accepted_query_ceiling: usize,
    /// On rejection, repair the test against the reference program and approve the repair.
    pub user_fixes_tests: bool,
    /// With an automatic oracle, never prune programs that satisfy the validation tests.
    pub protect_validated: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_queries: 5,
            count_accepted_only: false,
            accepted_query_ceiling: 10,
            user_fixes_tests: false,
            protect_validated: true,
        }
    }
}

impl SessionConfig {
    pub fn with_max_queries(mut self, max: usize) -> Self {
        self.max_queries = max;
        self
    }

    pub fn with_count_accepted_only(mut self, enabled: bool) -> Self {
        self.count_accepted_only = enabled;
        self
    }

    pub fn with_user_fixes_tests(mut self, enabled: bool) -> Self {
        self.user_fixes_tests = enabled;
        self
    }

    pub fn with_protect_validated(mut self, enabled: bool) -> Self {
        self.protect_validated = enabled;
        self
    }
}

/// Per-task pipeline stages and batch resources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Skip static normalization and splitting.
    pub baseline: bool,
    /// Drop tests that are malformed against every program.
    pub dynamic_test_pruning: bool,
    /// Drop programs no test runs to completion against.
    pub optimistic_program_pruning: bool,
    pub regression: RegressionPolicy,
    /// Popularity ceiling for rare rewrites, as a percentage of the program count.
    pub top_rare_pct: f64,
    pub cluster_regression_tests: bool,
    /// Tests requested from the generator per task.
    pub tests_per_task: usize,
    /// Concurrent sessions.
    pub jobs: usize,
    pub token_limit: u64,
    pub token_window_secs: u64,
    /// Completion tokens reserved per generated candidate.
    pub completion_tokens: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            baseline: false,
            dynamic_test_pruning: false,
            optimistic_program_pruning: false,
            regression: RegressionPolicy::Off,
            top_rare_pct: 5.0,
            cluster_regression_tests: false,
            tests_per_task: 10,
            jobs: 1,
            token_limit: 10_000,
            token_window_secs: 60,
            completion_tokens: 300,
        }
    }
}

impl PipelineConfig {
    pub fn token_window(&self) -> Duration {
        Duration::from_secs(self.token_window_secs)
    }

    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    pub fn with_regression(mut self, policy: RegressionPolicy) -> Self {
        self.regression = policy;
        self
    }

    pub fn with_dynamic_pruning(mut self, tests: bool, programs: bool) -> Self {
        self.dynamic_test_pruning = tests;
        self.optimistic_program_pruning = programs;
        self
    }
}
