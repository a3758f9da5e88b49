//! CLI module for the candor refinement engine
//!
//! ## Commands
//!
//! - `run <TASKS>` - Run refinement sessions for every task in a task file
//! - `exec` - Run one test against one program and print the outcome
//! - `rewrite` - Concretize a test's expected values against a program
//! - `normalize <FILE>` - Normalize (or split) a raw test
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod commands;

use std::fmt;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use crate::normalize::AssertionChoice;
use crate::rank::{CodeRankStrategy, TestRankStrategy};
use crate::regression::RegressionPolicy;

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
    /// Conventional exit code after an interrupt.
    pub const CANCELLED: ExitCode = ExitCode(130);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }

    pub fn with_code(message: impl Into<String>, code: i32) -> Self {
        Self::new(message, ExitCode(code))
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Interactive candidate-refinement engine
#[derive(Parser, Debug)]
#[command(name = "candor")]
#[command(version = VERSION)]
#[command(about = "Narrow generated programs down with generated tests and user feedback", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    // Debug/development flags
    /// Tokenize only (debug)
    #[arg(long = "lex", value_name = "FILE")]
    pub lex_file: Option<PathBuf>,

    /// Parse only (debug)
    #[arg(long = "parse", value_name = "FILE")]
    pub parse_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run refinement sessions for every task in a task file
    Run(RunArgs),

    /// Run one test against one program
    Exec {
        /// File holding the candidate program
        #[arg(long, value_name = "FILE")]
        program: PathBuf,
        /// File holding the test
        #[arg(long, value_name = "FILE")]
        test: PathBuf,
        /// Entry point the test exercises
        #[arg(long, value_name = "NAME")]
        entry: String,
        /// Wall-clock deadline in milliseconds
        #[arg(long, value_name = "MS")]
        deadline_ms: Option<u64>,
        /// Interpreter to run candidates with
        #[arg(long, value_name = "PATH")]
        interpreter: Option<String>,
    },

    /// Concretize a test's expected values against a program
    Rewrite {
        /// File holding the program the values come from
        #[arg(long, value_name = "FILE")]
        program: PathBuf,
        /// File holding the test to rewrite
        #[arg(long, value_name = "FILE")]
        test: PathBuf,
        /// Interpreter to evaluate with
        #[arg(long, value_name = "PATH")]
        interpreter: Option<String>,
    },

    /// Normalize a raw test
    Normalize {
        /// File holding the raw test
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Split multi-assertion tests instead of cutting them
        #[arg(long)]
        split: bool,
        /// Which assertion a cut test keeps
        #[arg(long, value_enum, default_value_t = AssertionChoice::First)]
        choice: AssertionChoice,
        /// Seed for random assertion choice
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
}

/// Options of the `run` subcommand. Flags override the config file.
#[derive(clap::Args, Debug, Default)]
pub struct RunArgs {
    /// Task file (JSON array or JSON Lines)
    #[arg(value_name = "TASKS")]
    pub tasks: PathBuf,
    /// JSON config file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Concurrent sessions
    #[arg(short, long)]
    pub jobs: Option<usize>,
    /// Query budget per session
    #[arg(long)]
    pub max_queries: Option<usize>,
    /// Test ranking strategy
    #[arg(long, value_enum)]
    pub test_rank: Option<TestRankStrategy>,
    /// Program ranking strategy
    #[arg(long, value_enum)]
    pub code_rank: Option<CodeRankStrategy>,
    /// Regression test policy
    #[arg(long, value_enum)]
    pub regression: Option<RegressionPolicy>,
    /// Split multi-assertion tests
    #[arg(long)]
    pub split_asserts: bool,
    /// Skip static normalization and dynamic pruning
    #[arg(long)]
    pub baseline: bool,
    /// Seed for every randomized component
    #[arg(long)]
    pub seed: Option<u64>,
    /// Ask on the terminal instead of consulting each task's reference program
    #[arg(short, long)]
    pub interactive: bool,
    /// Write session records here (JSON Lines) instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
    /// Response cache file
    #[arg(long, value_name = "FILE")]
    pub cache: Option<PathBuf>,
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute the CLI command and return result.
fn execute(cli: Cli) -> CliResult<ExitCode> {
    // Handle debug flags first
    if let Some(file) = cli.lex_file {
        return commands::lex_file(&file);
    }
    if let Some(file) = cli.parse_file {
        return commands::parse_file(&file);
    }

    match cli.command {
        Some(Command::Run(args)) => commands::run_tasks(&args),
        Some(Command::Exec {
            program,
            test,
            entry,
            deadline_ms,
            interpreter,
        }) => commands::exec_pair(&program, &test, &entry, deadline_ms, interpreter),
        Some(Command::Rewrite {
            program,
            test,
            interpreter,
        }) => commands::rewrite_test(&program, &test, interpreter),
        Some(Command::Normalize {
            file,
            split,
            choice,
            seed,
        }) => commands::normalize_test(&file, split, choice, seed),
        // No command - show help
        None => Err(CliError::new("", ExitCode::FAILURE)),
    }
}

// ============================================================================
// Tests
// ============================================================================
