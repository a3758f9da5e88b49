#![forbid(unsafe_code)]
//! Interactive candidate-refinement engine
//!
//! Given candidate programs and candidate tests produced by a generative model, candor narrows the
//! programs down to those consistent with ground truth. Tests are executed against programs in a
//! time-bounded sandbox, ranked by how well they discriminate between candidates, and shown to an
//! oracle (a person or a reference program) one at a time; each verdict prunes the candidates that
//! disagree with it.
//!
//! ## Layout
//!
//! - `sandbox`, `executor` - isolated execution and the memoized outcome matrix
//! - `normalize`, `rewrite` - static test cleanup and assertion concretization
//! - `cluster`, `rank`, `prune` - equivalence, ranking, and pruning
//! - `refine` - the refinement session and its oracles
//! - `regression`, `pipeline`, `batch` - the per-task pipeline and the worker pool
//! - `limiter`, `generate`, `dataset`, `config`, `cli` - surrounding plumbing
//!
//! ## Panic Policy
//!
//! This codebase follows explicit error handling:
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` module enforces
//!   `#![deny(clippy::unwrap_used)]`. Faults inside candidate code are never errors: they are [`sandbox::Outcome`]s.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.
//!
//! - **Worker boundary**: a panic inside one task of a batch becomes a skipped record for that task.

pub mod batch;
pub mod cli;
pub mod cluster;
pub mod config;
pub mod dataset;
pub mod executor;
pub mod generate;
pub mod limiter;
pub mod normalize;
pub mod pipeline;
pub mod prune;
pub mod rank;
pub mod refine;
pub mod regression;
pub mod rewrite;
pub mod sandbox;

pub use config::CandorConfig;
pub use executor::{Executor, OutcomeMatrix};
pub use refine::{CancellationToken, SessionError, SessionTrace, run_session};
pub use sandbox::{Outcome, Sandbox};
