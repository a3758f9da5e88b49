//! Provide the canonical vocabulary and conventions of the candidate language (a Python subset) for the candor
//! refinement engine.
//!
//! This crate is intentionally small and dependency-free. It is shared by:
//! - the syntax frontend (`candor_syntax`), which maps spellings to stable IDs while lexing, and
//! - the engine (`candor`), which needs the well-known names used when composing sandbox sources
//!   (test prefix, result binding, standard-library preamble).
//!
//! ## Notes
//!
//! - This is a “vocabulary” crate: **no IO**, no global state, no AST types.

pub mod lang;

pub use lang::conventions;
