//! Candidate-language vocabulary registries.
//!
//! This module is the “front door” for language-level vocabulary: reserved keywords, operators,
//! punctuation, and the naming conventions shared between the frontend and the engine.
//!
//! Callers work with **stable IDs** (e.g. `KeywordId`, `OperatorId`) and look up spellings and
//! metadata via registry tables instead of comparing strings at every call site.
//!
//! ## Notes
//! - Registries are **pure**: no AST types, no IO, no side effects.
//! - The lexer/parser enforce syntax; registries provide spellings and metadata.
//!
//! ## Examples
//! ```rust
//! use candor_core::lang::keywords::{self, KeywordId};
//!
//! assert_eq!(keywords::from_str("assert"), Some(KeywordId::Assert));
//! assert_eq!(keywords::as_str(KeywordId::Assert), "assert");
//! ```

pub mod conventions;
pub mod keywords;
pub mod operators;
pub mod punctuation;
pub mod registry;
