//! Parser for candidate programs and tests
//!
//! Converts a token stream into a [`Module`] covering the Python statement and expression grammar
//! that candidate code uses (no `match` statements, no parenthesized `with` items).
//!
//! ## Examples
//!
//! ```rust,no_run
//! use candor_syntax::{lexer, parser};
//!
//! let source = "def test_f():\n    assert f(1) == 2\n";
//! let tokens = lexer::lex(source).unwrap();
//! let module = parser::parse(&tokens).unwrap();
//! assert_eq!(module.body.len(), 1);
//! ```

use crate::ast::*;
use crate::diagnostics::SyntaxError;
use crate::lexer::{Token, TokenKind};
use candor_core::lang::keywords::KeywordId;
use candor_core::lang::operators::{self, OperatorId};
use candor_core::lang::punctuation::PunctuationId;

// NOTE: This module is split across multiple files using `include!` to keep all parser
// methods in the same Rust module (preserving privacy + call patterns) while avoiding
// a single large source file.

include!("parser/core.rs");
include!("parser/helpers.rs");
include!("parser/stmts.rs");
include!("parser/expr.rs");
include!("parser/util.rs");
include!("parser/api.rs");
include!("parser/tests.rs");
