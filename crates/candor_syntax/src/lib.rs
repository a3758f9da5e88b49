//! Syntax frontend for candidate programs and tests: lexer, parser, AST, canonical printer,
//! diagnostics.
//!
//! The engine never executes anything through this crate. It uses it to decide whether a test is
//! well formed, to find assertion statements by span, and to print captured literals canonically.
//!
//! ## Notes
//! - Vocabulary identity (keywords/operators/punctuation) comes from `candor_core::lang` registries.
//! - Spans are byte offsets into the original source, so callers can splice replacements in place.
//!
//! ## Examples
//! ```rust,no_run
//! use candor_syntax::{lexer, parser};
//!
//! let tokens = lexer::lex("pass\n").unwrap();
//! let module = parser::parse(&tokens).unwrap();
//! assert_eq!(module.body.len(), 1);
//! ```

pub mod ast;
pub mod diagnostics;
pub mod lexer;
pub mod parser;
pub mod token_helpers;
pub mod unparse;

pub use diagnostics::SyntaxError;
pub use parser::{parse_expression, parse_source};
pub use unparse::unparse_expr;

/// Return `true` if `source` lexes and parses.
pub fn is_parseable(source: &str) -> bool {
    parse_source(source).is_ok()
}
