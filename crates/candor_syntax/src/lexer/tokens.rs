//! Token types for the candidate-language lexer.
//!
//! The lexer uses **registry-backed IDs** for language vocabulary:
//! - `Keyword(KeywordId)` for reserved words
//! - `Operator(OperatorId)` for symbol operators
//! - `Punctuation(PunctuationId)` for punctuation tokens
//!
//! Literals keep their exact source text so that re-emitting them (see [`crate::unparse`]) is lossless.

use crate::ast::Span;
use candor_core::lang::keywords::{self, KeywordId};
use candor_core::lang::operators::OperatorId;
use candor_core::lang::punctuation::PunctuationId;

// ============================================================================
// TOKEN TYPES
// ============================================================================

/// Kind of token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // ========== Keyword / operator / punctuation (ID-based) ==========
    Keyword(KeywordId),
    Operator(OperatorId),
    Punctuation(PunctuationId),

    // ========== Identifiers and Literals ==========
    Ident(String),
    Number(NumberLit),
    Str(StrLit),

    // ========== Indentation ==========
    Newline,
    Indent,
    Dedent,

    // ========== Special ==========
    Eof,
}

/// Numeric literal category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberKind {
    Int,
    Float,
    Imaginary,
}

/// A numeric literal with its exact spelling (`1_000`, `0xff`, `1e-3`, `2j`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberLit {
    pub raw: String,
    pub kind: NumberKind,
}

/// A single string literal piece.
///
/// ## Notes
/// - `prefix` is the lowercased prefix (`""`, `"r"`, `"b"`, `"f"`, `"rb"`, ...).
/// - `value` is the body with escapes decoded (raw strings keep backslashes). f-string bodies are
///   kept verbatim; replacement fields are not parsed.
/// - `raw` is the exact source text including prefix and quotes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrLit {
    pub prefix: String,
    pub value: String,
    pub raw: String,
}

impl StrLit {
    pub fn is_bytes(&self) -> bool {
        self.prefix.contains('b')
    }

    pub fn is_fstring(&self) -> bool {
        self.prefix.contains('f')
    }
}

/// A token with its kind and source span.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    /// Construct a new token.
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Resolve an identifier spelling to a keyword id, if reserved.
pub fn keyword_id(name: &str) -> Option<KeywordId> {
    keywords::from_str(name)
}
