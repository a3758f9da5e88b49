//! Punctuation vocabulary.
//!
//! This module defines the non-operator punctuation tokens used by the lexer/parser: delimiters,
//! separators, access markers, and a few structural markers.
//!
//! ## Examples
//! ```rust
//! use candor_core::lang::punctuation::{self, PunctuationId};
//!
//! assert_eq!(punctuation::from_str("->"), Some(PunctuationId::Arrow));
//! assert_eq!(punctuation::as_str(PunctuationId::Semicolon), ";");
//! ```

/// Broad syntactic grouping for punctuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PunctuationCategory {
    /// Brackets and braces.
    Delimiter,
    /// Separators like `,`, `:` and `;`.
    Separator,
    /// Attribute access (`.`).
    Access,
    /// Return-annotation arrow (`->`).
    Arrow,
    /// Misc markers like `@` and `...`.
    Marker,
}

/// Stable identifier for punctuation tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PunctuationId {
    Comma,
    Colon,
    Semicolon,
    Dot,
    Arrow,
    At,
    Ellipsis,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
}

/// Metadata for a punctuation token.
#[derive(Debug, Clone, Copy)]
pub struct PunctuationInfo {
    pub id: PunctuationId,
    pub canonical: &'static str,
    pub category: PunctuationCategory,
}

use PunctuationCategory as C;

/// Registry of all punctuation tokens.
pub const PUNCTUATION: &[PunctuationInfo] = &[
    info(PunctuationId::Comma, ",", C::Separator),
    info(PunctuationId::Colon, ":", C::Separator),
    info(PunctuationId::Semicolon, ";", C::Separator),
    info(PunctuationId::Dot, ".", C::Access),
    info(PunctuationId::Arrow, "->", C::Arrow),
    info(PunctuationId::At, "@", C::Marker),
    info(PunctuationId::Ellipsis, "...", C::Marker),
    info(PunctuationId::LParen, "(", C::Delimiter),
    info(PunctuationId::RParen, ")", C::Delimiter),
    info(PunctuationId::LBracket, "[", C::Delimiter),
    info(PunctuationId::RBracket, "]", C::Delimiter),
    info(PunctuationId::LBrace, "{", C::Delimiter),
    info(PunctuationId::RBrace, "}", C::Delimiter),
];

/// Full metadata.
///
/// ## Panics
/// - If the registry is missing an entry for `id` (this indicates a programming error).
pub fn info_for(id: PunctuationId) -> &'static PunctuationInfo {
    PUNCTUATION.iter().find(|p| p.id == id).expect("punctuation info missing")
}

/// Canonical spelling.
pub fn as_str(id: PunctuationId) -> &'static str {
    info_for(id).canonical
}

/// Lookup by spelling.
pub fn from_str(s: &str) -> Option<PunctuationId> {
    PUNCTUATION.iter().find(|p| p.canonical == s).map(|p| p.id)
}

/// Return `true` for opening delimiters (which suspend newline handling in the lexer).
pub fn is_opening(id: PunctuationId) -> bool {
    matches!(id, PunctuationId::LParen | PunctuationId::LBracket | PunctuationId::LBrace)
}

// --- helpers -----------------------------------------------------------------

const fn info(id: PunctuationId, canonical: &'static str, category: PunctuationCategory) -> PunctuationInfo {
    PunctuationInfo { id, canonical, category }
}
