//! Define the reserved keyword vocabulary of the candidate language.
//!
//! This module is the single source of truth for reserved words: a stable identifier
//! ([`KeywordId`]) plus a const metadata table ([`KEYWORDS`]) that records spellings, categories,
//! usage hints, and the Python release that introduced them.
//!
//! ## Notes
//! - Lookup via [`from_str`] is **case-sensitive** (`True` is a keyword, `true` is a name).
//! - Soft keywords (`match`, `case`, `type`, `_`) are deliberately absent: they remain ordinary
//!   identifiers so candidate programs using them as names still parse.
//! - Some reserved words are also “word operators” (e.g. `and`). Use [`crate::lang::operators`] for
//!   their precedence.
//!
//! ## Examples
//! ```rust
//! use candor_core::lang::keywords::{self, KeywordId};
//!
//! assert_eq!(keywords::from_str("def"), Some(KeywordId::Def));
//! assert_eq!(keywords::from_str("match"), None);
//! assert_eq!(keywords::as_str(KeywordId::Lambda), "lambda");
//! ```

use super::registry::{PY3, Since};

/// Stable identifier for every reserved keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeywordId {
    // Control flow / statements
    If,
    Else,
    Elif,
    While,
    For,
    Break,
    Continue,
    Return,
    Yield,
    Pass,
    Assert,
    Raise,
    Try,
    Except,
    Finally,
    With,
    Del,

    // Definitions / declarations
    Def,
    Class,
    Lambda,
    Async,
    Await,

    // Imports
    Import,
    From,
    As,

    // Scoping
    Global,
    Nonlocal,

    // Literals
    True,
    False,
    None,

    // Word operators
    And,
    Or,
    Not,
    In,
    Is,
}

/// High-level grouping for documentation and tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeywordCategory {
    ControlFlow,
    Definition,
    Import,
    Scope,
    Literal,
    Operator,
}

/// Usage context hints (not enforced here; the parser owns context).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeywordUsage {
    Statement,
    Expression,
    Modifier,
    Operator,
}

/// Metadata for a keyword.
#[derive(Debug, Clone, Copy)]
pub struct KeywordInfo {
    pub id: KeywordId,
    pub canonical: &'static str,
    pub category: KeywordCategory,
    pub usage: &'static [KeywordUsage],
    pub since: Since,
}

use KeywordCategory as C;
use KeywordUsage as U;

/// Registry of all keywords.
///
/// ## Notes
/// - The ordering is not semantically meaningful, but is grouped for readability.
pub const KEYWORDS: &[KeywordInfo] = &[
    // Control flow / statements
    info(KeywordId::If, "if", C::ControlFlow, &[U::Statement, U::Expression], PY3),
    info(KeywordId::Else, "else", C::ControlFlow, &[U::Statement, U::Expression], PY3),
    info(KeywordId::Elif, "elif", C::ControlFlow, &[U::Statement], PY3),
    info(KeywordId::While, "while", C::ControlFlow, &[U::Statement], PY3),
    info(KeywordId::For, "for", C::ControlFlow, &[U::Statement, U::Expression], PY3),
    info(KeywordId::Break, "break", C::ControlFlow, &[U::Statement], PY3),
    info(KeywordId::Continue, "continue", C::ControlFlow, &[U::Statement], PY3),
    info(KeywordId::Return, "return", C::ControlFlow, &[U::Statement], PY3),
    info(KeywordId::Yield, "yield", C::ControlFlow, &[U::Statement, U::Expression], PY3),
    info(KeywordId::Pass, "pass", C::ControlFlow, &[U::Statement], PY3),
    info(KeywordId::Assert, "assert", C::ControlFlow, &[U::Statement], PY3),
    info(KeywordId::Raise, "raise", C::ControlFlow, &[U::Statement], PY3),
    info(KeywordId::Try, "try", C::ControlFlow, &[U::Statement], PY3),
    info(KeywordId::Except, "except", C::ControlFlow, &[U::Statement], PY3),
    info(KeywordId::Finally, "finally", C::ControlFlow, &[U::Statement], PY3),
    info(KeywordId::With, "with", C::ControlFlow, &[U::Statement], PY3),
    info(KeywordId::Del, "del", C::ControlFlow, &[U::Statement], PY3),
    // Definitions
    info(KeywordId::Def, "def", C::Definition, &[U::Statement], PY3),
    info(KeywordId::Class, "class", C::Definition, &[U::Statement], PY3),
    info(KeywordId::Lambda, "lambda", C::Definition, &[U::Expression], PY3),
    info(KeywordId::Async, "async", C::Definition, &[U::Modifier], Since(3, 7)),
    info(KeywordId::Await, "await", C::Definition, &[U::Expression], Since(3, 7)),
    // Imports
    info(KeywordId::Import, "import", C::Import, &[U::Statement], PY3),
    info(KeywordId::From, "from", C::Import, &[U::Statement, U::Expression], PY3),
    info(KeywordId::As, "as", C::Import, &[U::Modifier], PY3),
    // Scoping
    info(KeywordId::Global, "global", C::Scope, &[U::Statement], PY3),
    info(KeywordId::Nonlocal, "nonlocal", C::Scope, &[U::Statement], PY3),
    // Literals
    info(KeywordId::True, "True", C::Literal, &[U::Expression], PY3),
    info(KeywordId::False, "False", C::Literal, &[U::Expression], PY3),
    info(KeywordId::None, "None", C::Literal, &[U::Expression], PY3),
    // Word operators
    info(KeywordId::And, "and", C::Operator, &[U::Operator], PY3),
    info(KeywordId::Or, "or", C::Operator, &[U::Operator], PY3),
    info(KeywordId::Not, "not", C::Operator, &[U::Operator], PY3),
    info(KeywordId::In, "in", C::Operator, &[U::Operator], PY3),
    info(KeywordId::Is, "is", C::Operator, &[U::Operator], PY3),
];

/// Canonical spelling.
pub fn as_str(id: KeywordId) -> &'static str {
    info_for(id).canonical
}

/// Category.
pub fn category(id: KeywordId) -> KeywordCategory {
    info_for(id).category
}

/// Full metadata.
///
/// ## Panics
/// - If the registry is missing an entry for `id` (this indicates a programming error; the guardrail
///   tests cover every variant).
pub fn info_for(id: KeywordId) -> &'static KeywordInfo {
    KEYWORDS.iter().find(|k| k.id == id).expect("keyword info missing")
}

/// Lookup by spelling.
///
/// ## Returns
/// - `Some(KeywordId)` if the spelling is reserved, `None` otherwise.
pub fn from_str(s: &str) -> Option<KeywordId> {
    KEYWORDS.iter().find(|k| k.canonical == s).map(|k| k.id)
}

// --- helpers -----------------------------------------------------------------

const fn info(
    id: KeywordId,
    canonical: &'static str,
    category: KeywordCategory,
    usage: &'static [KeywordUsage],
    since: Since,
) -> KeywordInfo {
    KeywordInfo {
        id,
        canonical,
        category,
        usage,
        since,
    }
}
