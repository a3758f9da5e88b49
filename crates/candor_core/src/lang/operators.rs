//! Operator vocabulary.
//!
//! This module defines the canonical operator set (symbol operators like `+` and word operators
//! like `and`) along with precedence, associativity, and fixity.
//!
//! ## Notes
//! - Lookup via [`from_str`] is **case-sensitive**.
//! - Word operators (`and`, `or`, `not`, `in`, `is`) are lexed as keywords; their entries here carry
//!   [`OperatorInfo::is_keyword_spelling`] so tooling can tell them apart.
//! - `@` is lexed as punctuation (it doubles as the decorator marker); the parser treats it as
//!   matrix multiplication in binary position.
//! - Precedence follows the Python reference: higher binds tighter.
//!
//! ## Examples
//! ```rust
//! use candor_core::lang::operators::{self, OperatorId};
//!
//! assert_eq!(operators::from_str("//"), Some(OperatorId::SlashSlash));
//! assert!(operators::info_for(OperatorId::Star).precedence > operators::info_for(OperatorId::Plus).precedence);
//! ```

/// Define how operators associate when chained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Associativity {
    Left,
    Right,
    /// Comparisons chain (`a < b < c`) rather than associate.
    Chain,
}

/// Define whether an operator is infix (binary), prefix (unary), or an assignment form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fixity {
    Infix,
    Prefix,
    Assignment,
}

/// Stable identifier for every operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorId {
    // Arithmetic
    Plus,
    Minus,
    Star,
    StarStar,
    Slash,
    SlashSlash,
    Percent,

    // Bitwise
    Amp,
    Pipe,
    Caret,
    Tilde,
    LShift,
    RShift,

    // Comparison
    EqEq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,

    // Assignment
    Eq,
    ColonEq,
    PlusEq,
    MinusEq,
    StarEq,
    StarStarEq,
    SlashEq,
    SlashSlashEq,
    PercentEq,
    AmpEq,
    PipeEq,
    CaretEq,
    LShiftEq,
    RShiftEq,
    AtEq,

    // Word operators
    And,
    Or,
    Not,
    In,
    Is,
}

/// Metadata for an operator.
#[derive(Debug, Clone, Copy)]
pub struct OperatorInfo {
    pub id: OperatorId,
    pub spelling: &'static str,
    pub precedence: u8,
    pub associativity: Associativity,
    pub fixity: Fixity,
    pub is_keyword_spelling: bool,
}

use Associativity as A;
use Fixity as F;

/// Registry of all operators.
pub const OPERATORS: &[OperatorInfo] = &[
    // Arithmetic
    op(OperatorId::Plus, "+", 110, A::Left, F::Infix),
    op(OperatorId::Minus, "-", 110, A::Left, F::Infix),
    op(OperatorId::Star, "*", 120, A::Left, F::Infix),
    op(OperatorId::StarStar, "**", 140, A::Right, F::Infix),
    op(OperatorId::Slash, "/", 120, A::Left, F::Infix),
    op(OperatorId::SlashSlash, "//", 120, A::Left, F::Infix),
    op(OperatorId::Percent, "%", 120, A::Left, F::Infix),
    // Bitwise
    op(OperatorId::Amp, "&", 90, A::Left, F::Infix),
    op(OperatorId::Pipe, "|", 70, A::Left, F::Infix),
    op(OperatorId::Caret, "^", 80, A::Left, F::Infix),
    op(OperatorId::Tilde, "~", 130, A::Right, F::Prefix),
    op(OperatorId::LShift, "<<", 100, A::Left, F::Infix),
    op(OperatorId::RShift, ">>", 100, A::Left, F::Infix),
    // Comparison
    op(OperatorId::EqEq, "==", 60, A::Chain, F::Infix),
    op(OperatorId::NotEq, "!=", 60, A::Chain, F::Infix),
    op(OperatorId::Lt, "<", 60, A::Chain, F::Infix),
    op(OperatorId::LtEq, "<=", 60, A::Chain, F::Infix),
    op(OperatorId::Gt, ">", 60, A::Chain, F::Infix),
    op(OperatorId::GtEq, ">=", 60, A::Chain, F::Infix),
    // Assignment
    op(OperatorId::Eq, "=", 0, A::Right, F::Assignment),
    op(OperatorId::ColonEq, ":=", 0, A::Right, F::Assignment),
    op(OperatorId::PlusEq, "+=", 0, A::Right, F::Assignment),
    op(OperatorId::MinusEq, "-=", 0, A::Right, F::Assignment),
    op(OperatorId::StarEq, "*=", 0, A::Right, F::Assignment),
    op(OperatorId::StarStarEq, "**=", 0, A::Right, F::Assignment),
    op(OperatorId::SlashEq, "/=", 0, A::Right, F::Assignment),
    op(OperatorId::SlashSlashEq, "//=", 0, A::Right, F::Assignment),
    op(OperatorId::PercentEq, "%=", 0, A::Right, F::Assignment),
    op(OperatorId::AmpEq, "&=", 0, A::Right, F::Assignment),
    op(OperatorId::PipeEq, "|=", 0, A::Right, F::Assignment),
    op(OperatorId::CaretEq, "^=", 0, A::Right, F::Assignment),
    op(OperatorId::LShiftEq, "<<=", 0, A::Right, F::Assignment),
    op(OperatorId::RShiftEq, ">>=", 0, A::Right, F::Assignment),
    op(OperatorId::AtEq, "@=", 0, A::Right, F::Assignment),
    // Word operators
    word(OperatorId::And, "and", 40, A::Left, F::Infix),
    word(OperatorId::Or, "or", 30, A::Left, F::Infix),
    word(OperatorId::Not, "not", 50, A::Right, F::Prefix),
    word(OperatorId::In, "in", 60, A::Chain, F::Infix),
    word(OperatorId::Is, "is", 60, A::Chain, F::Infix),
];

/// Return the full metadata entry for an operator.
///
/// ## Panics
/// - If the registry is missing an entry for `id` (this indicates a programming error).
pub fn info_for(id: OperatorId) -> &'static OperatorInfo {
    OPERATORS.iter().find(|o| o.id == id).expect("operator info missing")
}

/// Canonical spelling of an operator.
pub fn as_str(id: OperatorId) -> &'static str {
    info_for(id).spelling
}

/// Resolve an operator spelling to its identifier.
pub fn from_str(spelling: &str) -> Option<OperatorId> {
    OPERATORS.iter().find(|o| o.spelling == spelling).map(|o| o.id)
}

/// Return `true` for operators that may appear in a comparison chain.
pub fn is_comparison(id: OperatorId) -> bool {
    info_for(id).associativity == Associativity::Chain
}

/// Comparison spellings whose expected side the assertion rewriter may replace.
///
/// Chained comparisons and membership tests are never rewritten.
pub const REWRITABLE_COMPARISONS: &[&str] = &["==", "!=", "is", "is not", "<", ">"];

/// Return `true` if a single comparison with this spelling may be rewritten.
pub fn is_rewritable_comparison(spelling: &str) -> bool {
    REWRITABLE_COMPARISONS.contains(&spelling)
}

/// Map an augmented-assignment operator to the binary operator it applies (`+=` → `+`).
pub fn augmented_base(id: OperatorId) -> Option<OperatorId> {
    Some(match id {
        OperatorId::PlusEq => OperatorId::Plus,
        OperatorId::MinusEq => OperatorId::Minus,
        OperatorId::StarEq => OperatorId::Star,
        OperatorId::StarStarEq => OperatorId::StarStar,
        OperatorId::SlashEq => OperatorId::Slash,
        OperatorId::SlashSlashEq => OperatorId::SlashSlash,
        OperatorId::PercentEq => OperatorId::Percent,
        OperatorId::AmpEq => OperatorId::Amp,
        OperatorId::PipeEq => OperatorId::Pipe,
        OperatorId::CaretEq => OperatorId::Caret,
        OperatorId::LShiftEq => OperatorId::LShift,
        OperatorId::RShiftEq => OperatorId::RShift,
        _ => return None,
    })
}

// --- helpers -----------------------------------------------------------------

const fn op(id: OperatorId, spelling: &'static str, precedence: u8, associativity: Associativity, fixity: Fixity) -> OperatorInfo {
    OperatorInfo {
        id,
        spelling,
        precedence,
        associativity,
        fixity,
        is_keyword_spelling: false,
    }
}

const fn word(
    id: OperatorId,
    spelling: &'static str,
    precedence: u8,
    associativity: Associativity,
    fixity: Fixity,
) -> OperatorInfo {
    OperatorInfo {
        id,
        spelling,
        precedence,
        associativity,
        fixity,
        is_keyword_spelling: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_power_binds_tighter_than_unary() {
        assert!(info_for(OperatorId::StarStar).precedence > info_for(OperatorId::Tilde).precedence);
        assert_eq!(info_for(OperatorId::StarStar).associativity, Associativity::Right);
    }

    #[test]
    fn test_comparisons_chain() {
        for id in [OperatorId::EqEq, OperatorId::Lt, OperatorId::Is, OperatorId::In] {
            assert!(is_comparison(id), "{id:?}");
        }
        assert!(!is_comparison(OperatorId::Plus));
    }

    #[test]
    fn test_rewritable_comparisons_are_closed() {
        assert!(is_rewritable_comparison("is not"));
        assert!(is_rewritable_comparison("<"));
        assert!(!is_rewritable_comparison("<="));
        assert!(!is_rewritable_comparison("in"));
    }

    #[test]
    fn test_augmented_base() {
        assert_eq!(augmented_base(OperatorId::SlashSlashEq), Some(OperatorId::SlashSlash));
        assert_eq!(augmented_base(OperatorId::Eq), None);
    }
}
