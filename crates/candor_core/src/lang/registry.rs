//! Shareable metadata for `candor_core::lang` registries.
//!
//! Every registry (keywords, operators, punctuation) is a `const` table of small `Copy` records. This
//! submodule holds the metadata types they have in common.

/// Python release in which a vocabulary item became part of the grammar.
///
/// ## Examples
/// ```rust
/// use candor_core::lang::registry::Since;
///
/// let since = Since(3, 7);
/// assert!(since >= Since(3, 0));
/// assert_eq!(since.to_string(), "3.7");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Since(pub u8, pub u8);

impl std::fmt::Display for Since {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.0, self.1)
    }
}

/// Baseline for items that have existed since the start of Python 3.
pub const PY3: Since = Since(3, 0);
