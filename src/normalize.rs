//! Static test normalization.
//!
//! Model-generated tests are often truncated, concatenated, or stuffed with assertions. This module
//! turns raw test text into well-formed tests carrying exactly one assertion, without running
//! anything:
//!
//! 1. keep only the final top-level definition,
//! 2. drop tests that end in a `pass` placeholder or contain no assertion,
//! 3. repair truncated tests by dropping their last line (or drop them if that does not help),
//! 4. cut or split multi-assertion tests.
//!
//! Assertion positions come from `assert` keyword tokens, so the word inside strings or
//! identifiers never counts.

use std::collections::HashMap;

use candor_core::lang::keywords::KeywordId;
use candor_syntax::{is_parseable, lexer};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::config::NormalizeConfig;

/// Which assertion a multi-assertion test keeps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum AssertionChoice {
    /// The first assertion.
    #[default]
    First,
    /// One assertion drawn uniformly from the seeded generator.
    Random,
}

/// Stateful normalizer (owns the generator used by [`AssertionChoice::Random`]).
pub struct Normalizer {
    config: NormalizeConfig,
    rng: StdRng,
}

impl Normalizer {
    pub fn new(config: NormalizeConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self { config, rng }
    }

    pub fn config(&self) -> &NormalizeConfig {
        &self.config
    }

    /// Normalize one raw test, or `None` if it is dropped.
    ///
    /// When splitting is configured the multi-assertion cut is left to [`Normalizer::normalize_all`].
    pub fn normalize(&mut self, raw: &str) -> Option<String> {
        let text = keep_final_definition(raw);
        if ends_with_placeholder(text) {
            tracing::debug!("dropping test ending in a placeholder");
            return None;
        }
        let text = repair(text)?;
        let offsets = assertion_offsets(&text);
        if offsets.is_empty() {
            tracing::debug!("dropping test without assertions");
            return None;
        }
        if self.config.split_asserts || !self.config.single_assert_per_test || offsets.len() == 1 {
            return Some(text);
        }
        let keep = match self.config.assertion_choice {
            AssertionChoice::First => 0,
            AssertionChoice::Random => self.rng.gen_range(0..offsets.len()),
        };
        Some(assertion_interval(&text, &offsets, keep))
    }

    /// Normalize a batch, then split it when configured.
    #[tracing::instrument(skip_all, fields(raw = raw.len()))]
    pub fn normalize_all(&mut self, raw: &[String]) -> Vec<String> {
        let normalized: Vec<String> = raw.iter().filter_map(|t| self.normalize(t)).collect();
        tracing::info!(kept = normalized.len(), dropped = raw.len() - normalized.len(), "normalized tests");
        if self.config.split_asserts {
            split_tests(&normalized, self.config.max_split_tests)
        } else {
            normalized
        }
    }
}

/// Keep the text from the last top-level `def` onwards when there are several.
pub fn keep_final_definition(text: &str) -> &str {
    let mut starts = Vec::new();
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        if line.starts_with("def ") || line.starts_with("async def ") {
            starts.push(offset);
        }
        offset += line.len();
    }
    match starts.as_slice() {
        [_, .., last] => &text[*last..],
        _ => text,
    }
}

/// `true` if the last non-blank line is a bare `pass` statement.
pub fn ends_with_placeholder(text: &str) -> bool {
    text.lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .and_then(|line| line.trim_start().strip_prefix("pass"))
        .is_some_and(|rest| !rest.starts_with(|c: char| c.is_alphanumeric() || c == '_'))
}

/// Drop the final line (ignoring trailing blank lines).
pub fn remove_last_line(text: &str) -> &str {
    let trimmed = text.trim_end();
    match trimmed.rfind('\n') {
        Some(i) => &trimmed[..i],
        None => "",
    }
}

/// The text itself if it parses, else its last-line repair if that parses.
pub fn repair(text: &str) -> Option<String> {
    if is_parseable(text) {
        return Some(text.to_string());
    }
    let repaired = remove_last_line(text);
    if !repaired.trim().is_empty() && is_parseable(repaired) {
        tracing::debug!("repaired truncated test");
        return Some(repaired.to_string());
    }
    tracing::debug!("dropping unparseable test");
    None
}

/// Byte offsets of every `assert` keyword token.
pub fn assertion_offsets(text: &str) -> Vec<usize> {
    match lexer::lex(text) {
        Ok(tokens) => tokens
            .iter()
            .filter(|t| t.kind.is_keyword(KeywordId::Assert))
            .map(|t| t.span.start)
            .collect(),
        Err(_) => Vec::new(),
    }
}

/// Parses (directly or after repair) and contains an assertion.
pub fn is_valid_assert_test(text: &str) -> bool {
    repair(text).is_some_and(|t| !assertion_offsets(&t).is_empty())
}

/// Shared preamble plus the `index`-th assertion interval.
fn assertion_interval(text: &str, offsets: &[usize], index: usize) -> String {
    let start = offsets[index];
    let end = offsets.get(index + 1).copied().unwrap_or(text.len());
    let mut test = String::with_capacity(offsets[0] + (end - start));
    test.push_str(&text[..offsets[0]]);
    test.push_str(text[start..end].trim_end());
    test
}

/// Explode a test into one test per assertion, each sharing the preamble.
pub fn split_assertions(text: &str) -> Vec<String> {
    let offsets = assertion_offsets(text);
    if offsets.len() <= 1 {
        return vec![text.to_string()];
    }
    (0..offsets.len()).map(|i| assertion_interval(text, &offsets, i)).collect()
}

/// Split every test, then dedupe and order by frequency (ties in first-seen order), keeping at
/// most `cap`.
pub fn split_tests(tests: &[String], cap: usize) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut order: Vec<String> = Vec::new();
    for test in tests {
        for piece in split_assertions(test) {
            let count = counts.entry(piece.clone()).or_insert(0);
            if *count == 0 {
                order.push(piece);
            }
            *count += 1;
        }
    }
    order.sort_by(|a, b| counts[b].cmp(&counts[a]));
    order.truncate(cap);
    tracing::info!(split = order.len(), from = tests.len(), "split multi-assertion tests");
    order
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer(config: NormalizeConfig) -> Normalizer {
        Normalizer::new(config)
    }

    #[test]
    fn test_keeps_final_definition() {
        let raw = "def test_a():\n    assert f(1) == 1\ndef test_b():\n    assert f(2) == 2\n";
        assert_eq!(keep_final_definition(raw), "def test_b():\n    assert f(2) == 2\n");
        let single = "def test_a():\n    def inner(): pass\n    assert inner() is None\n";
        assert_eq!(keep_final_definition(single), single);
    }

    #[test]
    fn test_placeholder_detection() {
        assert!(ends_with_placeholder("def test_f():\n    pass\n\n"));
        assert!(ends_with_placeholder("def test_f():\n    pass  # todo"));
        assert!(!ends_with_placeholder("def test_f():\n    passed = 1"));
        assert!(!ends_with_placeholder("def test_f():\n    assert f(1)"));
    }

    #[test]
    fn test_trivial_tests_are_dropped() {
        let mut n = normalizer(NormalizeConfig::default());
        assert_eq!(n.normalize("def test_f():\n    pass"), None);
        assert_eq!(n.normalize("def test_f():\n    x = f(1)\n"), None);
        // The word inside a string is not an assertion.
        assert_eq!(n.normalize("def test_f():\n    print('assert')\n"), None);
    }

    #[test]
    fn test_truncated_test_is_repaired() {
        let mut n = normalizer(NormalizeConfig::default());
        let raw = "def test_f():\n    assert f(1) == 2\n    assert f([1, 2";
        assert_eq!(n.normalize(raw).as_deref(), Some("def test_f():\n    assert f(1) == 2"));
        assert_eq!(n.normalize("def test_f(:\n    assert f(1) ==\n    x = ("), None);
    }

    #[test]
    fn test_first_assertion_is_kept() {
        let mut n = normalizer(NormalizeConfig::default());
        let raw = "def test_f():\n    xs = [1]\n    assert f(xs) == 1\n    assert f([]) == 0\n";
        assert_eq!(
            n.normalize(raw).as_deref(),
            Some("def test_f():\n    xs = [1]\n    assert f(xs) == 1")
        );
    }

    #[test]
    fn test_random_assertion_choice_is_seeded() {
        let raw = "def test_f():\n    assert f(1) == 1\n    assert f(2) == 2\n    assert f(3) == 3\n";
        let config = NormalizeConfig::default().with_assertion_choice(AssertionChoice::Random);
        let first: Vec<_> = {
            let mut n = normalizer(config.clone());
            (0..8).map(|_| n.normalize(raw)).collect()
        };
        let second: Vec<_> = {
            let mut n = normalizer(config);
            (0..8).map(|_| n.normalize(raw)).collect()
        };
        assert_eq!(first, second);
        for test in first.into_iter().flatten() {
            assert_eq!(assertion_offsets(&test).len(), 1);
            assert!(test.starts_with("def test_f():\n    assert f("));
        }
    }

    #[test]
    fn test_split_shares_preamble() {
        let raw = "def test_f():\n    xs = [1]\n    assert f(xs) == 1\n    assert f([]) == 0\n";
        assert_eq!(
            split_assertions(raw),
            vec![
                "def test_f():\n    xs = [1]\n    assert f(xs) == 1".to_string(),
                "def test_f():\n    xs = [1]\n    assert f([]) == 0".to_string(),
            ]
        );
    }

    #[test]
    fn test_split_orders_by_frequency() {
        let tests = vec![
            "def test_f():\n    assert f(1) == 1\n    assert f(2) == 2".to_string(),
            "def test_f():\n    assert f(3) == 3\n    assert f(2) == 2".to_string(),
        ];
        let split = split_tests(&tests, 100);
        assert_eq!(split.len(), 3);
        assert_eq!(split[0], "def test_f():\n    assert f(2) == 2");
        assert_eq!(split[1], "def test_f():\n    assert f(1) == 1");
        assert_eq!(split_tests(&tests, 1).len(), 1);
    }

    #[test]
    fn test_normalize_all_with_splitting() {
        let config = NormalizeConfig::default().with_split_asserts(true);
        let mut n = normalizer(config);
        let raw = vec!["def test_f():\n    assert f(1) == 1\n    assert f(2) == 2\n".to_string()];
        assert_eq!(n.normalize_all(&raw).len(), 2);
    }

    #[test]
    fn test_valid_assert_test() {
        assert!(is_valid_assert_test("def test_f():\n    assert f(1) == 1"));
        assert!(is_valid_assert_test("def test_f():\n    assert f(1) == 1\n    assert f("));
        assert!(!is_valid_assert_test("def test_f():\n    return 1"));
    }
}
