//! Regression tests: candidate tests rewritten to record what candidate programs actually do.
//!
//! Pairing every test with every program and rewriting the expected values yields one regression
//! test per observed behavior. Rare behaviors make good questions; common ones mostly confirm
//! what every candidate already agrees on.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::cluster;
use crate::executor::Executor;
use crate::normalize::Normalizer;
use crate::rewrite;

/// Which regression tests the pipeline adds to the candidate tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum RegressionPolicy {
    /// No rewriting.
    #[default]
    Off,
    /// Every distinct rewrite.
    All,
    /// Only rewrites produced by few programs.
    Rare,
}

/// Rewrite each test against its paired program.
///
/// Tests are normalized first; tests that do not survive normalization or parse, and tests where
/// no assertion could be concretized, produce nothing.
#[tracing::instrument(skip_all, fields(pairs = pairs.len()))]
pub fn make_regression_tests(
    executor: &mut Executor,
    normalizer: &mut Normalizer,
    pairs: &[(String, String)],
) -> Vec<String> {
    let mut tests = Vec::new();
    for (program, test) in pairs {
        let Some(normalized) = normalizer.normalize(test) else {
            continue;
        };
        match rewrite::rewrite(executor, program, &normalized) {
            Ok(rewritten) if rewritten.rewritten > 0 => tests.push(rewritten.text),
            Ok(_) => {}
            Err(errors) => tracing::debug!(errors = errors.len(), "skipping unparseable test"),
        }
    }
    tracing::info!(produced = tests.len(), "made regression tests");
    tests
}

fn all_pairs(programs: &[String], tests: &[String]) -> Vec<(String, String)> {
    programs
        .iter()
        .flat_map(|p| tests.iter().map(move |t| (p.clone(), t.clone())))
        .collect()
}

/// The original tests followed by every rewrite, deduplicated.
pub fn assert_rewrite_all(
    executor: &mut Executor,
    normalizer: &mut Normalizer,
    programs: &[String],
    tests: &[String],
) -> Vec<String> {
    let mut combined = tests.to_vec();
    combined.extend(make_regression_tests(executor, normalizer, &all_pairs(programs, tests)));
    cluster::dedupe(&combined)
}

/// The original tests followed by the rewrites produced at most `|programs| * pct / 100` times,
/// deduplicated, plus the count of every distinct rewrite.
pub fn assert_rewrite_rare(
    executor: &mut Executor,
    normalizer: &mut Normalizer,
    programs: &[String],
    tests: &[String],
    top_rare_pct: f64,
) -> (Vec<String>, BTreeMap<String, usize>) {
    let rewrites = make_regression_tests(executor, normalizer, &all_pairs(programs, tests));
    let threshold = programs.len() as f64 * top_rare_pct / 100.0;
    let (rare, stats) = cluster::dedupe_below_popularity(&rewrites, threshold);
    tracing::info!(rare = rare.len(), distinct = stats.len(), threshold, "kept rare regression tests");
    let mut combined = tests.to_vec();
    combined.extend(rare);
    (cluster::dedupe(&combined), stats)
}

/// Regression tests for the first test any program can rewrite, ordered by how many programs
/// produced each (largest group first, ties in first-seen order).
///
/// Empty when no test can be rewritten.
#[tracing::instrument(skip_all, fields(programs = programs.len(), tests = tests.len()))]
pub fn cluster_using_regression_tests(executor: &mut Executor, programs: &[String], tests: &[String]) -> Vec<String> {
    for test in tests {
        let mut groups: Vec<(String, usize)> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        for program in programs {
            let Ok(rewritten) = rewrite::rewrite(executor, program, test) else {
                break;
            };
            if rewritten.rewritten == 0 {
                continue;
            }
            match index.get(&rewritten.text) {
                Some(&i) => groups[i].1 += 1,
                None => {
                    index.insert(rewritten.text.clone(), groups.len());
                    groups.push((rewritten.text, 1));
                }
            }
        }
        if !groups.is_empty() {
            groups.sort_by(|a, b| b.1.cmp(&a.1));
            tracing::info!(clusters = groups.len(), "clustered programs by regression test");
            return groups.into_iter().map(|(text, _)| text).collect();
        }
    }
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{NormalizeConfig, SandboxConfig};
    use crate::sandbox::TableSandbox;

    const PLUS: &str = "def f(x): return x+1";
    const MINUS: &str = "def f(x): return x-1";
    const DOUBLE: &str = "def f(x): return 2*x";
    const TEST: &str = "def test_f():\n    assert f(1) == 5";

    fn s(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    /// PLUS and DOUBLE both give 2 for f(1); MINUS gives 0.
    fn executor() -> Executor {
        let sandbox = TableSandbox::new()
            .with_value(PLUS, "f(1)", "2")
            .with_value(DOUBLE, "f(1)", "2")
            .with_value(MINUS, "f(1)", "0");
        Executor::new(sandbox, SandboxConfig::default().with_preamble(false), "f")
    }

    fn normalizer() -> Normalizer {
        Normalizer::new(NormalizeConfig::default())
    }

    #[test]
    fn test_regression_tests_follow_each_program() {
        let pairs = vec![
            (PLUS.to_string(), TEST.to_string()),
            (MINUS.to_string(), TEST.to_string()),
            (PLUS.to_string(), "def test_f():\n    pass".to_string()),
        ];
        let tests = make_regression_tests(&mut executor(), &mut normalizer(), &pairs);
        assert_eq!(
            tests,
            s(&["def test_f():\n    assert f(1) == 2", "def test_f():\n    assert f(1) == 0"])
        );
    }

    #[test]
    fn test_rewrite_all_appends_distinct_rewrites() {
        let programs = s(&[PLUS, MINUS, DOUBLE]);
        let all = assert_rewrite_all(&mut executor(), &mut normalizer(), &programs, &s(&[TEST]));
        assert_eq!(
            all,
            s(&[TEST, "def test_f():\n    assert f(1) == 2", "def test_f():\n    assert f(1) == 0"])
        );
    }

    #[test]
    fn test_rewrite_rare_drops_popular_behaviors() {
        let programs = s(&[PLUS, MINUS, DOUBLE]);
        // Threshold 3 * 40 / 100 = 1.2: the behavior two programs share is dropped.
        let (rare, stats) = assert_rewrite_rare(&mut executor(), &mut normalizer(), &programs, &s(&[TEST]), 40.0);
        assert_eq!(rare, s(&[TEST, "def test_f():\n    assert f(1) == 0"]));
        assert_eq!(stats["def test_f():\n    assert f(1) == 2"], 2);
        assert_eq!(stats.len(), 2);
    }

    #[test]
    fn test_cluster_uses_first_rewritable_test() {
        let programs = s(&[MINUS, PLUS, DOUBLE]);
        let tests = s(&["def test_f():\n    assert g(1) == 1", TEST]);
        let clustered = cluster_using_regression_tests(&mut executor(), &programs, &tests);
        assert_eq!(
            clustered,
            s(&["def test_f():\n    assert f(1) == 2", "def test_f():\n    assert f(1) == 0"])
        );
        assert!(cluster_using_regression_tests(&mut executor(), &programs, &[]).is_empty());
    }
}
