//! Ranking of candidate tests and candidate programs.
//!
//! Every ranking is a stable descending sort on a per-item key: items with equal keys keep their
//! incoming order.

mod code_ranker;
mod test_ranker;

use serde::{Deserialize, Serialize};

pub use code_ranker::CodeRanker;
pub use test_ranker::{RankInputs, TestRanker};

/// How the loop orders the tests it asks about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum TestRankStrategy {
    /// Most assertion failures first, then most non-passing programs.
    FailedCount,
    /// Balance between passing and assertion-failing programs.
    Distinguishing,
    /// Balance between passing and all non-passing programs.
    DistinguishingSimple,
    /// Distinguishing, with programs weighted by how rarely they pass (or fail) tests.
    Weighted,
    /// Most programs pruned under the reference verdict.
    Greedy,
    /// Most bad programs pruned, then most good programs kept, under the reference verdict.
    Ideal,
    /// Seeded uniform permutation.
    Random,
}

/// How the loop orders the remaining programs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum CodeRankStrategy {
    /// Most tests passed first.
    PassingCount,
    /// Passed tests weighted by how few programs pass them.
    WeightedPassing,
    /// Cluster representatives by outcome-signature score. Prunes to one program per cluster.
    DualExecutionAgreement,
}

/// Stable descending order of `items` by `key`.
pub(crate) fn sort_descending_by<T, K, F>(items: &[T], mut key: F) -> Vec<T>
where
    T: Clone,
    F: FnMut(usize) -> K,
    K: PartialOrd,
{
    let keys: Vec<K> = (0..items.len()).map(&mut key).collect();
    let mut order: Vec<usize> = (0..items.len()).collect();
    order.sort_by(|&a, &b| keys[b].partial_cmp(&keys[a]).unwrap_or(std::cmp::Ordering::Equal));
    order.into_iter().map(|i| items[i].clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descending_sort_is_stable() {
        let items = vec!["a", "b", "c", "d"];
        let keys = [1, 3, 1, 3];
        assert_eq!(sort_descending_by(&items, |i| keys[i]), vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn test_strategy_names() {
        assert_eq!(
            serde_json::to_string(&TestRankStrategy::DistinguishingSimple).unwrap(),
            "\"distinguishing-simple\""
        );
        let parsed: CodeRankStrategy = serde_json::from_str("\"weighted-passing\"").unwrap();
        assert_eq!(parsed, CodeRankStrategy::WeightedPassing);
    }
}
