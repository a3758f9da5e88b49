//! Equivalence and clustering.
//!
//! Programs are grouped by *pass signature*: the ascending indices of the tests they pass. Members
//! of one cluster are indistinguishable by the current test set.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::executor::Executor;

/// Unique texts in first-seen order.
pub fn dedupe(texts: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    texts.iter().filter(|t| seen.insert(t.as_str())).cloned().collect()
}

/// Unique texts whose occurrence count is at most `threshold`, plus the count of every item.
pub fn dedupe_below_popularity(texts: &[String], threshold: f64) -> (Vec<String>, BTreeMap<String, usize>) {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for text in texts {
        *counts.entry(text.clone()).or_insert(0) += 1;
    }
    let kept = dedupe(texts)
        .into_iter()
        .filter(|t| counts[t] as f64 <= threshold)
        .collect();
    (kept, counts)
}

/// Programs sharing one pass signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    /// Ascending indices of the passed tests.
    pub signature: Vec<usize>,
    /// Members in first-seen order; the first is the representative.
    pub members: Vec<String>,
}

impl Cluster {
    pub fn representative(&self) -> &str {
        &self.members[0]
    }

    /// `sqrt(|cluster|) * |signature| / |tests|`.
    pub fn score(&self, num_tests: usize) -> f64 {
        if num_tests == 0 {
            return 0.0;
        }
        (self.members.len() as f64).sqrt() * self.signature.len() as f64 / num_tests as f64
    }
}

/// Every cluster, in order of first appearance. The clusters partition `programs`.
pub fn clusters(executor: &mut Executor, programs: &[String], tests: &[String]) -> Vec<Cluster> {
    let matrix = executor.outcomes(programs, tests);
    let mut index: HashMap<Vec<usize>, usize> = HashMap::new();
    let mut clusters: Vec<Cluster> = Vec::new();
    for (p, program) in programs.iter().enumerate() {
        let signature = matrix.passed_tests(p);
        match index.get(&signature) {
            Some(&i) => clusters[i].members.push(program.clone()),
            None => {
                index.insert(signature.clone(), clusters.len());
                clusters.push(Cluster {
                    signature,
                    members: vec![program.clone()],
                });
            }
        }
    }
    clusters
}

/// One representative per cluster, best-scoring cluster first (ties in first-seen order).
///
/// When no program passes any test the input is returned unchanged.
#[tracing::instrument(skip_all, fields(programs = programs.len(), tests = tests.len()))]
pub fn cluster_by_outcome_signature(executor: &mut Executor, programs: &[String], tests: &[String]) -> Vec<String> {
    let mut clusters = clusters(executor, programs, tests);
    if clusters.iter().all(|c| c.signature.is_empty()) {
        return programs.to_vec();
    }
    let num_tests = tests.len();
    clusters.sort_by(|a, b| b.score(num_tests).total_cmp(&a.score(num_tests)));
    tracing::debug!(clusters = clusters.len(), "ranked outcome clusters");
    clusters.into_iter().map(|c| c.representative().to_string()).collect()
}
