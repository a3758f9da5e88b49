use super::{CodeRankStrategy, sort_descending_by};
use crate::cluster;
use crate::config::RankConfig;
use crate::executor::Executor;

/// Orders the remaining programs against the remaining tests.
#[derive(Debug, Clone, Copy)]
pub struct CodeRanker {
    strategy: Option<CodeRankStrategy>,
}

impl CodeRanker {
    pub fn new(config: &RankConfig) -> Self {
        Self { strategy: config.code }
    }

    pub fn strategy(&self) -> Option<CodeRankStrategy> {
        self.strategy
    }

    #[tracing::instrument(skip_all, fields(strategy = ?self.strategy, programs = programs.len(), tests = tests.len()))]
    pub fn rank(&self, executor: &mut Executor, programs: &[String], tests: &[String]) -> Vec<String> {
        let Some(strategy) = self.strategy else {
            return programs.to_vec();
        };
        match strategy {
            CodeRankStrategy::PassingCount => {
                let matrix = executor.outcomes(programs, tests);
                sort_descending_by(programs, |p| matrix.passed_tests(p).len())
            }
            CodeRankStrategy::WeightedPassing => {
                let matrix = executor.outcomes(programs, tests);
                let weights: Vec<f64> = (0..matrix.num_tests())
                    .map(|t| match matrix.pass_count(t) {
                        0 => 0.0,
                        n => 100.0 / n as f64,
                    })
                    .collect();
                sort_descending_by(programs, |p| {
                    matrix.passed_tests(p).iter().map(|&t| weights[t]).sum::<f64>()
                })
            }
            CodeRankStrategy::DualExecutionAgreement => cluster::cluster_by_outcome_signature(executor, programs, tests),
        }
    }
}
