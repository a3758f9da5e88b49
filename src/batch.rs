//! Batch runner: many tasks on a bounded worker pool.
//!
//! Each task gets its own executor and runs its whole pipeline on a blocking worker; at most
//! `jobs` run at once. A panicking task becomes a skipped record, while cancellation stops the
//! whole batch. Records come back in task order.

use std::sync::{Arc, Mutex};

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::config::CandorConfig;
use crate::dataset::Task;
use crate::executor::Executor;
use crate::generate::{BudgetedGenerator, CachedGenerator, Generator, ReplayGenerator, ResponseCache};
use crate::limiter::TokenBudget;
use crate::pipeline::{self, SessionRecord};
use crate::refine::{CancellationToken, ReferenceOracle, SessionError};

/// Builds the executor a task runs on.
pub type ExecutorFactory = Arc<dyn Fn(&Task) -> std::io::Result<Executor> + Send + Sync>;

/// Resources shared by every worker of a batch.
#[derive(Clone)]
pub struct BatchContext {
    pub config: Arc<CandorConfig>,
    pub budget: Arc<TokenBudget>,
    pub cache: Option<Arc<Mutex<ResponseCache>>>,
    pub cancel: CancellationToken,
    pub executors: ExecutorFactory,
}

impl BatchContext {
    /// Python-backed executors and a wall-clock budget from `config`.
    pub fn new(config: CandorConfig) -> Self {
        let budget = TokenBudget::system(config.pipeline.token_limit, config.pipeline.token_window());
        let sandbox = config.sandbox.clone();
        Self {
            config: Arc::new(config),
            budget: Arc::new(budget),
            cache: None,
            cancel: CancellationToken::new(),
            executors: Arc::new(move |task: &Task| Executor::python(sandbox.clone(), task.func_name.clone())),
        }
    }

    pub fn with_cache(mut self, cache: Arc<Mutex<ResponseCache>>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_executors(mut self, executors: ExecutorFactory) -> Self {
        self.executors = executors;
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Replayed candidates behind the shared budget and, when configured, the response cache.
    pub fn generator(&self) -> Box<dyn Generator> {
        let budgeted = BudgetedGenerator::new(
            ReplayGenerator,
            Arc::clone(&self.budget),
            self.config.pipeline.completion_tokens,
        );
        match &self.cache {
            Some(cache) => Box::new(CachedGenerator::new(budgeted, Arc::clone(cache))),
            None => Box::new(budgeted),
        }
    }
}

/// Run one task to a record on the current thread.
fn run_one(task: &Task, ctx: &BatchContext) -> Result<SessionRecord, SessionError> {
    let Some(reference) = task.oracle.as_deref() else {
        return Ok(SessionRecord::skipped(&task.id, "task has no reference program"));
    };
    let mut executor = match (ctx.executors)(task) {
        Ok(executor) => executor,
        Err(e) => return Ok(SessionRecord::skipped(&task.id, format!("failed to start sandbox: {e}"))),
    };
    let mut generator = ctx.generator();
    let mut oracle = ReferenceOracle::new(reference);
    pipeline::run_task(task, &mut executor, &mut generator, &mut oracle, &ctx.config, &ctx.cancel)
}

/// Run every task, `config.pipeline.jobs` at a time.
///
/// ## Errors
/// Returns [`SessionError::Cancelled`] if the batch is cancelled; the remaining workers are
/// cancelled too.
pub async fn run_batch(tasks: Vec<Task>, ctx: BatchContext) -> Result<Vec<SessionRecord>, SessionError> {
    let jobs = ctx.config.pipeline.jobs.max(1);
    let total = tasks.len();
    let sem = Arc::new(Semaphore::new(jobs));
    let mut join_set = JoinSet::new();
    tracing::info!(tasks = total, jobs, "starting batch");

    for (index, task) in tasks.into_iter().enumerate() {
        let permit = sem
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| SessionError::Cancelled(format!("worker pool closed: {e}")))?;
        if ctx.cancel.is_cancelled() {
            break;
        }
        let ctx = ctx.clone();
        join_set.spawn(async move {
            let _permit = permit;
            let id = task.id.clone();
            let result = tokio::task::spawn_blocking(move || run_one(&task, &ctx)).await;
            (index, id, result)
        });
    }

    let mut records = Vec::with_capacity(total);
    while let Some(joined) = join_set.join_next().await {
        let (index, record) = match joined {
            Ok((index, _, Ok(Ok(record)))) => (index, record),
            Ok((_, id, Ok(Err(e)))) => {
                tracing::warn!(task = %id, error = %e, "batch cancelled");
                ctx.cancel.cancel();
                join_set.abort_all();
                return Err(e);
            }
            Ok((index, id, Err(e))) => {
                tracing::error!(task = %id, error = %e, "task worker failed");
                (index, SessionRecord::skipped(id, format!("worker failed: {e}")))
            }
            Err(e) => {
                // The async wrapper itself never panics; this is an abort.
                return Err(SessionError::Cancelled(format!("worker aborted: {e}")));
            }
        };
        tracing::info!(done = records.len() + 1, total, task = %record.task_id, "task done");
        records.push((index, record));
    }
    ctx.cancel.check()?;

    records.sort_by_key(|(index, _)| *index);
    Ok(records.into_iter().map(|(_, record)| record).collect())
}
