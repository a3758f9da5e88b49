//! CLI command implementations
//!
//! All command functions return `CliResult<ExitCode>` instead of calling
//! `process::exit`. Error handling and exits happen in the top-level `run()`.

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use candor_syntax::{diagnostics, lexer, parse_source};

use super::{CliError, CliResult, ExitCode, RunArgs};
use crate::batch::{self, BatchContext};
use crate::config::{CandorConfig, NormalizeConfig};
use crate::dataset::{self, Task};
use crate::executor::Executor;
use crate::generate::ResponseCache;
use crate::normalize::{self, AssertionChoice, Normalizer};
use crate::pipeline::{self, SessionRecord};
use crate::refine::{CancellationToken, InteractiveOracle, SessionError};
use crate::rewrite;

/// Maximum source file size (100 MB)
const MAX_SOURCE_SIZE: u64 = 100 * 1024 * 1024;

/// Read a source file, rejecting files over `MAX_SOURCE_SIZE`.
pub fn read_source(path: &Path) -> CliResult<String> {
    let metadata = fs::metadata(path)
        .map_err(|e| CliError::failure(format!("Cannot access file '{}': {}", path.display(), e)))?;

    if metadata.len() > MAX_SOURCE_SIZE {
        return Err(CliError::failure(format!(
            "Source file '{}' is too large ({} bytes, max {} bytes)",
            path.display(),
            metadata.len(),
            MAX_SOURCE_SIZE
        )));
    }

    fs::read_to_string(path).map_err(|e| CliError::failure(format!("Error reading file '{}': {}", path.display(), e)))
}

fn syntax_failure(path: &Path, source: &str, errors: &[candor_syntax::SyntaxError]) -> CliError {
    let rendered = diagnostics::render(&path.display().to_string(), source, errors);
    CliError::failure(rendered.trim_end())
}

/// Tokenize and display tokens.
pub fn lex_file(path: &Path) -> CliResult<ExitCode> {
    let source = read_source(path)?;
    let tokens = lexer::lex(&source).map_err(|errs| syntax_failure(path, &source, &errs))?;
    for tok in &tokens {
        println!("{:?}", tok);
    }
    Ok(ExitCode::SUCCESS)
}

/// Parse and display the AST.
pub fn parse_file(path: &Path) -> CliResult<ExitCode> {
    let source = read_source(path)?;
    let module = parse_source(&source).map_err(|errs| syntax_failure(path, &source, &errs))?;
    println!("{:#?}", module);
    Ok(ExitCode::SUCCESS)
}

fn python_executor(config: &CandorConfig, entry: &str) -> CliResult<Executor> {
    Executor::python(config.sandbox.clone(), entry)
        .map_err(|e| CliError::failure(format!("Error starting sandbox: {}", e)))
}

fn sandbox_config(interpreter: Option<String>, deadline_ms: Option<u64>) -> CandorConfig {
    let mut config = CandorConfig::default();
    if let Some(interpreter) = interpreter {
        config.sandbox = config.sandbox.with_interpreter(interpreter);
    }
    if let Some(ms) = deadline_ms {
        config.sandbox = config.sandbox.with_deadline_ms(ms);
    }
    config
}

/// Run one test against one program. Exits 0 only if the test passes.
pub fn exec_pair(
    program: &Path,
    test: &Path,
    entry: &str,
    deadline_ms: Option<u64>,
    interpreter: Option<String>,
) -> CliResult<ExitCode> {
    let program = read_source(program)?;
    let test = read_source(test)?;
    let config = sandbox_config(interpreter, deadline_ms);
    config.validate().map_err(|e| CliError::failure(e.to_string()))?;
    let mut executor = python_executor(&config, entry)?;
    let outcome = executor.execute(&program, &test);
    println!("{outcome}");
    Ok(if outcome.is_pass() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Rewrite a test against a program and print the result.
pub fn rewrite_test(program: &Path, test_path: &Path, interpreter: Option<String>) -> CliResult<ExitCode> {
    let program = read_source(program)?;
    let test = read_source(test_path)?;
    let config = sandbox_config(interpreter, None);
    let mut executor = python_executor(&config, "")?;
    let rewritten =
        rewrite::rewrite(&mut executor, &program, &test).map_err(|errs| syntax_failure(test_path, &test, &errs))?;
    print!("{}", rewritten.text);
    if !rewritten.text.ends_with('\n') {
        println!();
    }
    eprintln!("rewrote {} assertion(s)", rewritten.rewritten);
    Ok(ExitCode::SUCCESS)
}

/// Normalize one raw test; with `split`, print every single-assertion test.
pub fn normalize_test(path: &Path, split: bool, choice: AssertionChoice, seed: u64) -> CliResult<ExitCode> {
    let raw = read_source(path)?;
    let mut config = NormalizeConfig::default()
        .with_assertion_choice(choice)
        .with_split_asserts(split);
    config.seed = seed;
    let max_split = config.max_split_tests;
    let mut normalizer = Normalizer::new(config);
    let Some(test) = normalizer.normalize(&raw) else {
        return Err(CliError::failure(format!("'{}' was dropped by normalization", path.display())));
    };
    let tests = if split {
        normalize::split_tests(&[test], max_split)
    } else {
        vec![test]
    };
    let rendered: Vec<&str> = tests.iter().map(|t| t.trim_end()).collect();
    println!("{}", rendered.join("\n\n"));
    Ok(ExitCode::SUCCESS)
}

/// Merge the config file (if any) with the command-line overrides.
fn run_config(args: &RunArgs) -> CliResult<CandorConfig> {
    let mut config = match &args.config {
        Some(path) => CandorConfig::load(path).map_err(|e| CliError::failure(e.to_string()))?,
        None => CandorConfig::default(),
    };
    if let Some(jobs) = args.jobs {
        config.pipeline.jobs = jobs;
    }
    if let Some(max) = args.max_queries {
        config.session.max_queries = max;
    }
    if args.test_rank.is_some() {
        config.rank.tests = args.test_rank;
    }
    if args.code_rank.is_some() {
        config.rank.code = args.code_rank;
    }
    if let Some(policy) = args.regression {
        config.pipeline.regression = policy;
    }
    if args.split_asserts {
        config.normalize.split_asserts = true;
    }
    if args.baseline {
        config.pipeline.baseline = true;
    }
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    config.validate().map_err(|e| CliError::failure(e.to_string()))?;
    Ok(config)
}

fn cancelled(e: SessionError) -> CliError {
    CliError::new(e.to_string(), ExitCode::CANCELLED)
}

/// Run refinement sessions for every task and write one JSON record per line.
pub fn run_tasks(args: &RunArgs) -> CliResult<ExitCode> {
    let config = run_config(args)?;
    let tasks = dataset::load_tasks(&args.tasks).map_err(|e| CliError::failure(e.to_string()))?;

    let cache = match &args.cache {
        Some(path) => Some(Arc::new(Mutex::new(
            ResponseCache::load(path).map_err(|e| CliError::failure(e.to_string()))?,
        ))),
        None => None,
    };

    let mut ctx = BatchContext::new(config);
    if let Some(cache) = &cache {
        ctx = ctx.with_cache(Arc::clone(cache));
    }

    let records = if args.interactive {
        run_interactive(&tasks, &ctx)?
    } else {
        run_batch(tasks, ctx)?
    };

    if let (Some(path), Some(cache)) = (&args.cache, &cache) {
        let cache = cache.lock().unwrap_or_else(|e| e.into_inner());
        cache.save(path).map_err(|e| CliError::failure(e.to_string()))?;
    }

    write_records(&records, args.output.as_deref())?;
    let skipped = records.iter().filter(|r| r.is_skipped()).count();
    tracing::info!(records = records.len(), skipped, "run finished");
    Ok(ExitCode::SUCCESS)
}

fn run_batch(tasks: Vec<Task>, ctx: BatchContext) -> CliResult<Vec<SessionRecord>> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::failure(format!("Error starting runtime: {}", e)))?;
    runtime.block_on(async move {
        let cancel = ctx.cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupt received; cancelling");
                cancel.cancel();
            }
        });
        batch::run_batch(tasks, ctx).await.map_err(cancelled)
    })
}

/// One task at a time, asking on the terminal. Prompts go to stderr so records can be piped.
fn run_interactive(tasks: &[Task], ctx: &BatchContext) -> CliResult<Vec<SessionRecord>> {
    let cancel = CancellationToken::new();
    let stdin = io::stdin();
    let mut oracle = InteractiveOracle::new(stdin.lock(), io::stderr());
    let mut records = Vec::with_capacity(tasks.len());
    for task in tasks {
        let mut executor = match (ctx.executors)(task) {
            Ok(executor) => executor,
            Err(e) => {
                records.push(SessionRecord::skipped(&task.id, format!("failed to start sandbox: {e}")));
                continue;
            }
        };
        let mut generator = ctx.generator();
        eprintln!("== task {} ==", task.id);
        let record = pipeline::run_task(task, &mut executor, &mut generator, &mut oracle, &ctx.config, &cancel)
            .map_err(cancelled)?;
        records.push(record);
    }
    Ok(records)
}

fn write_records(records: &[SessionRecord], output: Option<&Path>) -> CliResult<()> {
    let mut out: Box<dyn Write> = match output {
        Some(path) => Box::new(BufWriter::new(fs::File::create(path).map_err(|e| {
            CliError::failure(format!("Error creating output file '{}': {}", path.display(), e))
        })?)),
        None => Box::new(io::stdout().lock()),
    };
    for record in records {
        let line = serde_json::to_string(record)
            .map_err(|e| CliError::failure(format!("Error serializing record: {}", e)))?;
        writeln!(out, "{}", line).map_err(|e| CliError::failure(format!("Error writing records: {}", e)))?;
    }
    out.flush()
        .map_err(|e| CliError::failure(format!("Error writing records: {}", e)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::rank::TestRankStrategy;

    fn temp_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("candor-cli-{}-{}", std::process::id(), name));
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_run_config_applies_overrides() {
        let args = RunArgs {
            jobs: Some(3),
            max_queries: Some(2),
            test_rank: Some(TestRankStrategy::Ideal),
            seed: Some(9),
            baseline: true,
            ..RunArgs::default()
        };
        let config = run_config(&args).unwrap();
        assert_eq!(config.pipeline.jobs, 3);
        assert_eq!(config.session.max_queries, 2);
        assert_eq!(config.rank.tests, Some(TestRankStrategy::Ideal));
        assert_eq!(config.rank.seed, 9);
        assert!(config.pipeline.baseline);
    }

    #[test]
    fn test_run_config_rejects_zero_jobs() {
        let args = RunArgs {
            jobs: Some(0),
            ..RunArgs::default()
        };
        assert!(run_config(&args).is_err());
    }

    #[test]
    fn test_read_source_missing_file() {
        let err = read_source(Path::new("/nonexistent/test.py")).unwrap_err();
        assert!(err.message.contains("Cannot access file"));
        assert_eq!(err.exit_code, ExitCode::FAILURE);
    }

    #[test]
    fn test_normalize_drops_placeholders() {
        let path = temp_file("placeholder.py", "def test_f():\n    pass\n");
        let err = normalize_test(&path, false, AssertionChoice::First, 0).unwrap_err();
        assert!(err.message.contains("dropped"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_parse_file_reports_syntax_errors() {
        let path = temp_file("broken.py", "def f(:\n");
        assert!(parse_file(&path).is_err());
        let _ = fs::remove_file(path);
    }
}
