//! Composition of runnable sources.
//!
//! A run unit is `preamble + program + test + invocation`; an evaluation unit is
//! `preamble + context + assignments + "_result_ = <expr>"`. Both are plain text handed to a
//! [`super::Sandbox`].

use candor_core::conventions::{CHECK_PROTOCOL_NAME, PREAMBLE, RESULT_BINDING};
use candor_syntax::parse_source;

use crate::config::SandboxConfig;

/// Statement that invokes the test for `entry_name`.
///
/// Tests written against the `check(candidate)` protocol are called with the entry point as the
/// argument; everything else calls the prefixed test procedure.
pub fn invocation(test: &str, entry_name: &str, config: &SandboxConfig) -> String {
    if config.check_protocol && defines_check_procedure(test) {
        format!("{CHECK_PROTOCOL_NAME}({entry_name})")
    } else {
        format!("{}{entry_name}()", config.test_prefix)
    }
}

/// Whether `test` defines a top-level `check` procedure.
///
/// Unparseable tests are judged by their lines instead.
fn defines_check_procedure(test: &str) -> bool {
    match parse_source(test) {
        Ok(module) => module.functions().any(|def| def.name == CHECK_PROTOCOL_NAME),
        Err(_) => {
            let header = format!("def {CHECK_PROTOCOL_NAME}(");
            test.lines().any(|line| line.starts_with(&header))
        }
    }
}

/// Compose the source that runs `test` against `program`.
pub fn compose_run(program: &str, test: &str, entry_name: &str, config: &SandboxConfig) -> String {
    let mut source = preamble(config);
    source.push_str(program);
    source.push('\n');
    source.push_str(test);
    source.push('\n');
    source.push_str(&invocation(test, entry_name, config));
    source.push('\n');
    source
}

/// Compose the unit that binds `expr` to the result binding after running `context` and
/// `assignments`.
pub fn compose_evaluation(context: &str, assignments: &[&str], expr: &str, config: &SandboxConfig) -> String {
    let mut source = preamble(config);
    source.push_str(context);
    source.push('\n');
    for assignment in assignments {
        source.push_str(assignment);
        source.push('\n');
    }
    source.push_str(RESULT_BINDING);
    source.push_str(" = ");
    source.push_str(expr);
    source.push('\n');
    source
}

fn preamble(config: &SandboxConfig) -> String {
    if config.include_preamble {
        PREAMBLE.to_string()
    } else {
        String::new()
    }
}
