//! Diagnostics for lexing and parsing.
//!
//! Syntax errors are ordinary data for the engine (an unparseable test is dropped, not surfaced),
//! but the CLI renders them with source highlighting through `miette`.

use crate::ast::Span;
use miette::{Diagnostic, GraphicalReportHandler, GraphicalTheme, NamedSource, Report, SourceSpan};
use thiserror::Error;

/// A lexing or parsing error with location information.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[error("{message}")]
#[diagnostic(code(candor::syntax))]
pub struct SyntaxError {
    pub message: String,
    pub span: Span,
    #[label("here")]
    label: SourceSpan,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
            label: SourceSpan::new(span.start.into(), span.end.saturating_sub(span.start)),
        }
    }
}

/// Render errors against their source as a plain-text (uncoloured) report.
///
/// Falls back to `line:col: message` when an error's span does not fit the source.
pub fn render(name: &str, source: &str, errors: &[SyntaxError]) -> String {
    let handler = GraphicalReportHandler::new_themed(GraphicalTheme::unicode_nocolor());
    let mut out = String::new();
    for error in errors {
        let report = Report::new(error.clone()).with_source_code(NamedSource::new(name, source.to_string()));
        let mut rendered = String::new();
        if error.span.end <= source.len() && handler.render_report(&mut rendered, &*report).is_ok() {
            out.push_str(&rendered);
        } else {
            let (line, col) = line_col(source, error.span.start);
            out.push_str(&format!("{name}:{line}:{col}: {}\n", error.message));
        }
    }
    out
}

/// 1-based line and column of a byte offset.
pub fn line_col(source: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(source.len());
    let before = source.get(..offset).unwrap_or(source);
    let line = before.matches('\n').count() + 1;
    let col = before.rfind('\n').map_or(before.chars().count(), |nl| before[nl + 1..].chars().count()) + 1;
    (line, col)
}
