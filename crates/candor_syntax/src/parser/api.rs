/// Parse a token stream into a [`Module`].
///
/// This is the main public entrypoint for parsing.
///
/// ## Parameters
/// - `tokens`: Token stream produced by `candor_syntax::lexer`.
///
/// ## Errors
/// Returns `Err(Vec<SyntaxError>)` if parsing fails.
#[tracing::instrument(skip_all, fields(token_count = tokens.len()))]
pub fn parse(tokens: &[Token]) -> Result<Module, Vec<SyntaxError>> {
    Parser::new(tokens).parse()
}

/// Lex and parse source text in one step.
pub fn parse_source(source: &str) -> Result<Module, Vec<SyntaxError>> {
    let tokens = crate::lexer::lex(source)?;
    parse(&tokens)
}

/// Parse source text that must hold exactly one expression (e.g. a captured literal).
pub fn parse_expression(source: &str) -> Result<Spanned<Expr>, Vec<SyntaxError>> {
    let module = parse_source(source)?;
    match module.body.as_slice() {
        [Spanned {
            node: Stmt::Expr(expr), ..
        }] => Ok(expr.clone()),
        _ => Err(vec![SyntaxError::new(
            "expected a single expression",
            Span::new(0, source.len()),
        )]),
    }
}
