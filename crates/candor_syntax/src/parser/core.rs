/// Parser core types and entrypoint.
///
/// This chunk defines the [`Parser`] type and its top-level `parse()` entrypoint.
///
/// ## Notes
/// - This file is `include!`'d into `crate::parser` to keep all parser methods in a
///   single module.
type StmtResult = Result<Spanned<Stmt>, SyntaxError>;
type ExprResult = Result<Spanned<Expr>, SyntaxError>;

/// Parser state.
///
/// ## Notes
/// - The parser is single-pass. After an error it synchronizes at the next logical line and keeps
///   going so that one run reports every independent problem.
pub struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    errors: Vec<SyntaxError>,
}

impl<'a> Parser<'a> {
    /// Create a new parser for a token stream.
    ///
    /// ## Parameters
    /// - `tokens`: Token stream produced by `candor_syntax::lexer` (must end with `Eof`).
    pub fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            pos: 0,
            errors: Vec::new(),
        }
    }

    /// Parse the entire token stream into a [`Module`].
    ///
    /// ## Errors
    /// Returns every [`SyntaxError`] encountered.
    pub fn parse(mut self) -> Result<Module, Vec<SyntaxError>> {
        let mut body = Vec::new();

        if self.tokens.is_empty() {
            return Ok(Module { body });
        }

        self.skip_newlines();

        while !self.is_at_end() {
            if self.check(&TokenKind::Indent) {
                self.errors.push(SyntaxError::new("unexpected indent", self.current_span()));
                self.synchronize();
            } else {
                match self.statement() {
                    Ok(stmts) => body.extend(stmts),
                    Err(e) => {
                        self.errors.push(e);
                        self.synchronize();
                    }
                }
            }
            self.skip_newlines();
            // Recovery can leave us positioned on layout tokens that belong to an abandoned block.
            self.skip_dedents();
        }

        if self.errors.is_empty() {
            Ok(Module { body })
        } else {
            Err(self.errors)
        }
    }
}
