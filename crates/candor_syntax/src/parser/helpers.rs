/// Token-stream helpers and error recovery.
///
/// This chunk contains the low-level primitives used throughout parsing:
/// - Peeking/consuming tokens (`peek`, `advance`)
/// - Matching / expecting keywords, operators, and punctuation
/// - Layout handling (`skip_newlines`, `skip_dedents`)
/// - Error recovery (`synchronize`)
impl<'a> Parser<'a> {
    // ========================================================================
    // Helpers
    // ========================================================================

    /// Return `true` if the current token is [`TokenKind::Eof`].
    fn is_at_end(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }

    /// Return the current token without consuming it.
    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    /// Return the token after the current token without consuming it.
    fn peek_next(&self) -> &Token {
        &self.tokens[(self.pos + 1).min(self.tokens.len() - 1)]
    }

    /// The most recently consumed token (the current one if nothing was consumed yet).
    fn previous(&self) -> &Token {
        &self.tokens[self.pos.saturating_sub(1)]
    }

    /// Advance to the next token and return the token we just consumed.
    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.pos += 1;
        }
        self.previous()
    }

    /// Return `true` if the current token "matches" `kind`.
    ///
    /// ## Notes
    /// - For ID-carrying tokens (keywords/operators/punctuation), the IDs must match.
    /// - For data-bearing tokens (identifiers/literals), only the variant is compared.
    fn check(&self, kind: &TokenKind) -> bool {
        match (kind, &self.peek().kind) {
            (TokenKind::Keyword(k1), TokenKind::Keyword(k2)) => k1 == k2,
            (TokenKind::Operator(o1), TokenKind::Operator(o2)) => o1 == o2,
            (TokenKind::Punctuation(p1), TokenKind::Punctuation(p2)) => p1 == p2,
            _ => std::mem::discriminant(kind) == std::mem::discriminant(&self.peek().kind),
        }
    }

    fn check_keyword(&self, id: KeywordId) -> bool {
        self.peek().kind.is_keyword(id)
    }

    fn check_punct(&self, id: PunctuationId) -> bool {
        self.peek().kind.is_punctuation(id)
    }

    fn check_op(&self, id: OperatorId) -> bool {
        self.peek().kind.is_operator(id)
    }

    /// If the current token matches `kind`, consume it and return `true`.
    fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn match_keyword(&mut self, id: KeywordId) -> bool {
        if self.check_keyword(id) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn match_punct(&mut self, id: PunctuationId) -> bool {
        if self.check_punct(id) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn match_op(&mut self, id: OperatorId) -> bool {
        if self.check_op(id) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn unexpected(&self, msg: &str) -> SyntaxError {
        SyntaxError::new(
            format!("{}, found {}", msg, describe(&self.peek().kind)),
            self.current_span(),
        )
    }

    fn expect(&mut self, kind: &TokenKind, msg: &str) -> Result<&Token, SyntaxError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(msg))
        }
    }

    fn expect_keyword(&mut self, id: KeywordId, msg: &str) -> Result<&Token, SyntaxError> {
        if self.check_keyword(id) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(msg))
        }
    }

    fn expect_punct(&mut self, id: PunctuationId, msg: &str) -> Result<&Token, SyntaxError> {
        if self.check_punct(id) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(msg))
        }
    }

    fn skip_newlines(&mut self) {
        while self.match_token(&TokenKind::Newline) {}
    }

    /// Skip stray DEDENT tokens at the current position.
    fn skip_dedents(&mut self) {
        while self.match_token(&TokenKind::Dedent) {}
    }

    /// Skip to just past the end of the current logical line.
    fn synchronize(&mut self) {
        self.advance();
        while !self.is_at_end() {
            if self.previous().kind == TokenKind::Newline {
                return;
            }
            self.advance();
        }
    }

    fn current_span(&self) -> Span {
        self.peek().span
    }

    /// End offset of the last consumed token that is not layout.
    ///
    /// Block statements end on a `Dedent` whose span sits on the following line; statement spans
    /// must stop at the last real token instead.
    fn last_content_end(&self) -> usize {
        self.tokens[..self.pos.min(self.tokens.len())]
            .iter()
            .rev()
            .find(|t| !t.kind.is_layout())
            .map_or(0, |t| t.span.end)
    }

    /// Return `true` at the end of a simple statement (`;`, newline, or EOF).
    fn at_simple_stmt_end(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Newline | TokenKind::Eof | TokenKind::Dedent)
            || self.check_punct(PunctuationId::Semicolon)
    }

    /// Check if the current token can start an expression
    fn is_at_expr_start(&self) -> bool {
        match &self.peek().kind {
            TokenKind::Ident(_) | TokenKind::Number(_) | TokenKind::Str(_) => true,
            TokenKind::Keyword(id) => matches!(
                id,
                KeywordId::True
                    | KeywordId::False
                    | KeywordId::None
                    | KeywordId::Not
                    | KeywordId::Lambda
                    | KeywordId::Await
                    | KeywordId::Yield
            ),
            TokenKind::Operator(id) => matches!(id, OperatorId::Minus | OperatorId::Plus | OperatorId::Tilde | OperatorId::Star | OperatorId::StarStar),
            TokenKind::Punctuation(id) => matches!(
                id,
                PunctuationId::LParen | PunctuationId::LBracket | PunctuationId::LBrace | PunctuationId::Ellipsis
            ),
            _ => false,
        }
    }
}
