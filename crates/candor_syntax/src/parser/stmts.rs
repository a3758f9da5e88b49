/// Statement parsing methods.
///
/// This chunk parses compound statements (`def`, `class`, `if`, `while`, `for`, `try`, `with`),
/// simple statements (including `;`-separated runs on one line) and indentation-based blocks.
///
/// ## Notes
/// - Block parsing relies on `Indent` / `Dedent` layout tokens produced by the lexer.
/// - Statement spans run from the first token to the last non-layout token consumed.
impl<'a> Parser<'a> {
    // ========================================================================
    // Statements
    // ========================================================================

    /// Parse one logical line (simple statements) or one compound statement.
    fn statement(&mut self) -> Result<Vec<Spanned<Stmt>>, SyntaxError> {
        if self.check_punct(PunctuationId::At)
            || self.check_keyword(KeywordId::Def)
            || self.check_keyword(KeywordId::Class)
            || self.check_keyword(KeywordId::If)
            || self.check_keyword(KeywordId::While)
            || self.check_keyword(KeywordId::For)
            || self.check_keyword(KeywordId::Try)
            || self.check_keyword(KeywordId::With)
            || self.check_keyword(KeywordId::Async)
        {
            Ok(vec![self.compound_stmt()?])
        } else {
            self.simple_stmts()
        }
    }

    /// Parse the suite after a `:`: an indented block, or simple statements on the same line.
    fn block(&mut self) -> Result<Vec<Spanned<Stmt>>, SyntaxError> {
        self.expect_punct(PunctuationId::Colon, "expected ':'")?;
        if !self.match_token(&TokenKind::Newline) {
            return self.simple_stmts();
        }
        self.expect(&TokenKind::Indent, "expected an indented block")?;
        let mut stmts = Vec::new();
        self.skip_newlines();
        while !self.check(&TokenKind::Dedent) && !self.is_at_end() {
            stmts.extend(self.statement()?);
            self.skip_newlines();
        }
        self.match_token(&TokenKind::Dedent);
        Ok(stmts)
    }

    fn finish(&self, stmt: Stmt, start: usize) -> Spanned<Stmt> {
        Spanned::new(stmt, Span::new(start, self.last_content_end().max(start)))
    }

    // ------------------------------------------------------------------------
    // Compound statements
    // ------------------------------------------------------------------------

    fn compound_stmt(&mut self) -> StmtResult {
        let start = self.current_span().start;

        let mut decorators = Vec::new();
        while self.match_punct(PunctuationId::At) {
            decorators.push(self.named_expression()?);
            self.expect(&TokenKind::Newline, "expected newline after decorator")?;
            self.skip_newlines();
        }

        let is_async = self.match_keyword(KeywordId::Async);

        let stmt = if self.check_keyword(KeywordId::Def) {
            Stmt::FunctionDef(self.function_def(decorators, is_async)?)
        } else if !decorators.is_empty() {
            if is_async {
                return Err(self.unexpected("expected 'def' after 'async'"));
            }
            Stmt::ClassDef(self.class_def(decorators)?)
        } else if is_async && self.check_keyword(KeywordId::For) {
            self.for_stmt(true)?
        } else if is_async && self.check_keyword(KeywordId::With) {
            self.with_stmt(true)?
        } else if is_async {
            return Err(self.unexpected("expected 'def', 'for' or 'with' after 'async'"));
        } else if self.check_keyword(KeywordId::Class) {
            Stmt::ClassDef(self.class_def(decorators)?)
        } else if self.check_keyword(KeywordId::If) || self.check_keyword(KeywordId::Elif) {
            self.if_stmt()?
        } else if self.check_keyword(KeywordId::While) {
            self.while_stmt()?
        } else if self.check_keyword(KeywordId::For) {
            self.for_stmt(false)?
        } else if self.check_keyword(KeywordId::Try) {
            self.try_stmt()?
        } else {
            self.with_stmt(false)?
        };

        Ok(self.finish(stmt, start))
    }

    fn function_def(&mut self, decorators: Vec<Spanned<Expr>>, is_async: bool) -> Result<FunctionDef, SyntaxError> {
        self.expect_keyword(KeywordId::Def, "expected 'def'")?;
        let name = self.identifier()?;
        self.expect_punct(PunctuationId::LParen, "expected '(' after function name")?;
        let params = self.parameters(PunctuationId::RParen, true)?;
        self.expect_punct(PunctuationId::RParen, "expected ')' after parameters")?;
        let returns = if self.match_punct(PunctuationId::Arrow) {
            Some(self.expression()?)
        } else {
            None
        };
        let body = self.block()?;
        Ok(FunctionDef {
            name,
            is_async,
            decorators,
            params,
            returns,
            body,
        })
    }

    fn class_def(&mut self, decorators: Vec<Spanned<Expr>>) -> Result<ClassDef, SyntaxError> {
        self.expect_keyword(KeywordId::Class, "expected 'class'")?;
        let name = self.identifier()?;
        let bases = if self.match_punct(PunctuationId::LParen) {
            let args = self.call_args()?;
            self.expect_punct(PunctuationId::RParen, "expected ')' after base classes")?;
            args
        } else {
            Vec::new()
        };
        let body = self.block()?;
        Ok(ClassDef {
            name,
            decorators,
            bases,
            body,
        })
    }

    /// Parse `if` / `elif` (the current token) and its chain.
    fn if_stmt(&mut self) -> Result<Stmt, SyntaxError> {
        self.advance();
        let test = self.named_expression()?;
        let body = self.block()?;

        let orelse = if self.check_keyword(KeywordId::Elif) {
            let start = self.current_span().start;
            let nested = self.if_stmt()?;
            vec![self.finish(nested, start)]
        } else if self.match_keyword(KeywordId::Else) {
            self.block()?
        } else {
            Vec::new()
        };

        Ok(Stmt::If { test, body, orelse })
    }

    fn while_stmt(&mut self) -> Result<Stmt, SyntaxError> {
        self.expect_keyword(KeywordId::While, "expected 'while'")?;
        let test = self.named_expression()?;
        let body = self.block()?;
        let orelse = if self.match_keyword(KeywordId::Else) {
            self.block()?
        } else {
            Vec::new()
        };
        Ok(Stmt::While { test, body, orelse })
    }

    fn for_stmt(&mut self, is_async: bool) -> Result<Stmt, SyntaxError> {
        self.expect_keyword(KeywordId::For, "expected 'for'")?;
        let target = self.target_list()?;
        self.expect_keyword(KeywordId::In, "expected 'in' in for statement")?;
        let iter = self.star_expressions()?;
        let body = self.block()?;
        let orelse = if self.match_keyword(KeywordId::Else) {
            self.block()?
        } else {
            Vec::new()
        };
        Ok(Stmt::For {
            is_async,
            target,
            iter,
            body,
            orelse,
        })
    }

    fn try_stmt(&mut self) -> Result<Stmt, SyntaxError> {
        self.expect_keyword(KeywordId::Try, "expected 'try'")?;
        let body = self.block()?;

        let mut handlers = Vec::new();
        while self.check_keyword(KeywordId::Except) {
            let start = self.current_span().start;
            self.advance();
            let (kind, name) = if self.check_punct(PunctuationId::Colon) {
                (None, None)
            } else {
                let kind = self.expression()?;
                let name = if self.match_keyword(KeywordId::As) {
                    Some(self.identifier()?)
                } else {
                    None
                };
                (Some(kind), name)
            };
            let body = self.block()?;
            handlers.push(ExceptHandler {
                span: Span::new(start, self.last_content_end()),
                kind,
                name,
                body,
            });
        }

        let orelse = if !handlers.is_empty() && self.match_keyword(KeywordId::Else) {
            self.block()?
        } else {
            Vec::new()
        };
        let finalbody = if self.match_keyword(KeywordId::Finally) {
            self.block()?
        } else {
            Vec::new()
        };

        if handlers.is_empty() && finalbody.is_empty() {
            return Err(self.unexpected("expected 'except' or 'finally' block"));
        }

        Ok(Stmt::Try {
            body,
            handlers,
            orelse,
            finalbody,
        })
    }

    fn with_stmt(&mut self, is_async: bool) -> Result<Stmt, SyntaxError> {
        self.expect_keyword(KeywordId::With, "expected 'with'")?;
        let mut items = Vec::new();
        loop {
            let context = self.expression()?;
            let alias = if self.match_keyword(KeywordId::As) {
                let target = self.star_target()?;
                self.validate_target(&target)?;
                Some(target)
            } else {
                None
            };
            items.push(WithItem { context, alias });
            if !self.match_punct(PunctuationId::Comma) {
                break;
            }
        }
        let body = self.block()?;
        Ok(Stmt::With { is_async, items, body })
    }

    // ------------------------------------------------------------------------
    // Simple statements
    // ------------------------------------------------------------------------

    /// `simple_stmt (';' simple_stmt)* [';'] NEWLINE`
    fn simple_stmts(&mut self) -> Result<Vec<Spanned<Stmt>>, SyntaxError> {
        let mut stmts = vec![self.simple_stmt()?];
        while self.match_punct(PunctuationId::Semicolon) {
            if matches!(self.peek().kind, TokenKind::Newline | TokenKind::Eof) {
                break;
            }
            stmts.push(self.simple_stmt()?);
        }
        if !self.match_token(&TokenKind::Newline) && !self.is_at_end() && !self.check(&TokenKind::Dedent) {
            return Err(self.unexpected("expected end of statement"));
        }
        Ok(stmts)
    }

    fn simple_stmt(&mut self) -> StmtResult {
        let start = self.current_span().start;

        let stmt = if self.match_keyword(KeywordId::Pass) {
            Stmt::Pass
        } else if self.match_keyword(KeywordId::Break) {
            Stmt::Break
        } else if self.match_keyword(KeywordId::Continue) {
            Stmt::Continue
        } else if self.match_keyword(KeywordId::Return) {
            let value = if self.at_simple_stmt_end() {
                None
            } else {
                Some(self.star_expressions()?)
            };
            Stmt::Return(value)
        } else if self.match_keyword(KeywordId::Assert) {
            let test = self.expression()?;
            let msg = if self.match_punct(PunctuationId::Comma) {
                Some(self.expression()?)
            } else {
                None
            };
            Stmt::Assert { test, msg }
        } else if self.match_keyword(KeywordId::Raise) {
            let (exc, cause) = if self.at_simple_stmt_end() {
                (None, None)
            } else {
                let exc = self.expression()?;
                let cause = if self.match_keyword(KeywordId::From) {
                    Some(self.expression()?)
                } else {
                    None
                };
                (Some(exc), cause)
            };
            Stmt::Raise { exc, cause }
        } else if self.match_keyword(KeywordId::Del) {
            let mut targets = vec![self.star_target()?];
            while self.match_punct(PunctuationId::Comma) {
                if self.at_simple_stmt_end() {
                    break;
                }
                targets.push(self.star_target()?);
            }
            for target in &targets {
                self.validate_target(target)?;
            }
            Stmt::Delete(targets)
        } else if self.match_keyword(KeywordId::Global) {
            Stmt::Global(self.identifier_list()?)
        } else if self.match_keyword(KeywordId::Nonlocal) {
            Stmt::Nonlocal(self.identifier_list()?)
        } else if self.check_keyword(KeywordId::Import) {
            self.import_stmt()?
        } else if self.check_keyword(KeywordId::From) {
            self.import_from_stmt()?
        } else {
            self.assignment_or_expr_stmt()?
        };

        Ok(self.finish(stmt, start))
    }

    fn import_stmt(&mut self) -> Result<Stmt, SyntaxError> {
        self.expect_keyword(KeywordId::Import, "expected 'import'")?;
        let mut names = Vec::new();
        loop {
            let name = self.dotted_name()?;
            let asname = if self.match_keyword(KeywordId::As) {
                Some(self.identifier()?)
            } else {
                None
            };
            names.push(Alias { name, asname });
            if !self.match_punct(PunctuationId::Comma) {
                break;
            }
        }
        Ok(Stmt::Import(names))
    }

    fn import_from_stmt(&mut self) -> Result<Stmt, SyntaxError> {
        self.expect_keyword(KeywordId::From, "expected 'from'")?;

        let mut level = 0;
        loop {
            if self.match_punct(PunctuationId::Dot) {
                level += 1;
            } else if self.match_punct(PunctuationId::Ellipsis) {
                level += 3;
            } else {
                break;
            }
        }
        let module = if self.check_keyword(KeywordId::Import) && level > 0 {
            None
        } else {
            Some(self.dotted_name()?)
        };
        self.expect_keyword(KeywordId::Import, "expected 'import'")?;

        if self.match_op(OperatorId::Star) {
            return Ok(Stmt::ImportFrom {
                module,
                level,
                names: vec![Alias {
                    name: "*".to_string(),
                    asname: None,
                }],
            });
        }

        let parenthesized = self.match_punct(PunctuationId::LParen);
        let mut names = Vec::new();
        loop {
            let name = self.identifier()?;
            let asname = if self.match_keyword(KeywordId::As) {
                Some(self.identifier()?)
            } else {
                None
            };
            names.push(Alias { name, asname });
            if !self.match_punct(PunctuationId::Comma) {
                break;
            }
            if parenthesized && self.check_punct(PunctuationId::RParen) {
                break;
            }
        }
        if parenthesized {
            self.expect_punct(PunctuationId::RParen, "expected ')' after imported names")?;
        }

        Ok(Stmt::ImportFrom { module, level, names })
    }

    /// Expression statement, assignment (`=` chains), augmented or annotated assignment.
    fn assignment_or_expr_stmt(&mut self) -> Result<Stmt, SyntaxError> {
        let first = if self.check_keyword(KeywordId::Yield) {
            self.yield_expr()?
        } else {
            self.star_expressions()?
        };

        // Annotated assignment: `x: int = 1`
        if self.match_punct(PunctuationId::Colon) {
            if !matches!(
                first.node.unparenthesized(),
                Expr::Name(_) | Expr::Attribute { .. } | Expr::Subscript { .. }
            ) {
                return Err(SyntaxError::new("illegal target for annotation", first.span));
            }
            let annotation = self.expression()?;
            let value = if self.match_op(OperatorId::Eq) {
                Some(self.assignment_value()?)
            } else {
                None
            };
            return Ok(Stmt::AnnAssign {
                target: first,
                annotation,
                value,
            });
        }

        // Augmented assignment: `x += 1`
        if let Some(op) = self.peek().operator_id().and_then(augmented_binop) {
            self.advance();
            if !matches!(first.node, Expr::Name(_) | Expr::Attribute { .. } | Expr::Subscript { .. }) {
                return Err(SyntaxError::new(
                    "illegal expression for augmented assignment",
                    first.span,
                ));
            }
            let value = self.assignment_value()?;
            return Ok(Stmt::AugAssign {
                target: first,
                op,
                value,
            });
        }

        if !self.check_op(OperatorId::Eq) {
            return Ok(Stmt::Expr(first));
        }

        let mut targets = vec![first];
        while self.match_op(OperatorId::Eq) {
            targets.push(self.assignment_value()?);
        }
        let value = targets.pop().ok_or_else(|| self.unexpected("expected assignment value"))?;
        for target in &targets {
            self.validate_target(target)?;
        }
        Ok(Stmt::Assign { targets, value })
    }

    fn assignment_value(&mut self) -> ExprResult {
        if self.check_keyword(KeywordId::Yield) {
            self.yield_expr()
        } else {
            self.star_expressions()
        }
    }

    /// Reject expressions that cannot be assigned to.
    fn validate_target(&self, target: &Spanned<Expr>) -> Result<(), SyntaxError> {
        match &target.node {
            Expr::Name(_) | Expr::Attribute { .. } | Expr::Subscript { .. } => Ok(()),
            Expr::Starred(inner) | Expr::Paren(inner) => self.validate_target(inner),
            Expr::Tuple(items) | Expr::List(items) => items.iter().try_for_each(|item| self.validate_target(item)),
            other => Err(SyntaxError::new(
                format!("cannot assign to {}", expr_kind_name(other)),
                target.span,
            )),
        }
    }
}
