/// Expression parsing methods.
///
/// This chunk implements the expression grammar using a precedence ladder:
/// lambda / conditional → `or` → `and` → `not` → comparison → `|` → `^` → `&` → shifts →
/// additive → multiplicative → unary → power → await → postfix → atom.
///
/// ## Notes
/// - Operator identities are carried by [`TokenKind::Operator`] / [`OperatorId`] rather than string spellings.
/// - Explicit parentheses are kept as [`Expr::Paren`] so spans and printed text follow the source.
impl<'a> Parser<'a> {
    // ========================================================================
    // Expression lists
    // ========================================================================

    /// `star_expression (',' star_expression)* [',']`, a bare tuple when a comma is present.
    fn star_expressions(&mut self) -> ExprResult {
        let first = self.star_expression()?;
        if !self.check_punct(PunctuationId::Comma) {
            return Ok(first);
        }
        let start = first.span.start;
        let mut items = vec![first];
        while self.match_punct(PunctuationId::Comma) {
            if !self.is_at_expr_start() {
                break;
            }
            items.push(self.star_expression()?);
        }
        let end = self.previous().span.end;
        Ok(Spanned::new(Expr::Tuple(items), Span::new(start, end)))
    }

    fn star_expression(&mut self) -> ExprResult {
        if self.check_op(OperatorId::Star) {
            let start = self.current_span().start;
            self.advance();
            let inner = self.bitor()?;
            let span = Span::new(start, inner.span.end);
            return Ok(Spanned::new(Expr::Starred(Box::new(inner)), span));
        }
        self.expression()
    }

    /// Assignment-target list for `for` loops and comprehensions. Stops before `in`.
    fn target_list(&mut self) -> ExprResult {
        let first = self.star_target()?;
        let target = if self.check_punct(PunctuationId::Comma) {
            let start = first.span.start;
            let mut items = vec![first];
            while self.match_punct(PunctuationId::Comma) {
                if self.check_keyword(KeywordId::In) {
                    break;
                }
                items.push(self.star_target()?);
            }
            let end = self.previous().span.end;
            Spanned::new(Expr::Tuple(items), Span::new(start, end))
        } else {
            first
        };
        self.validate_target(&target)?;
        Ok(target)
    }

    fn star_target(&mut self) -> ExprResult {
        if self.check_op(OperatorId::Star) {
            let start = self.current_span().start;
            self.advance();
            let inner = self.bitor()?;
            let span = Span::new(start, inner.span.end);
            return Ok(Spanned::new(Expr::Starred(Box::new(inner)), span));
        }
        self.bitor()
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    /// `NAME := expression` or a plain expression.
    fn named_expression(&mut self) -> ExprResult {
        if matches!(self.peek().kind, TokenKind::Ident(_)) && self.peek_next().kind.is_operator(OperatorId::ColonEq) {
            let start = self.current_span().start;
            let name = self.identifier()?;
            let target = Spanned::new(Expr::Name(name), self.previous().span);
            self.advance(); // :=
            let value = self.expression()?;
            let span = Span::new(start, value.span.end);
            return Ok(Spanned::new(
                Expr::NamedExpr {
                    target: Box::new(target),
                    value: Box::new(value),
                },
                span,
            ));
        }
        self.expression()
    }

    fn expression(&mut self) -> ExprResult {
        if self.check_keyword(KeywordId::Lambda) {
            return self.lambda();
        }

        let body = self.or_test()?;
        if !self.match_keyword(KeywordId::If) {
            return Ok(body);
        }
        let test = self.or_test()?;
        self.expect_keyword(KeywordId::Else, "expected 'else' in conditional expression")?;
        let orelse = self.expression()?;
        let span = body.span.merge(orelse.span);
        Ok(Spanned::new(
            Expr::IfExp {
                test: Box::new(test),
                body: Box::new(body),
                orelse: Box::new(orelse),
            },
            span,
        ))
    }

    fn lambda(&mut self) -> ExprResult {
        let start = self.current_span().start;
        self.expect_keyword(KeywordId::Lambda, "expected 'lambda'")?;
        let params = self.parameters(PunctuationId::Colon, false)?;
        self.expect_punct(PunctuationId::Colon, "expected ':' after lambda parameters")?;
        let body = self.expression()?;
        let span = Span::new(start, body.span.end);
        Ok(Spanned::new(
            Expr::Lambda {
                params,
                body: Box::new(body),
            },
            span,
        ))
    }

    fn or_test(&mut self) -> ExprResult {
        self.bool_op(KeywordId::Or, BoolOp::Or, Self::and_test)
    }

    fn and_test(&mut self) -> ExprResult {
        self.bool_op(KeywordId::And, BoolOp::And, Self::not_test)
    }

    fn bool_op(&mut self, keyword: KeywordId, op: BoolOp, operand: fn(&mut Self) -> ExprResult) -> ExprResult {
        let first = operand(self)?;
        if !self.check_keyword(keyword) {
            return Ok(first);
        }
        let mut values = vec![first];
        while self.match_keyword(keyword) {
            values.push(operand(self)?);
        }
        let span = values[0].span.merge(values[values.len() - 1].span);
        Ok(Spanned::new(Expr::BoolOp { op, values }, span))
    }

    fn not_test(&mut self) -> ExprResult {
        if self.match_keyword(KeywordId::Not) {
            let start = self.previous().span.start;
            let operand = self.not_test()?;
            let span = Span::new(start, operand.span.end);
            Ok(Spanned::new(
                Expr::UnaryOp {
                    op: UnaryOp::Not,
                    operand: Box::new(operand),
                },
                span,
            ))
        } else {
            self.comparison()
        }
    }

    fn comparison(&mut self) -> ExprResult {
        let left = self.bitor()?;
        let mut ops = Vec::new();
        let mut comparators = Vec::new();

        loop {
            let op = if self.match_op(OperatorId::EqEq) {
                CmpOp::Eq
            } else if self.match_op(OperatorId::NotEq) {
                CmpOp::NotEq
            } else if self.match_op(OperatorId::Lt) {
                CmpOp::Lt
            } else if self.match_op(OperatorId::LtEq) {
                CmpOp::LtE
            } else if self.match_op(OperatorId::Gt) {
                CmpOp::Gt
            } else if self.match_op(OperatorId::GtEq) {
                CmpOp::GtE
            } else if self.match_keyword(KeywordId::In) {
                CmpOp::In
            } else if self.check_keyword(KeywordId::Not) && self.peek_next().kind.is_keyword(KeywordId::In) {
                self.advance(); // not
                self.advance(); // in
                CmpOp::NotIn
            } else if self.match_keyword(KeywordId::Is) {
                if self.match_keyword(KeywordId::Not) {
                    CmpOp::IsNot
                } else {
                    CmpOp::Is
                }
            } else {
                break;
            };
            ops.push(op);
            comparators.push(self.bitor()?);
        }

        if ops.is_empty() {
            return Ok(left);
        }
        let span = left.span.merge(comparators[comparators.len() - 1].span);
        Ok(Spanned::new(
            Expr::Compare {
                left: Box::new(left),
                ops,
                comparators,
            },
            span,
        ))
    }

    /// Left-associative binary level: `operand (op operand)*` for the given operator table.
    fn binary_level(&mut self, table: &[(OperatorId, BinOp)], operand: fn(&mut Self) -> ExprResult) -> ExprResult {
        let mut left = operand(self)?;
        'outer: loop {
            for (id, op) in table {
                if self.match_op(*id) {
                    let right = operand(self)?;
                    let span = left.span.merge(right.span);
                    left = Spanned::new(
                        Expr::BinOp {
                            left: Box::new(left),
                            op: *op,
                            right: Box::new(right),
                        },
                        span,
                    );
                    continue 'outer;
                }
            }
            break;
        }
        Ok(left)
    }

    fn bitor(&mut self) -> ExprResult {
        self.binary_level(&[(OperatorId::Pipe, BinOp::BitOr)], Self::bitxor)
    }

    fn bitxor(&mut self) -> ExprResult {
        self.binary_level(&[(OperatorId::Caret, BinOp::BitXor)], Self::bitand)
    }

    fn bitand(&mut self) -> ExprResult {
        self.binary_level(&[(OperatorId::Amp, BinOp::BitAnd)], Self::shift)
    }

    fn shift(&mut self) -> ExprResult {
        self.binary_level(
            &[(OperatorId::LShift, BinOp::LShift), (OperatorId::RShift, BinOp::RShift)],
            Self::additive,
        )
    }

    fn additive(&mut self) -> ExprResult {
        self.binary_level(
            &[(OperatorId::Plus, BinOp::Add), (OperatorId::Minus, BinOp::Sub)],
            Self::multiplicative,
        )
    }

    fn multiplicative(&mut self) -> ExprResult {
        let mut left = self.factor()?;
        loop {
            let op = if self.match_op(OperatorId::Star) {
                BinOp::Mul
            } else if self.match_op(OperatorId::SlashSlash) {
                BinOp::FloorDiv
            } else if self.match_op(OperatorId::Slash) {
                BinOp::Div
            } else if self.match_op(OperatorId::Percent) {
                BinOp::Mod
            } else if self.match_punct(PunctuationId::At) {
                BinOp::MatMul
            } else {
                break;
            };
            let right = self.factor()?;
            let span = left.span.merge(right.span);
            left = Spanned::new(
                Expr::BinOp {
                    left: Box::new(left),
                    op,
                    right: Box::new(right),
                },
                span,
            );
        }
        Ok(left)
    }

    /// Unary `+`, `-`, `~`.
    fn factor(&mut self) -> ExprResult {
        let op = if self.check_op(OperatorId::Minus) {
            UnaryOp::Neg
        } else if self.check_op(OperatorId::Plus) {
            UnaryOp::Pos
        } else if self.check_op(OperatorId::Tilde) {
            UnaryOp::Invert
        } else {
            return self.power();
        };
        let start = self.current_span().start;
        self.advance();
        let operand = self.factor()?;
        let span = Span::new(start, operand.span.end);
        Ok(Spanned::new(
            Expr::UnaryOp {
                op,
                operand: Box::new(operand),
            },
            span,
        ))
    }

    fn power(&mut self) -> ExprResult {
        let base = self.await_primary()?;
        // Right-associative, and binds tighter than a unary operator on its left: -2**2 == -(2**2)
        if self.match_op(OperatorId::StarStar) {
            let exponent = self.factor()?;
            let span = base.span.merge(exponent.span);
            return Ok(Spanned::new(
                Expr::BinOp {
                    left: Box::new(base),
                    op: BinOp::Pow,
                    right: Box::new(exponent),
                },
                span,
            ));
        }
        Ok(base)
    }

    fn await_primary(&mut self) -> ExprResult {
        if self.match_keyword(KeywordId::Await) {
            let start = self.previous().span.start;
            let inner = self.primary()?;
            let span = Span::new(start, inner.span.end);
            return Ok(Spanned::new(Expr::Await(Box::new(inner)), span));
        }
        self.primary()
    }

    /// Atom followed by attribute access, calls and subscripts.
    fn primary(&mut self) -> ExprResult {
        let mut expr = self.atom()?;

        loop {
            if self.match_punct(PunctuationId::Dot) {
                let attr = self.identifier()?;
                let span = Span::new(expr.span.start, self.previous().span.end);
                expr = Spanned::new(
                    Expr::Attribute {
                        value: Box::new(expr),
                        attr,
                    },
                    span,
                );
            } else if self.match_punct(PunctuationId::LParen) {
                let args = self.call_args()?;
                self.expect_punct(PunctuationId::RParen, "expected ')' after arguments")?;
                let span = Span::new(expr.span.start, self.previous().span.end);
                expr = Spanned::new(
                    Expr::Call {
                        func: Box::new(expr),
                        args,
                    },
                    span,
                );
            } else if self.match_punct(PunctuationId::LBracket) {
                let index = self.subscript()?;
                self.expect_punct(PunctuationId::RBracket, "expected ']' after subscript")?;
                let span = Span::new(expr.span.start, self.previous().span.end);
                expr = Spanned::new(
                    Expr::Subscript {
                        value: Box::new(expr),
                        index: Box::new(index),
                    },
                    span,
                );
            } else {
                break;
            }
        }

        Ok(expr)
    }

    /// Subscript contents: an index, a slice, or a comma-separated tuple of either.
    fn subscript(&mut self) -> ExprResult {
        let first = self.slice_item()?;
        if !self.check_punct(PunctuationId::Comma) {
            return Ok(first);
        }
        let start = first.span.start;
        let mut items = vec![first];
        while self.match_punct(PunctuationId::Comma) {
            if self.check_punct(PunctuationId::RBracket) {
                break;
            }
            items.push(self.slice_item()?);
        }
        let end = self.previous().span.end;
        Ok(Spanned::new(Expr::Tuple(items), Span::new(start, end)))
    }

    fn slice_item(&mut self) -> ExprResult {
        let start = self.current_span().start;

        let lower = if self.check_punct(PunctuationId::Colon) {
            None
        } else {
            let item = if self.check_op(OperatorId::Star) {
                self.star_expression()?
            } else {
                self.named_expression()?
            };
            if !self.check_punct(PunctuationId::Colon) {
                return Ok(item);
            }
            Some(Box::new(item))
        };

        self.expect_punct(PunctuationId::Colon, "expected ':' in slice")?;
        let upper = if self.is_slice_bound_start() {
            Some(Box::new(self.expression()?))
        } else {
            None
        };
        let step = if self.match_punct(PunctuationId::Colon) && self.is_slice_bound_start() {
            Some(Box::new(self.expression()?))
        } else {
            None
        };

        let end = self.previous().span.end;
        Ok(Spanned::new(Expr::Slice { lower, upper, step }, Span::new(start, end)))
    }

    fn is_slice_bound_start(&self) -> bool {
        !self.check_punct(PunctuationId::Colon)
            && !self.check_punct(PunctuationId::RBracket)
            && !self.check_punct(PunctuationId::Comma)
    }

    /// Arguments between call parentheses (the `(` is already consumed).
    fn call_args(&mut self) -> Result<Vec<Arg>, SyntaxError> {
        let mut args = Vec::new();

        while !self.check_punct(PunctuationId::RParen) {
            if self.match_op(OperatorId::StarStar) {
                args.push(Arg::DoubleStarred(self.expression()?));
            } else if self.match_op(OperatorId::Star) {
                args.push(Arg::Starred(self.expression()?));
            } else if matches!(self.peek().kind, TokenKind::Ident(_)) && self.peek_next().kind.is_operator(OperatorId::Eq) {
                let name = self.identifier()?;
                self.advance(); // =
                args.push(Arg::Keyword(name, self.expression()?));
            } else {
                let value = self.named_expression()?;
                if self.check_keyword(KeywordId::For) || self.check_keyword(KeywordId::Async) {
                    let start = value.span.start;
                    let generators = self.comprehension_clauses()?;
                    let end = self.previous().span.end;
                    args.push(Arg::Positional(Spanned::new(
                        Expr::GeneratorExp {
                            elt: Box::new(value),
                            generators,
                        },
                        Span::new(start, end),
                    )));
                } else {
                    args.push(Arg::Positional(value));
                }
            }

            if !self.match_punct(PunctuationId::Comma) {
                break;
            }
        }

        Ok(args)
    }

    /// Parameter list for `def` (with annotations) or `lambda` (without), up to `terminator`.
    fn parameters(&mut self, terminator: PunctuationId, annotations: bool) -> Result<Vec<Param>, SyntaxError> {
        let mut params = Vec::new();

        while !self.check_punct(terminator) {
            let param = if self.match_op(OperatorId::Slash) {
                Param {
                    kind: ParamKind::PosOnlyMarker,
                    name: String::new(),
                    annotation: None,
                    default: None,
                }
            } else if self.match_op(OperatorId::StarStar) {
                let name = self.identifier()?;
                let annotation = self.param_annotation(annotations)?;
                Param {
                    kind: ParamKind::KwArgs,
                    name,
                    annotation,
                    default: None,
                }
            } else if self.match_op(OperatorId::Star) {
                if matches!(self.peek().kind, TokenKind::Ident(_)) {
                    let name = self.identifier()?;
                    let annotation = self.param_annotation(annotations)?;
                    Param {
                        kind: ParamKind::VarArgs,
                        name,
                        annotation,
                        default: None,
                    }
                } else {
                    Param {
                        kind: ParamKind::KwOnlyMarker,
                        name: String::new(),
                        annotation: None,
                        default: None,
                    }
                }
            } else {
                let name = self.identifier()?;
                let annotation = self.param_annotation(annotations)?;
                let default = if self.match_op(OperatorId::Eq) {
                    Some(self.expression()?)
                } else {
                    None
                };
                Param {
                    kind: ParamKind::Regular,
                    name,
                    annotation,
                    default,
                }
            };
            params.push(param);

            if !self.match_punct(PunctuationId::Comma) {
                break;
            }
        }

        Ok(params)
    }

    fn param_annotation(&mut self, annotations: bool) -> Result<Option<Spanned<Expr>>, SyntaxError> {
        if annotations && self.match_punct(PunctuationId::Colon) {
            Ok(Some(self.expression()?))
        } else {
            Ok(None)
        }
    }

    /// One or more `[async] for target in iter (if cond)*` clauses.
    fn comprehension_clauses(&mut self) -> Result<Vec<Comprehension>, SyntaxError> {
        let mut generators = Vec::new();
        while self.check_keyword(KeywordId::For) || self.check_keyword(KeywordId::Async) {
            let is_async = self.match_keyword(KeywordId::Async);
            self.expect_keyword(KeywordId::For, "expected 'for' in comprehension")?;
            let target = self.target_list()?;
            self.expect_keyword(KeywordId::In, "expected 'in' in comprehension")?;
            let iter = self.or_test()?;
            let mut ifs = Vec::new();
            while self.match_keyword(KeywordId::If) {
                ifs.push(self.or_test()?);
            }
            generators.push(Comprehension {
                is_async,
                target,
                iter,
                ifs,
            });
        }
        Ok(generators)
    }

    fn yield_expr(&mut self) -> ExprResult {
        let start = self.current_span().start;
        self.expect_keyword(KeywordId::Yield, "expected 'yield'")?;
        if self.match_keyword(KeywordId::From) {
            let value = self.expression()?;
            let span = Span::new(start, value.span.end);
            return Ok(Spanned::new(Expr::YieldFrom(Box::new(value)), span));
        }
        if self.is_at_expr_start() {
            let value = self.star_expressions()?;
            let span = Span::new(start, value.span.end);
            return Ok(Spanned::new(Expr::Yield(Some(Box::new(value))), span));
        }
        Ok(Spanned::new(Expr::Yield(None), Span::new(start, self.previous().span.end)))
    }

    // ========================================================================
    // Atoms
    // ========================================================================

    fn atom(&mut self) -> ExprResult {
        let token = self.peek().clone();
        let start = token.span.start;

        match token.kind {
            TokenKind::Ident(name) => {
                self.advance();
                Ok(Spanned::new(Expr::Name(name), token.span))
            }
            TokenKind::Number(lit) => {
                self.advance();
                Ok(Spanned::new(Expr::Constant(Constant::Number(lit)), token.span))
            }
            TokenKind::Str(_) => {
                let mut pieces = Vec::new();
                while let TokenKind::Str(piece) = &self.peek().kind {
                    pieces.push(piece.clone());
                    self.advance();
                }
                let end = self.previous().span.end;
                Ok(Spanned::new(Expr::Constant(Constant::Str(pieces)), Span::new(start, end)))
            }
            TokenKind::Keyword(KeywordId::True) => {
                self.advance();
                Ok(Spanned::new(Expr::Constant(Constant::True), token.span))
            }
            TokenKind::Keyword(KeywordId::False) => {
                self.advance();
                Ok(Spanned::new(Expr::Constant(Constant::False), token.span))
            }
            TokenKind::Keyword(KeywordId::None) => {
                self.advance();
                Ok(Spanned::new(Expr::Constant(Constant::None), token.span))
            }
            TokenKind::Punctuation(PunctuationId::Ellipsis) => {
                self.advance();
                Ok(Spanned::new(Expr::Constant(Constant::Ellipsis), token.span))
            }
            TokenKind::Punctuation(PunctuationId::LParen) => {
                self.advance();
                self.paren_atom(start)
            }
            TokenKind::Punctuation(PunctuationId::LBracket) => {
                self.advance();
                self.list_atom(start)
            }
            TokenKind::Punctuation(PunctuationId::LBrace) => {
                self.advance();
                self.brace_atom(start)
            }
            _ => Err(self.unexpected("expected expression")),
        }
    }

    /// `()`, `(expr)`, `(a, b)`, `(x for x in y)`, `(yield x)`
    fn paren_atom(&mut self, start: usize) -> ExprResult {
        if self.match_punct(PunctuationId::RParen) {
            return Ok(Spanned::new(Expr::Tuple(Vec::new()), Span::new(start, self.previous().span.end)));
        }

        let first = if self.check_keyword(KeywordId::Yield) {
            self.yield_expr()?
        } else if self.check_op(OperatorId::Star) {
            self.star_expression()?
        } else {
            self.named_expression()?
        };

        if self.check_keyword(KeywordId::For) || self.check_keyword(KeywordId::Async) {
            let generators = self.comprehension_clauses()?;
            self.expect_punct(PunctuationId::RParen, "expected ')' after generator expression")?;
            let span = Span::new(start, self.previous().span.end);
            return Ok(Spanned::new(
                Expr::GeneratorExp {
                    elt: Box::new(first),
                    generators,
                },
                span,
            ));
        }

        let inner = if self.check_punct(PunctuationId::Comma) {
            let inner_start = first.span.start;
            let mut items = vec![first];
            while self.match_punct(PunctuationId::Comma) {
                if self.check_punct(PunctuationId::RParen) {
                    break;
                }
                items.push(self.star_or_named_expression()?);
            }
            let end = self.previous().span.end;
            Spanned::new(Expr::Tuple(items), Span::new(inner_start, end))
        } else {
            first
        };

        self.expect_punct(PunctuationId::RParen, "expected ')'")?;
        let span = Span::new(start, self.previous().span.end);
        Ok(Spanned::new(Expr::Paren(Box::new(inner)), span))
    }

    /// `[]`, `[a, b]`, `[x for x in y]`
    fn list_atom(&mut self, start: usize) -> ExprResult {
        if self.match_punct(PunctuationId::RBracket) {
            return Ok(Spanned::new(Expr::List(Vec::new()), Span::new(start, self.previous().span.end)));
        }

        let first = self.star_or_named_expression()?;
        if self.check_keyword(KeywordId::For) || self.check_keyword(KeywordId::Async) {
            let generators = self.comprehension_clauses()?;
            self.expect_punct(PunctuationId::RBracket, "expected ']' after list comprehension")?;
            let span = Span::new(start, self.previous().span.end);
            return Ok(Spanned::new(
                Expr::ListComp {
                    elt: Box::new(first),
                    generators,
                },
                span,
            ));
        }

        let items = self.remaining_items(first, PunctuationId::RBracket)?;
        self.expect_punct(PunctuationId::RBracket, "expected ']'")?;
        Ok(Spanned::new(Expr::List(items), Span::new(start, self.previous().span.end)))
    }

    /// `{}`, `{k: v}`, `{**m}`, `{a, b}`, and the comprehension forms.
    fn brace_atom(&mut self, start: usize) -> ExprResult {
        if self.match_punct(PunctuationId::RBrace) {
            return Ok(Spanned::new(Expr::Dict(Vec::new()), Span::new(start, self.previous().span.end)));
        }

        let first_item = if self.match_op(OperatorId::StarStar) {
            Some(DictItem::Unpack(self.bitor()?))
        } else {
            None
        };

        let first_item = match first_item {
            Some(item) => item,
            None => {
                let first = self.star_or_named_expression()?;
                if !self.match_punct(PunctuationId::Colon) {
                    // Set display or set comprehension
                    if self.check_keyword(KeywordId::For) || self.check_keyword(KeywordId::Async) {
                        let generators = self.comprehension_clauses()?;
                        self.expect_punct(PunctuationId::RBrace, "expected '}' after set comprehension")?;
                        let span = Span::new(start, self.previous().span.end);
                        return Ok(Spanned::new(
                            Expr::SetComp {
                                elt: Box::new(first),
                                generators,
                            },
                            span,
                        ));
                    }
                    let items = self.remaining_items(first, PunctuationId::RBrace)?;
                    self.expect_punct(PunctuationId::RBrace, "expected '}'")?;
                    return Ok(Spanned::new(Expr::Set(items), Span::new(start, self.previous().span.end)));
                }

                let value = self.expression()?;
                if self.check_keyword(KeywordId::For) || self.check_keyword(KeywordId::Async) {
                    let generators = self.comprehension_clauses()?;
                    self.expect_punct(PunctuationId::RBrace, "expected '}' after dict comprehension")?;
                    let span = Span::new(start, self.previous().span.end);
                    return Ok(Spanned::new(
                        Expr::DictComp {
                            key: Box::new(first),
                            value: Box::new(value),
                            generators,
                        },
                        span,
                    ));
                }
                DictItem::KeyValue(first, value)
            }
        };

        let mut items = vec![first_item];
        while self.match_punct(PunctuationId::Comma) {
            if self.check_punct(PunctuationId::RBrace) {
                break;
            }
            if self.match_op(OperatorId::StarStar) {
                items.push(DictItem::Unpack(self.bitor()?));
            } else {
                let key = self.expression()?;
                self.expect_punct(PunctuationId::Colon, "expected ':' in dict display")?;
                let value = self.expression()?;
                items.push(DictItem::KeyValue(key, value));
            }
        }
        self.expect_punct(PunctuationId::RBrace, "expected '}'")?;
        Ok(Spanned::new(Expr::Dict(items), Span::new(start, self.previous().span.end)))
    }

    fn star_or_named_expression(&mut self) -> ExprResult {
        if self.check_op(OperatorId::Star) {
            self.star_expression()
        } else {
            self.named_expression()
        }
    }

    /// Continue a comma-separated display after its first element, up to `close`.
    fn remaining_items(&mut self, first: Spanned<Expr>, close: PunctuationId) -> Result<Vec<Spanned<Expr>>, SyntaxError> {
        let mut items = vec![first];
        while self.match_punct(PunctuationId::Comma) {
            if self.check_punct(close) {
                break;
            }
            items.push(self.star_or_named_expression()?);
        }
        Ok(items)
    }
}
