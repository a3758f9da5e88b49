/// Miscellaneous parser utilities.
///
/// Identifier parsing, token descriptions for error messages, and operator mapping.
impl<'a> Parser<'a> {
    // ========================================================================
    // Utilities
    // ========================================================================

    fn identifier(&mut self) -> Result<Ident, SyntaxError> {
        match &self.peek().kind {
            TokenKind::Ident(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected("expected identifier")),
        }
    }

    fn identifier_list(&mut self) -> Result<Vec<Ident>, SyntaxError> {
        let mut idents = vec![self.identifier()?];
        while self.match_punct(PunctuationId::Comma) {
            idents.push(self.identifier()?);
        }
        Ok(idents)
    }

    /// `a.b.c` as a single string.
    fn dotted_name(&mut self) -> Result<String, SyntaxError> {
        let mut name = self.identifier()?;
        while self.match_punct(PunctuationId::Dot) {
            name.push('.');
            name.push_str(&self.identifier()?);
        }
        Ok(name)
    }
}

/// Human-readable token description for error messages.
fn describe(kind: &TokenKind) -> String {
    match kind {
        TokenKind::Keyword(id) => format!("keyword '{}'", candor_core::lang::keywords::as_str(*id)),
        TokenKind::Operator(id) => format!("'{}'", operators::as_str(*id)),
        TokenKind::Punctuation(id) => format!("'{}'", candor_core::lang::punctuation::as_str(*id)),
        TokenKind::Ident(name) => format!("identifier '{name}'"),
        TokenKind::Number(lit) => format!("number {}", lit.raw),
        TokenKind::Str(lit) => format!("string {}", lit.raw),
        TokenKind::Newline => "newline".to_string(),
        TokenKind::Indent => "indent".to_string(),
        TokenKind::Dedent => "dedent".to_string(),
        TokenKind::Eof => "end of input".to_string(),
    }
}

/// Binary operator applied by an augmented assignment (`+=` → `Add`).
fn augmented_binop(id: OperatorId) -> Option<BinOp> {
    if id == OperatorId::AtEq {
        return Some(BinOp::MatMul);
    }
    Some(match operators::augmented_base(id)? {
        OperatorId::Plus => BinOp::Add,
        OperatorId::Minus => BinOp::Sub,
        OperatorId::Star => BinOp::Mul,
        OperatorId::StarStar => BinOp::Pow,
        OperatorId::Slash => BinOp::Div,
        OperatorId::SlashSlash => BinOp::FloorDiv,
        OperatorId::Percent => BinOp::Mod,
        OperatorId::Amp => BinOp::BitAnd,
        OperatorId::Pipe => BinOp::BitOr,
        OperatorId::Caret => BinOp::BitXor,
        OperatorId::LShift => BinOp::LShift,
        OperatorId::RShift => BinOp::RShift,
        _ => return None,
    })
}

/// Short noun for an expression kind, used in "cannot assign to ..." messages.
fn expr_kind_name(expr: &Expr) -> &'static str {
    match expr {
        Expr::Constant(_) => "literal",
        Expr::Call { .. } => "function call",
        Expr::BinOp { .. } | Expr::UnaryOp { .. } | Expr::BoolOp { .. } => "expression",
        Expr::Compare { .. } => "comparison",
        Expr::Lambda { .. } => "lambda",
        Expr::IfExp { .. } => "conditional expression",
        Expr::NamedExpr { .. } => "named expression",
        Expr::Await(_) => "await expression",
        Expr::Yield(_) | Expr::YieldFrom(_) => "yield expression",
        Expr::Dict(_) => "dict literal",
        Expr::Set(_) => "set display",
        Expr::ListComp { .. } => "list comprehension",
        Expr::SetComp { .. } => "set comprehension",
        Expr::DictComp { .. } => "dict comprehension",
        Expr::GeneratorExp { .. } => "generator expression",
        Expr::Slice { .. } => "slice",
        Expr::Name(_)
        | Expr::Attribute { .. }
        | Expr::Subscript { .. }
        | Expr::Starred(_)
        | Expr::List(_)
        | Expr::Tuple(_)
        | Expr::Paren(_) => "expression",
    }
}
