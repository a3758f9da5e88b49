//! Canonical expression printer.
//!
//! Prints an expression tree back to source text with normalized spacing: `, ` between items,
//! `: ` in dict entries, and single spaces around binary and comparison operators. Literals are
//! printed with their exact source spelling and explicit parentheses are kept where they appeared,
//! so two expressions print identically exactly when they differ only in layout.

use crate::ast::*;

/// Print an expression in canonical form.
pub fn unparse_expr(expr: &Expr) -> String {
    let mut printer = Printer::default();
    printer.expr(expr);
    printer.finish()
}

#[derive(Default)]
struct Printer {
    out: String,
}

impl Printer {
    fn finish(self) -> String {
        self.out
    }

    fn write(&mut self, s: &str) {
        self.out.push_str(s);
    }

    fn comma_separated<'e>(&mut self, items: impl IntoIterator<Item = &'e Spanned<Expr>>) {
        for (i, item) in items.into_iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            self.expr(&item.node);
        }
    }

    fn expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Name(name) => self.write(name),
            Expr::Constant(constant) => self.constant(constant),
            Expr::BoolOp { op, values } => {
                let sep = match op {
                    BoolOp::And => " and ",
                    BoolOp::Or => " or ",
                };
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        self.write(sep);
                    }
                    self.expr(&value.node);
                }
            }
            Expr::NamedExpr { target, value } => {
                self.expr(&target.node);
                self.write(" := ");
                self.expr(&value.node);
            }
            Expr::BinOp { left, op, right } => {
                self.expr(&left.node);
                self.write(" ");
                self.write(binop_str(*op));
                self.write(" ");
                self.expr(&right.node);
            }
            Expr::UnaryOp { op, operand } => {
                self.write(match op {
                    UnaryOp::Not => "not ",
                    UnaryOp::Neg => "-",
                    UnaryOp::Pos => "+",
                    UnaryOp::Invert => "~",
                });
                self.expr(&operand.node);
            }
            Expr::Lambda { params, body } => {
                self.write("lambda");
                if !params.is_empty() {
                    self.write(" ");
                    self.params(params);
                }
                self.write(": ");
                self.expr(&body.node);
            }
            Expr::IfExp { test, body, orelse } => {
                self.expr(&body.node);
                self.write(" if ");
                self.expr(&test.node);
                self.write(" else ");
                self.expr(&orelse.node);
            }
            Expr::Dict(items) => {
                self.write("{");
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.write(", ");
                    }
                    match item {
                        DictItem::KeyValue(key, value) => {
                            self.expr(&key.node);
                            self.write(": ");
                            self.expr(&value.node);
                        }
                        DictItem::Unpack(mapping) => {
                            self.write("**");
                            self.expr(&mapping.node);
                        }
                    }
                }
                self.write("}");
            }
            Expr::Set(items) => {
                self.write("{");
                self.comma_separated(items);
                self.write("}");
            }
            Expr::ListComp { elt, generators } => {
                self.write("[");
                self.expr(&elt.node);
                self.comprehension(generators);
                self.write("]");
            }
            Expr::SetComp { elt, generators } => {
                self.write("{");
                self.expr(&elt.node);
                self.comprehension(generators);
                self.write("}");
            }
            Expr::DictComp { key, value, generators } => {
                self.write("{");
                self.expr(&key.node);
                self.write(": ");
                self.expr(&value.node);
                self.comprehension(generators);
                self.write("}");
            }
            Expr::GeneratorExp { elt, generators } => {
                self.write("(");
                self.expr(&elt.node);
                self.comprehension(generators);
                self.write(")");
            }
            Expr::Await(inner) => {
                self.write("await ");
                self.expr(&inner.node);
            }
            Expr::Yield(value) => {
                self.write("yield");
                if let Some(value) = value {
                    self.write(" ");
                    self.expr(&value.node);
                }
            }
            Expr::YieldFrom(value) => {
                self.write("yield from ");
                self.expr(&value.node);
            }
            Expr::Compare { left, ops, comparators } => {
                self.expr(&left.node);
                for (op, comparator) in ops.iter().zip(comparators) {
                    self.write(" ");
                    self.write(op.as_str());
                    self.write(" ");
                    self.expr(&comparator.node);
                }
            }
            Expr::Call { func, args } => {
                self.expr(&func.node);
                // A lone generator argument supplies the call's parentheses.
                if let [Arg::Positional(arg)] = args.as_slice() {
                    if matches!(arg.node, Expr::GeneratorExp { .. }) {
                        self.expr(&arg.node);
                        return;
                    }
                }
                self.write("(");
                self.args(args);
                self.write(")");
            }
            Expr::Attribute { value, attr } => {
                self.expr(&value.node);
                self.write(".");
                self.write(attr);
            }
            Expr::Subscript { value, index } => {
                self.expr(&value.node);
                self.write("[");
                match &index.node {
                    Expr::Tuple(items) if !items.is_empty() => self.comma_separated(items),
                    other => self.expr(other),
                }
                self.write("]");
            }
            Expr::Starred(inner) => {
                self.write("*");
                self.expr(&inner.node);
            }
            Expr::List(items) => {
                self.write("[");
                self.comma_separated(items);
                self.write("]");
            }
            Expr::Tuple(items) => match items.as_slice() {
                [] => self.write("()"),
                [only] => {
                    self.expr(&only.node);
                    self.write(",");
                }
                _ => self.comma_separated(items),
            },
            Expr::Slice { lower, upper, step } => {
                if let Some(lower) = lower {
                    self.expr(&lower.node);
                }
                self.write(":");
                if let Some(upper) = upper {
                    self.expr(&upper.node);
                }
                if let Some(step) = step {
                    self.write(":");
                    self.expr(&step.node);
                }
            }
            Expr::Paren(inner) => {
                self.write("(");
                self.expr(&inner.node);
                self.write(")");
            }
        }
    }

    fn constant(&mut self, constant: &Constant) {
        match constant {
            Constant::Number(lit) => self.write(&lit.raw),
            Constant::Str(pieces) => {
                for (i, piece) in pieces.iter().enumerate() {
                    if i > 0 {
                        self.write(" ");
                    }
                    self.write(&piece.raw);
                }
            }
            Constant::True => self.write("True"),
            Constant::False => self.write("False"),
            Constant::None => self.write("None"),
            Constant::Ellipsis => self.write("..."),
        }
    }

    fn args(&mut self, args: &[Arg]) {
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            match arg {
                Arg::Positional(value) => self.expr(&value.node),
                Arg::Keyword(name, value) => {
                    self.write(name);
                    self.write("=");
                    self.expr(&value.node);
                }
                Arg::Starred(value) => {
                    self.write("*");
                    self.expr(&value.node);
                }
                Arg::DoubleStarred(value) => {
                    self.write("**");
                    self.expr(&value.node);
                }
            }
        }
    }

    fn params(&mut self, params: &[Param]) {
        for (i, param) in params.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            match param.kind {
                ParamKind::Regular => self.write(&param.name),
                ParamKind::VarArgs => {
                    self.write("*");
                    self.write(&param.name);
                }
                ParamKind::KwArgs => {
                    self.write("**");
                    self.write(&param.name);
                }
                ParamKind::KwOnlyMarker => self.write("*"),
                ParamKind::PosOnlyMarker => self.write("/"),
            }
            if let Some(annotation) = &param.annotation {
                self.write(": ");
                self.expr(&annotation.node);
            }
            if let Some(default) = &param.default {
                self.write("=");
                self.expr(&default.node);
            }
        }
    }

    fn comprehension(&mut self, generators: &[Comprehension]) {
        for generator in generators {
            self.write(if generator.is_async { " async for " } else { " for " });
            match &generator.target.node {
                Expr::Tuple(items) if !items.is_empty() => self.comma_separated(items),
                other => self.expr(other),
            }
            self.write(" in ");
            self.expr(&generator.iter.node);
            for condition in &generator.ifs {
                self.write(" if ");
                self.expr(&condition.node);
            }
        }
    }
}

fn binop_str(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "+",
        BinOp::Sub => "-",
        BinOp::Mul => "*",
        BinOp::MatMul => "@",
        BinOp::Div => "/",
        BinOp::FloorDiv => "//",
        BinOp::Mod => "%",
        BinOp::Pow => "**",
        BinOp::LShift => "<<",
        BinOp::RShift => ">>",
        BinOp::BitOr => "|",
        BinOp::BitXor => "^",
        BinOp::BitAnd => "&",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_expression;

    fn canonical(source: &str) -> String {
        unparse_expr(&parse_expression(source).unwrap().node)
    }

    #[test]
    fn test_layout_is_normalized() {
        insta::assert_snapshot!(canonical("[2,1,  0]"), @"[2, 1, 0]");
        insta::assert_snapshot!(canonical("{'a':1,**rest}"), @"{'a': 1, **rest}");
        insta::assert_snapshot!(canonical("f( x,*y , k = 2 )"), @"f(x, *y, k=2)");
        insta::assert_snapshot!(canonical("a<b>=c"), @"a < b >= c");
    }

    #[test]
    fn test_literal_spelling_is_kept() {
        insta::assert_snapshot!(canonical("(0xFF, 1_000, 'it\\'s', \"x\" 'y')"), @r#"(0xFF, 1_000, 'it\'s', "x" 'y')"#);
        insta::assert_snapshot!(canonical("-1.5e3"), @"-1.5e3");
    }

    #[test]
    fn test_tuples_and_parens() {
        insta::assert_snapshot!(canonical("(1,)"), @"(1,)");
        insta::assert_snapshot!(canonical("()"), @"()");
        insta::assert_snapshot!(canonical("(a + b) * c"), @"(a + b) * c");
        insta::assert_snapshot!(canonical("x[1:2, ::3]"), @"x[1:2, ::3]");
    }

    #[test]
    fn test_comprehensions_and_lambdas() {
        insta::assert_snapshot!(canonical("sorted(x,key=lambda p:-p[1])"), @"sorted(x, key=lambda p: -p[1])");
        insta::assert_snapshot!(canonical("sum(i*i for i,j in z if i)"), @"sum(i * i for i, j in z if i)");
        insta::assert_snapshot!(canonical("{k:v for k in d}"), @"{k: v for k in d}");
        insta::assert_snapshot!(canonical("a if not b else c"), @"a if not b else c");
    }
}
