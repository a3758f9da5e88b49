//! Abstract Syntax Tree for candidate programs and tests.
//!
//! Every statement and expression carries a byte [`Span`] into the source it was parsed from, so
//! callers can splice replacement text without re-emitting untouched code.
//!
//! Literal nodes keep their exact source spelling ([`NumberLit::raw`], [`StrLit::raw`]); the
//! [`crate::unparse`] printer relies on that to produce stable canonical text.

pub use crate::lexer::{NumberKind, NumberLit, StrLit};

/// Source location span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Slice the source text covered by this span.
    pub fn text(self, source: &str) -> &str {
        source.get(self.start..self.end).unwrap_or("")
    }
}

/// A node with source location
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

pub type Ident = String;

// ============================================================================
// Module
// ============================================================================

/// A parsed source file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Module {
    pub body: Vec<Spanned<Stmt>>,
}

impl Module {
    /// Top-level function definitions, in source order.
    pub fn functions(&self) -> impl Iterator<Item = &FunctionDef> {
        self.body.iter().filter_map(|s| match &s.node {
            Stmt::FunctionDef(f) => Some(f),
            _ => None,
        })
    }
}

// ============================================================================
// Statements
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    FunctionDef(FunctionDef),
    ClassDef(ClassDef),
    Return(Option<Spanned<Expr>>),
    Delete(Vec<Spanned<Expr>>),
    /// `a = b = value`
    Assign {
        targets: Vec<Spanned<Expr>>,
        value: Spanned<Expr>,
    },
    AugAssign {
        target: Spanned<Expr>,
        op: BinOp,
        value: Spanned<Expr>,
    },
    AnnAssign {
        target: Spanned<Expr>,
        annotation: Spanned<Expr>,
        value: Option<Spanned<Expr>>,
    },
    For {
        is_async: bool,
        target: Spanned<Expr>,
        iter: Spanned<Expr>,
        body: Vec<Spanned<Stmt>>,
        orelse: Vec<Spanned<Stmt>>,
    },
    While {
        test: Spanned<Expr>,
        body: Vec<Spanned<Stmt>>,
        orelse: Vec<Spanned<Stmt>>,
    },
    If {
        test: Spanned<Expr>,
        body: Vec<Spanned<Stmt>>,
        /// `elif` chains are nested `If` statements here.
        orelse: Vec<Spanned<Stmt>>,
    },
    With {
        is_async: bool,
        items: Vec<WithItem>,
        body: Vec<Spanned<Stmt>>,
    },
    Raise {
        exc: Option<Spanned<Expr>>,
        cause: Option<Spanned<Expr>>,
    },
    Try {
        body: Vec<Spanned<Stmt>>,
        handlers: Vec<ExceptHandler>,
        orelse: Vec<Spanned<Stmt>>,
        finalbody: Vec<Spanned<Stmt>>,
    },
    Assert {
        test: Spanned<Expr>,
        msg: Option<Spanned<Expr>>,
    },
    Import(Vec<Alias>),
    ImportFrom {
        module: Option<String>,
        /// Number of leading dots.
        level: usize,
        names: Vec<Alias>,
    },
    Global(Vec<Ident>),
    Nonlocal(Vec<Ident>),
    Expr(Spanned<Expr>),
    Pass,
    Break,
    Continue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: Ident,
    pub is_async: bool,
    pub decorators: Vec<Spanned<Expr>>,
    pub params: Vec<Param>,
    pub returns: Option<Spanned<Expr>>,
    pub body: Vec<Spanned<Stmt>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDef {
    pub name: Ident,
    pub decorators: Vec<Spanned<Expr>>,
    pub bases: Vec<Arg>,
    pub body: Vec<Spanned<Stmt>>,
}

/// Parameter flavour in a `def` or `lambda` signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Regular,
    /// `*args`
    VarArgs,
    /// `**kwargs`
    KwArgs,
    /// Bare `*` separator
    KwOnlyMarker,
    /// `/` separator
    PosOnlyMarker,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub kind: ParamKind,
    /// Empty for the `*` / `/` markers.
    pub name: Ident,
    pub annotation: Option<Spanned<Expr>>,
    pub default: Option<Spanned<Expr>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WithItem {
    pub context: Spanned<Expr>,
    pub alias: Option<Spanned<Expr>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExceptHandler {
    pub span: Span,
    pub kind: Option<Spanned<Expr>>,
    pub name: Option<Ident>,
    pub body: Vec<Spanned<Stmt>>,
}

/// `name as asname` in an import. `name` may be dotted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alias {
    pub name: String,
    pub asname: Option<Ident>,
}

// ============================================================================
// Expressions
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Name(Ident),
    Constant(Constant),
    /// `a and b and c` (flattened)
    BoolOp {
        op: BoolOp,
        values: Vec<Spanned<Expr>>,
    },
    /// `target := value`
    NamedExpr {
        target: Box<Spanned<Expr>>,
        value: Box<Spanned<Expr>>,
    },
    BinOp {
        left: Box<Spanned<Expr>>,
        op: BinOp,
        right: Box<Spanned<Expr>>,
    },
    UnaryOp {
        op: UnaryOp,
        operand: Box<Spanned<Expr>>,
    },
    Lambda {
        params: Vec<Param>,
        body: Box<Spanned<Expr>>,
    },
    /// `body if test else orelse`
    IfExp {
        test: Box<Spanned<Expr>>,
        body: Box<Spanned<Expr>>,
        orelse: Box<Spanned<Expr>>,
    },
    Dict(Vec<DictItem>),
    Set(Vec<Spanned<Expr>>),
    ListComp {
        elt: Box<Spanned<Expr>>,
        generators: Vec<Comprehension>,
    },
    SetComp {
        elt: Box<Spanned<Expr>>,
        generators: Vec<Comprehension>,
    },
    DictComp {
        key: Box<Spanned<Expr>>,
        value: Box<Spanned<Expr>>,
        generators: Vec<Comprehension>,
    },
    GeneratorExp {
        elt: Box<Spanned<Expr>>,
        generators: Vec<Comprehension>,
    },
    Await(Box<Spanned<Expr>>),
    Yield(Option<Box<Spanned<Expr>>>),
    YieldFrom(Box<Spanned<Expr>>),
    /// `left op0 c0 op1 c1 ...`; a single comparison has one op.
    Compare {
        left: Box<Spanned<Expr>>,
        ops: Vec<CmpOp>,
        comparators: Vec<Spanned<Expr>>,
    },
    Call {
        func: Box<Spanned<Expr>>,
        args: Vec<Arg>,
    },
    Attribute {
        value: Box<Spanned<Expr>>,
        attr: Ident,
    },
    Subscript {
        value: Box<Spanned<Expr>>,
        index: Box<Spanned<Expr>>,
    },
    Starred(Box<Spanned<Expr>>),
    List(Vec<Spanned<Expr>>),
    /// Bare tuple (`a, b`); a parenthesized tuple is `Paren(Tuple)` and `()` is an empty tuple.
    Tuple(Vec<Spanned<Expr>>),
    /// Only valid inside a subscript.
    Slice {
        lower: Option<Box<Spanned<Expr>>>,
        upper: Option<Box<Spanned<Expr>>>,
        step: Option<Box<Spanned<Expr>>>,
    },
    /// Explicit parentheses from the source.
    Paren(Box<Spanned<Expr>>),
}

impl Expr {
    /// Strip any number of explicit parentheses.
    pub fn unparenthesized(&self) -> &Expr {
        match self {
            Expr::Paren(inner) => inner.node.unparenthesized(),
            other => other,
        }
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            Expr::Name(n) => Some(n),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Number(NumberLit),
    /// Implicitly concatenated pieces (`"a" "b"`) stay separate.
    Str(Vec<StrLit>),
    True,
    False,
    None,
    Ellipsis,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DictItem {
    KeyValue(Spanned<Expr>, Spanned<Expr>),
    /// `**mapping`
    Unpack(Spanned<Expr>),
}

/// One `for target in iter if cond...` clause of a comprehension.
#[derive(Debug, Clone, PartialEq)]
pub struct Comprehension {
    pub is_async: bool,
    pub target: Spanned<Expr>,
    pub iter: Spanned<Expr>,
    pub ifs: Vec<Spanned<Expr>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Positional(Spanned<Expr>),
    Keyword(Ident, Spanned<Expr>),
    /// `*iterable`
    Starred(Spanned<Expr>),
    /// `**mapping`
    DoubleStarred(Spanned<Expr>),
}

impl Arg {
    pub fn value(&self) -> &Spanned<Expr> {
        match self {
            Arg::Positional(e) | Arg::Keyword(_, e) | Arg::Starred(e) | Arg::DoubleStarred(e) => e,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    MatMul,
    Div,
    FloorDiv,
    Mod,
    Pow,
    LShift,
    RShift,
    BitOr,
    BitXor,
    BitAnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
    Pos,
    Invert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CmpOp {
    Eq,
    NotEq,
    Lt,
    LtE,
    Gt,
    GtE,
    Is,
    IsNot,
    In,
    NotIn,
}

impl CmpOp {
    /// Source spelling of the comparison.
    pub fn as_str(self) -> &'static str {
        match self {
            CmpOp::Eq => "==",
            CmpOp::NotEq => "!=",
            CmpOp::Lt => "<",
            CmpOp::LtE => "<=",
            CmpOp::Gt => ">",
            CmpOp::GtE => ">=",
            CmpOp::Is => "is",
            CmpOp::IsNot => "is not",
            CmpOp::In => "in",
            CmpOp::NotIn => "not in",
        }
    }
}

impl std::fmt::Display for CmpOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
