use std::rc::Rc;

/// Source location attached to every node for error reporting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Span {
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

// ─── Top level ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Program {
    pub body: Vec<Stmt>,
}

// ─── Statements ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum Stmt {
    /// Top-level `x = expr`; defines `x` in the current scope.
    VarDecl(VarDecl),
    /// `fun name(a, b) { ... }`
    FnDecl(Rc<FnDecl>),
    /// `return` or `return expr`
    Return(Option<Expr>, Span),
    /// `if cond { } else if cond { } else { }`
    If(IfStmt),
    /// `loop { ... }`, left with `break`
    Loop(LoopStmt),
    Break(Span),
    Block(Block),
    /// `enum Name { A, B(x, y) }`
    Enum(EnumDecl),
    /// `draw { ... }`
    Draw(Rc<FrameBlock>),
    /// `update { ... }` or `update(dt) { ... }`
    Update(Rc<FrameBlock>),
    Expr(Expr),
}

#[derive(Debug, Clone)]
pub struct VarDecl {
    pub name: String,
    pub value: Expr,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct FnDecl {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct IfStmt {
    pub condition: Expr,
    pub then_block: Block,
    /// Either another `Stmt::If` (for `else if`) or a `Stmt::Block`.
    pub else_branch: Option<Box<Stmt>>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct LoopStmt {
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct EnumDecl {
    pub name: String,
    pub variants: Vec<VariantDecl>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct VariantDecl {
    pub name: String,
    /// Empty for a nullary variant.
    pub fields: Vec<String>,
}

/// Body of a `draw` or `update` registration.
#[derive(Debug, Clone)]
pub struct FrameBlock {
    /// Name the elapsed seconds are bound to (update only).
    pub param: Option<String>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

// ─── Expressions ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum Expr {
    Number(f64, Span),
    Str(String, Span),
    Bool(bool, Span),
    Null(Span),
    /// `prototype()`, a fresh empty object
    Prototype(Span),
    Ident(String, Span),
    Array(Vec<Expr>, Span),
    /// `{ key: expr, ... }`
    Object(Vec<(String, Expr)>, Span),

    Assign {
        target: Box<Expr>,
        op: AssignOp,
        value: Box<Expr>,
        span: Span,
    },
    Logical {
        left: Box<Expr>,
        op: LogicalOp,
        right: Box<Expr>,
        span: Span,
    },
    BinOp {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
        span: Span,
    },
    UnOp {
        op: UnOp,
        operand: Box<Expr>,
        span: Span,
    },
    /// `++x`, `x--`, ...
    Update {
        target: Box<Expr>,
        op: UpdateOp,
        prefix: bool,
        span: Span,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
        named_args: Vec<(String, Expr)>,
        span: Span,
    },
    Member {
        object: Box<Expr>,
        property: String,
        span: Span,
    },
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
        span: Span,
    },
    /// `xs[start:end]`, either bound optional
    Slice {
        object: Box<Expr>,
        start: Option<Box<Expr>>,
        end: Option<Box<Expr>>,
        span: Span,
    },
    Match(Box<MatchExpr>),
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Number(_, s) | Expr::Str(_, s) | Expr::Bool(_, s) | Expr::Null(s)
            | Expr::Prototype(s) | Expr::Ident(_, s) | Expr::Array(_, s) | Expr::Object(_, s) => *s,
            Expr::Assign { span, .. }
            | Expr::Logical { span, .. }
            | Expr::BinOp { span, .. }
            | Expr::UnOp { span, .. }
            | Expr::Update { span, .. }
            | Expr::Call { span, .. }
            | Expr::Member { span, .. }
            | Expr::Index { span, .. }
            | Expr::Slice { span, .. } => *span,
            Expr::Match(m) => m.span,
        }
    }

    /// Can this expression appear on the left of `=` or under `++`/`--`?
    pub fn is_place(&self) -> bool {
        matches!(self, Expr::Ident(..) | Expr::Member { .. } | Expr::Index { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AssignOp { Assign, Add, Sub, Mul, Div, Mod, BitAnd, BitOr, BitXor }

impl AssignOp {
    /// The binary operator a compound assignment applies.
    pub fn binop(self) -> Option<BinOp> {
        match self {
            AssignOp::Assign => None,
            AssignOp::Add    => Some(BinOp::Add),
            AssignOp::Sub    => Some(BinOp::Sub),
            AssignOp::Mul    => Some(BinOp::Mul),
            AssignOp::Div    => Some(BinOp::Div),
            AssignOp::Mod    => Some(BinOp::Mod),
            AssignOp::BitAnd => Some(BinOp::BitAnd),
            AssignOp::BitOr  => Some(BinOp::BitOr),
            AssignOp::BitXor => Some(BinOp::BitXor),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogicalOp { And, Or }

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinOp {
    Add, Sub, Mul, Div, Mod, Pow,
    Eq, NotEq, Lt, LtEq, Gt, GtEq,
    BitAnd, BitOr, BitXor, Shl, Shr,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",  BinOp::Sub => "-",  BinOp::Mul => "*",
            BinOp::Div => "/",  BinOp::Mod => "%",  BinOp::Pow => "**",
            BinOp::Eq  => "==", BinOp::NotEq => "!=",
            BinOp::Lt  => "<",  BinOp::LtEq => "<=",
            BinOp::Gt  => ">",  BinOp::GtEq => ">=",
            BinOp::BitAnd => "&", BinOp::BitOr => "|", BinOp::BitXor => "^",
            BinOp::Shl => "<<", BinOp::Shr => ">>",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnOp { Neg, Not, BitNot }

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UpdateOp { Inc, Dec }

// ─── Match ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct MatchExpr {
    pub subject: Expr,
    pub arms: Vec<MatchArm>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct MatchArm {
    pub pattern: Pattern,
    pub body: ArmBody,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum ArmBody {
    /// Runs for side effects; the match yields `null`.
    Block(Block),
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    Str(String),
    Bool(bool),
    Null,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    /// `_`
    Wildcard(Span),
    Literal(Literal, Span),
    /// A bare name that binds the subject. The resolution pass turns names of
    /// known nullary variants into `Variant` patterns.
    Binding(String, Span),
    /// `Name`, `Name(a, b)` or `Enum.Name(a, b)`. A `_` binding is skipped.
    Variant {
        enum_name: Option<String>,
        name: String,
        bindings: Vec<String>,
        span: Span,
    },
}
