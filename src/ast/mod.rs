//! Abstract Syntax Tree (AST) definitions for the Go subset.
//!
//! Only the parts of a Go file that matter for derivation are modelled in
//! full: type declarations, package-level vars and consts, function
//! signatures, and the local declarations and expressions found in function
//! bodies. Everything else in a body is skipped by the parser.

use serde::{Deserialize, Serialize};

/// Span information for source location tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    /// Index of the source file inside the current run
    pub file: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end, file: 0 }
    }

    pub fn in_file(file: usize, start: usize, end: usize) -> Self {
        Self { start, end, file }
    }

    pub fn dummy() -> Self {
        Self { start: 0, end: 0, file: 0 }
    }

    /// Span covering both `self` and `other`
    pub fn to(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
            file: self.file,
        }
    }
}

impl From<std::ops::Range<usize>> for Span {
    fn from(range: std::ops::Range<usize>) -> Self {
        Self::new(range.start, range.end)
    }
}

/// Root node of one parsed source file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceFile {
    pub package: PackageDecl,
    pub imports: Vec<Import>,
    pub decls: Vec<Decl>,
    pub span: Span,
}

/// Package clause
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageDecl {
    pub name: String,
    pub span: Span,
}

/// Import spec
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Import {
    pub path: String,
    pub alias: Option<String>,
    pub span: Span,
}

impl Import {
    /// Name under which the package is visible in the file
    pub fn local_name(&self) -> &str {
        match &self.alias {
            Some(alias) => alias,
            None => self.path.rsplit('/').next().unwrap_or(&self.path),
        }
    }
}

/// Top-level declarations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Decl {
    Type(TypeDecl),
    Var(ValueDecl),
    Const(ValueDecl),
    Func(FuncDecl),
}

/// `type Name T` or `type Name = T`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDecl {
    pub name: String,
    pub is_alias: bool,
    pub ty: TypeExpr,
    pub span: Span,
}

/// `var a, b T = x, y` / `const N = 4`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueDecl {
    pub names: Vec<String>,
    pub ty: Option<TypeExpr>,
    pub values: Vec<Expr>,
    pub span: Span,
}

/// Function or method declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuncDecl {
    pub receiver: Option<Receiver>,
    pub name: String,
    pub signature: Signature,
    pub body: Option<Vec<BodyItem>>,
    pub span: Span,
}

/// Method receiver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receiver {
    pub name: Option<String>,
    pub type_name: String,
    pub is_pointer: bool,
    pub span: Span,
}

/// Parameters and results of a function type
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Signature {
    pub params: Vec<Param>,
    pub results: Vec<Param>,
}

/// One parameter or result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: Option<String>,
    pub ty: TypeExpr,
    pub variadic: bool,
}

/// A type as written in source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeExpr {
    pub kind: TypeExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypeExprKind {
    Name(String),
    Qualified(String, String),
    Pointer(Box<TypeExpr>),
    Slice(Box<TypeExpr>),
    Array(ArrayLen, Box<TypeExpr>),
    Map(Box<TypeExpr>, Box<TypeExpr>),
    Struct(Vec<FieldDecl>),
    Chan(ChanDir, Box<TypeExpr>),
    Func(Signature),
    Interface,
}

/// Array length as written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ArrayLen {
    Literal(u64),
    Const(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChanDir {
    Both,
    Send,
    Recv,
}

/// Struct field group: `A, B int` or an embedded `Foo` / `*Foo`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDecl {
    pub names: Vec<String>,
    pub ty: TypeExpr,
    pub embedded: bool,
    /// Decoded tag literal, if any
    pub tag: Option<String>,
    pub span: Span,
}

/// Ordered items of a function body that matter for scoping and call sites
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BodyItem {
    /// Opens a scope; params are declared in it
    Enter(Vec<Param>),
    Leave,
    Local(LocalDecl),
    Expr(Expr),
}

/// Local binding introduced by `var`, `const`, `:=` or `range`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalDecl {
    pub name: String,
    pub ty: Option<TypeExpr>,
    pub value: Option<Expr>,
    pub span: Span,
}

/// Expressions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExprKind {
    Ident(String),
    IntLit(u64),
    FloatLit(String),
    ImaginaryLit(String),
    RuneLit(String),
    StringLit(String),
    Unary(UnaryOp, Box<Expr>),
    /// Operator text, left, right
    Binary(String, Box<Expr>, Box<Expr>),
    Selector(Box<Expr>, String),
    Index(Box<Expr>, Box<Expr>),
    SliceExpr(Box<Expr>),
    TypeAssert(Box<Expr>, Option<TypeExpr>),
    Call(CallExpr),
    /// A type used in expression position, e.g. `[]int` in `[]int(x)`
    Type(TypeExpr),
    Composite(TypeExpr, Vec<Expr>),
    /// Elements of a composite literal with an elided type
    ElidedComposite(Vec<Expr>),
    KeyValue(Box<Expr>, Box<Expr>),
    FuncLit(Signature, Vec<BodyItem>),
    Paren(Box<Expr>),
    /// `range x`, bound to the key (0) or value (1) position
    Range(Box<Expr>, usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Ref,
    Deref,
    Neg,
    Plus,
    Not,
    Complement,
    Recv,
}

/// Call or conversion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallExpr {
    pub callee: Box<Expr>,
    pub args: Vec<Expr>,
    pub spread: bool,
    pub span: Span,
}

impl CallExpr {
    /// Callee name when the callee is a plain identifier
    pub fn callee_name(&self) -> Option<&str> {
        match &self.callee.kind {
            ExprKind::Ident(name) => Some(name),
            _ => None,
        }
    }
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }
}

impl std::fmt::Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            ExprKind::Ident(name) => write!(f, "{}", name),
            ExprKind::IntLit(v) => write!(f, "{}", v),
            ExprKind::FloatLit(s) | ExprKind::ImaginaryLit(s) | ExprKind::RuneLit(s) => {
                write!(f, "{}", s)
            }
            ExprKind::StringLit(s) => write!(f, "{:?}", s),
            ExprKind::Unary(op, e) => {
                let op = match op {
                    UnaryOp::Ref => "&",
                    UnaryOp::Deref => "*",
                    UnaryOp::Neg => "-",
                    UnaryOp::Plus => "+",
                    UnaryOp::Not => "!",
                    UnaryOp::Complement => "^",
                    UnaryOp::Recv => "<-",
                };
                write!(f, "{}{}", op, e)
            }
            ExprKind::Binary(op, l, r) => write!(f, "{} {} {}", l, op, r),
            ExprKind::Selector(e, name) => write!(f, "{}.{}", e, name),
            ExprKind::Index(e, i) => write!(f, "{}[{}]", e, i),
            ExprKind::SliceExpr(e) => write!(f, "{}[:]", e),
            ExprKind::TypeAssert(e, _) => write!(f, "{}.(…)", e),
            ExprKind::Call(call) => write!(f, "{}(…)", call.callee),
            ExprKind::Type(_) => write!(f, "<type>"),
            ExprKind::Composite(_, _) | ExprKind::ElidedComposite(_) => write!(f, "{{…}}"),
            ExprKind::KeyValue(k, v) => write!(f, "{}: {}", k, v),
            ExprKind::FuncLit(_, _) => write!(f, "func(…) {{…}}"),
            ExprKind::Paren(e) => write!(f, "({})", e),
            ExprKind::Range(e, _) => write!(f, "range {}", e),
        }
    }
}
