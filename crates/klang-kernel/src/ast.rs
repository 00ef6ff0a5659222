//! AST type definitions.
//!
//! The AST is the seam between the parser and the evaluator: the evaluator
//! consumes these types and never touches source text.

use std::fmt;

use klang_types::Value;

/// A complete klang program is a sequence of statements.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

/// A single statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// Variable assignment: `name = expr;`
    Assign(Assignment),
    /// Conditional: `if cond { ... } else { ... }`
    If(IfStmt),
    /// Loop: `while cond { ... }`
    While(WhileStmt),
    /// Expression statement whose result is discarded:
    /// a function call, a bare `kubectl` command, or a `shellScript` block.
    Expr(Expr),
}

/// Variable assignment. The RHS may be any expression, including an
/// identifier (copy by value), a `kubectl` command, or a `shellScript` block.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub name: String,
    pub value: Expr,
}

/// Conditional statement. Blocks do not introduce a scope.
#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub condition: Box<Expr>,
    pub then_branch: Vec<Stmt>,
    pub else_branch: Option<Vec<Stmt>>,
}

/// While loop. The condition is re-evaluated before each iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct WhileStmt {
    pub condition: Box<Expr>,
    pub body: Vec<Stmt>,
}

/// An expression that evaluates to a value.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal value. Inline JSON object literals arrive here as STRING
    /// literals holding the raw source text.
    Literal(Value),
    /// Variable reference.
    Ident(String),
    /// Unary operation: `!x`, `-x`
    Unary { op: UnaryOp, operand: Box<Expr> },
    /// Binary operation: `a + b`, `a == b`, `a && b`, ...
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
    /// Built-in function call: `jsonSelect(x, "a.b")`
    Call(FunctionCall),
    /// `kubectl VERB ARGS`
    Kubectl(KubectlCmd),
    /// `shellScript` followed by a raw backtick block.
    ShellScript(String),
}

/// A built-in function call.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    pub args: Vec<Expr>,
}

/// A `kubectl` command: verb plus free-form arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct KubectlCmd {
    pub verb: String,
    pub args: Vec<KubeArg>,
}

/// One kubectl argument token.
#[derive(Debug, Clone, PartialEq)]
pub enum KubeArg {
    /// Bareword (`-n`, `dev`, `cm/test-cm`). Resolved against the store at
    /// run time: a bound name splices its STRING value as a single token,
    /// an unbound word is used verbatim.
    Word(String),
    /// Quoted string, spliced verbatim and never resolved.
    Literal(String),
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `!` — boolean negation; a missing variable operand negates to true.
    Not,
    /// `-` — numeric negation.
    Neg,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `+` — numeric add, or string concatenation when either side is a string.
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/` — float if either operand is float, else truncating integer division.
    Div,
    /// `==` — strict kind match; mismatched kinds compare unequal.
    Eq,
    /// `!=`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    LtEq,
    /// `>`
    Gt,
    /// `>=`
    GtEq,
    /// `&&` — short-circuit.
    And,
    /// `||` — short-circuit.
    Or,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOp::Not => write!(f, "!"),
            UnaryOp::Neg => write!(f, "-"),
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinaryOp::Add => write!(f, "+"),
            BinaryOp::Sub => write!(f, "-"),
            BinaryOp::Mul => write!(f, "*"),
            BinaryOp::Div => write!(f, "/"),
            BinaryOp::Eq => write!(f, "=="),
            BinaryOp::NotEq => write!(f, "!="),
            BinaryOp::Lt => write!(f, "<"),
            BinaryOp::LtEq => write!(f, "<="),
            BinaryOp::Gt => write!(f, ">"),
            BinaryOp::GtEq => write!(f, ">="),
            BinaryOp::And => write!(f, "&&"),
            BinaryOp::Or => write!(f, "||"),
        }
    }
}
