//! The expression tree embedded in compiled instructions.
//!
//! Every variable has already been bound to a slot by the compiler so the
//! renderer never looks names up in the render context while evaluating.

use serde::{Deserialize, Serialize};

use crate::types::span::Span;
use crate::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Literal(Literal),
    Var(Var),
    Index(Index),
    Member(Member),
    Unary(Unary),
    Binary(Binary),
    Ternary(Ternary),
    Call(Call),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Literal {
    pub value: Value,
    pub span: Span,
}

/// A reference to a bound template variable, e.g. `TITLE`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Var {
    pub slot: usize,
    pub span: Span,
}

/// Indexing with brackets, e.g. `ROW[id]` or `ITEMS[INDEX]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Index {
    pub receiver: Box<Expr>,
    pub key: Box<Expr>,
    pub span: Span,
}

/// Member access, e.g. `AUTHOR->name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub receiver: Box<Expr>,
    pub name: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unary {
    pub op: UnaryOp,
    pub operand: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Not,
    Neg,
    Plus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Binary {
    pub op: BinaryOp,
    pub lhs: Box<Expr>,
    pub rhs: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Mul,
    Div,
    Rem,
    Add,
    Sub,
    Concat,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    Identical,
    NotIdentical,
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ternary {
    pub cond: Box<Expr>,
    pub then: Box<Expr>,
    pub otherwise: Box<Expr>,
    pub span: Span,
}

/// A function call, e.g. `strlen(AUTHOR->name)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Call {
    pub name: String,
    pub args: Vec<Expr>,
    pub span: Span,
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Self::Literal(lit) => lit.span,
            Self::Var(var) => var.span,
            Self::Index(index) => index.span,
            Self::Member(member) => member.span,
            Self::Unary(unary) => unary.span,
            Self::Binary(binary) => binary.span,
            Self::Ternary(ternary) => ternary.span,
            Self::Call(call) => call.span,
        }
    }
}

impl BinaryOp {
    /// Returns the binding power of the operator, higher binds tighter.
    pub fn precedence(self) -> u8 {
        match self {
            Self::Or => 1,
            Self::And => 2,
            Self::Eq | Self::Ne | Self::Identical | Self::NotIdentical => 3,
            Self::Lt | Self::Le | Self::Gt | Self::Ge => 4,
            Self::Add | Self::Sub | Self::Concat => 5,
            Self::Mul | Self::Div | Self::Rem => 6,
        }
    }
}
