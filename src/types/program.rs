//! Defines a compiled [`Program`] which is a sequence of [`Instr`] that can be
//! executed by the renderer.

use serde::{Deserialize, Serialize};

use crate::types::expr::Expr;
use crate::types::span::Span;

pub const FIXME: usize = !0;

/// A compiled template for exactly one language.
///
/// This is the render artifact produced by the compiler. It can be persisted
/// with `serde` and executed by any [`Engine`][crate::Engine] against a render
/// context. All translations have been resolved when it was compiled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub(crate) name: String,
    pub(crate) language: String,
    pub(crate) source: String,
    pub(crate) variables: Vec<String>,
    pub(crate) instrs: Vec<Instr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Instr {
    /// Emit literal template text
    EmitRaw(String),

    /// Evaluate and emit the expression
    Emit(Expr),

    /// Emit a translated format string with the evaluated arguments
    Printf(Printf),

    /// Jump to an instruction
    Jump(usize),

    /// Jump to the instruction if the expression is falsy
    JumpIfFalse(Expr, usize),

    /// Jump to the first case equal to the subject, or fall through into the
    /// default body that follows this instruction
    Switch(Switch),

    /// Start a loop over the expression
    LoopStart(Loop),

    /// Advance the innermost loop or pop it and jump past the loop body
    LoopNext(usize),

    /// Render another template with the same render context
    Include(Include),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Printf {
    pub format: String,
    pub args: Vec<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Switch {
    pub subject: Expr,
    pub cases: Vec<Case>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Case {
    pub value: Expr,
    pub target: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loop {
    pub iterable: Expr,
    pub key: Option<usize>,
    pub value: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Include {
    pub name: String,
    pub span: Span,
}

impl Program {
    /// Returns the name of the template this program was compiled from.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the language the translations were resolved for.
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Returns the template source after inline includes were expanded.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns every variable referenced by the template, in order of first
    /// use.
    ///
    /// At render time each one is bound to the render context field with the
    /// lower-cased name, or to an empty string if there is no such field.
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// Returns `true` if the template references the given variable.
    pub fn references(&self, name: &str) -> bool {
        self.variables.iter().any(|v| v == name)
    }
}
