//! Error types for the klang kernel.

use std::ops::Range;

use thiserror::Error;

/// Error produced while lexing or parsing a script.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("parse error at {span:?}: {message}")]
pub struct ParseError {
    /// Byte range in the source text.
    pub span: Range<usize>,
    pub message: String,
}

impl ParseError {
    pub fn new(span: Range<usize>, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
        }
    }
}

/// Error produced while executing a script.
///
/// An error aborts the current statement. [`RuntimeError::Command`] is
/// raised when a `kubectl` or `shellScript` call fails at its seam; the
/// evaluator catches it in the BOOLEAN-coercing statement position and
/// downgrades it to a `false` statement value. Every other kind propagates
/// out of the evaluator. The store retains state through the last
/// successful statement.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    /// Unknown function, or an unbound variable used outside the contexts
    /// that tolerate missingness (`!x`, `if x`).
    #[error("name error: {0}")]
    Name(String),
    /// Operator applied to incompatible operand kinds.
    #[error("type error: {0}")]
    Type(String),
    /// Division by zero or integer overflow.
    #[error("arithmetic error: {0}")]
    Arithmetic(String),
    /// Malformed path, or a write path with a structurally impossible step.
    #[error("path error: {0}")]
    Path(String),
    /// Input neither JSON nor YAML, or a multi-doc index out of range.
    #[error("document error: {0}")]
    Document(String),
    /// Failure crossing the cluster or shell seam. The evaluator coerces
    /// this to a BOOLEAN `false` value when the command is itself the
    /// statement; outside that position it propagates like any other kind.
    /// Malformed command usage is not this kind — it raises [`Name`] or
    /// [`Type`] errors instead.
    ///
    /// [`Name`]: RuntimeError::Name
    /// [`Type`]: RuntimeError::Type
    #[error("command error: {0}")]
    Command(String),
    /// Host cancellation. Subsequent statements are not executed.
    #[error("cancelled")]
    Cancelled,
}

/// Top-level error for running a script end to end.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum KlangError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}
