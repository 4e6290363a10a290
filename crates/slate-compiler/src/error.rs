use std::fmt::Write as _;

use thiserror::Error;
use tracing::warn;

use crate::token::Position;
use crate::types::ValueType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Lexical,
    Syntactic,
    Semantic,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    // Lexical
    #[error("encountered invalid token {text}")]
    InvalidToken { text: String },
    #[error("integer literal {text} is out of range")]
    IntegerOutOfRange { text: String },

    // Syntactic
    #[error("unexpected token {found}")]
    UnexpectedToken { found: String },
    #[error("unexpected end of expression")]
    UnexpectedEndOfExpression,
    #[error("unexpected termination of statement for {construct}")]
    UnexpectedTermination { construct: &'static str },
    #[error("expected {expected}, found {found}")]
    ExpectedToken { expected: &'static str, found: String },
    #[error("missing left operand for operator {op}")]
    MissingLeftOperand { op: String },
    #[error("missing right operand for operator {op}")]
    MissingRightOperand { op: String },
    #[error("unmatched grouping {text}")]
    UnmatchedGrouper { text: String },

    // Semantic
    #[error("undefined variable {name}")]
    UndefinedVariable { name: String },
    #[error("unknown function {name}")]
    UnknownFunction { name: String },
    #[error("unknown type {name}")]
    UnknownType { name: String },
    #[error("function {name} expects {expected} argument(s), found {found}")]
    ArityMismatch { name: String, expected: usize, found: usize },
    #[error("operator {op} does not support operation on left {left} and right {right} values")]
    BinaryTypeMismatch { op: String, left: ValueType, right: ValueType },
    #[error("operator {op} does not support operation on {operand} value")]
    UnaryTypeMismatch { op: String, operand: ValueType },
    #[error("binding expression type {found} does not match expected type {expected}")]
    BindingTypeMismatch { expected: ValueType, found: ValueType },
    #[error("condition must be boolean, found {found}")]
    ConditionNotBoolean { found: ValueType },
    #[error("{name} is already bound in this scope")]
    DuplicateBinding { name: String },
}

impl DiagnosticKind {
    pub fn code(&self) -> u32 {
        use DiagnosticKind::*;
        match self {
            InvalidToken { .. } => 101,
            IntegerOutOfRange { .. } => 102,
            UnexpectedToken { .. } => 201,
            UnexpectedTermination { .. } => 202,
            ExpectedToken { .. } => 203,
            UnexpectedEndOfExpression => 204,
            MissingLeftOperand { .. } => 205,
            MissingRightOperand { .. } => 206,
            UnmatchedGrouper { .. } => 207,
            UndefinedVariable { .. } => 301,
            UnknownFunction { .. } => 302,
            UnknownType { .. } => 303,
            ArityMismatch { .. } => 304,
            BinaryTypeMismatch { .. } => 305,
            UnaryTypeMismatch { .. } => 306,
            BindingTypeMismatch { .. } => 307,
            ConditionNotBoolean { .. } => 308,
            DuplicateBinding { .. } => 309,
        }
    }

    pub fn category(&self) -> Category {
        match self.code() / 100 {
            1 => Category::Lexical,
            2 => Category::Syntactic,
            _ => Category::Semantic,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{pos} :: {kind}")]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub pos: Position,
}

/// Append-only record of everything that went wrong during one compilation.
#[derive(Debug, Default)]
pub struct DiagnosticLog {
    entries: Vec<Diagnostic>,
}

impl DiagnosticLog {
    pub fn new() -> Self { Self::default() }

    pub fn push(&mut self, kind: DiagnosticKind, pos: Position) {
        warn!(code = kind.code(), %pos, "{kind}");
        self.entries.push(Diagnostic { kind, pos });
    }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
    pub fn len(&self) -> usize { self.entries.len() }

    pub fn into_vec(self) -> Vec<Diagnostic> { self.entries }

    /// Hands the log over as a failure if anything was recorded.
    pub fn check(&mut self) -> Result<(), CompileFailure> {
        if self.entries.is_empty() { Ok(()) } else { Err(CompileFailure { diagnostics: std::mem::take(&mut self.entries) }) }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("compilation failed with {} error(s)", .diagnostics.len())]
pub struct CompileFailure {
    pub diagnostics: Vec<Diagnostic>,
}

impl CompileFailure {
    pub fn report(&self) -> String {
        let mut out = String::from("compilation encountered the following errors --\n");
        for d in &self.diagnostics {
            let _ = writeln!(out, "  {d}");
        }
        let _ = writeln!(out, "{} error(s)", self.diagnostics.len());
        out
    }

    pub fn kinds(&self) -> Vec<&DiagnosticKind> { self.diagnostics.iter().map(|d| &d.kind).collect() }
}

pub type CompileResult<T> = Result<T, CompileFailure>;
