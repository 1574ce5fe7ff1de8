//! Error reporting.
//!
//! Wot++ has exactly three error categories: lex, parse, and eval. Every
//! error is fatal to the current evaluation, so instead of collecting
//! diagnostics and pressing on, each stage returns a [`Diagnostic`] through
//! [`Result`] and the caller decides how to surface it (the CLI exits
//! non-zero, the REPL prints and rolls the environment back).

use thiserror::Error;

use crate::span::{SourceMap, Span};

/// Which stage produced an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Category {
    Lex,
    Parse,
    Eval,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Lex => write!(f, "lex"),
            Category::Parse => write!(f, "parse"),
            Category::Eval => write!(f, "eval"),
        }
    }
}

/// A fatal error with its category and source position.
///
/// The `Display` form omits the file name (the span only carries a
/// [`crate::FileId`]); use [`Diagnostic::render`] with a [`SourceMap`] for
/// the full `file:line:col` form.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{category} error: {message}")]
pub struct Diagnostic {
    pub category: Category,
    pub message: String,
    pub span: Span,
}

impl Diagnostic {
    pub fn new(category: Category, message: impl Into<String>, span: Span) -> Self {
        Self {
            category,
            message: message.into(),
            span,
        }
    }

    /// A lexer error.
    pub fn lex(message: impl Into<String>, span: Span) -> Self {
        Self::new(Category::Lex, message, span)
    }

    /// A parser error.
    pub fn parse(message: impl Into<String>, span: Span) -> Self {
        Self::new(Category::Parse, message, span)
    }

    /// An evaluation (runtime) error.
    pub fn eval(message: impl Into<String>, span: Span) -> Self {
        Self::new(Category::Eval, message, span)
    }

    /// Render as `file:line:col: <category> error: message`.
    pub fn render(&self, sources: &SourceMap) -> String {
        format!(
            "{}:{}:{}: {} error: {}",
            sources.name(self.span.file),
            self.span.line,
            self.span.column,
            self.category,
            self.message
        )
    }
}

/// Result alias used by every pipeline stage.
pub type Result<T> = std::result::Result<T, Diagnostic>;
