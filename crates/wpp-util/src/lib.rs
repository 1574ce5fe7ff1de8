//! wpp-util - Foundation types for the Wot++ pipeline.
//!
//! Every later stage builds on the types defined here:
//!
//! - [`Span`] and [`SourceMap`] for position tracking across ordinary files
//!   and meta-evaluated fragments,
//! - [`Symbol`] for interned byte-string names (Wot++ names can be built at
//!   runtime from arbitrary bytes, so the interner is byte-keyed),
//! - [`Diagnostic`] as the single error type flowing out of the lexer,
//!   parser, and evaluator,
//! - [`IndexVec`] as the storage primitive behind the append-only AST store.

pub mod diagnostic;
pub mod index_vec;
pub mod span;
pub mod symbol;

pub use diagnostic::{Category, Diagnostic, Result};
pub use index_vec::{Idx, IndexVec};
pub use span::{FileId, SourceFile, SourceMap, Span};
pub use symbol::Symbol;
