//! wpp-lex - The Wot++ lexer.
//!
//! The lexer turns a byte buffer into tokens on demand. It is *moded*: the
//! parser chooses a [`Mode`] at every [`Lexer::peek`]/[`Lexer::next`] call,
//! because the same bytes mean different things inside and outside a string
//! literal.
//!
//! - [`Mode::Normal`] skips whitespace and `#[ … ]` comments and produces
//!   keywords, identifiers, punctuation, and string-form openers.
//! - [`Mode::String`] produces literal chunks, decoded escapes, and the
//!   closing quote of the string opened most recently. Termination respects
//!   the smart-string rule: a quote only closes the string when it is
//!   immediately followed by the user-chosen delimiter.
//! - [`Mode::Char`] produces exactly one raw byte; the parser uses it to
//!   read hex/bin digit bodies byte by byte.
//!
//! `peek` is lex-then-rewind over a cursor snapshot, so it is idempotent for
//! a given mode and never commits state.

pub mod cursor;
pub mod lexer;
pub mod token;

mod edge_cases;

pub use cursor::Cursor;
pub use lexer::{Lexer, Mode};
pub use token::{IntrinsicKind, StrKind, Token, TokenKind};
