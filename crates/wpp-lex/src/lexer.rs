//! The moded lexer.
//!
//! One [`Lexer`] instance serves a single source buffer. Every call to
//! [`Lexer::next`] (or [`Lexer::peek`]) names the [`Mode`] to lex under;
//! the parser switches modes as it enters and leaves string literals.
//!
//! When a string opener is lexed, the lexer records the quote byte, the
//! user-chosen delimiter, and the string kind. String mode consults that
//! context to decide termination: the string ends at the first quote that is
//! immediately followed by the delimiter. Hex and bin literals do not use
//! string mode at all — their digit bodies are read by the parser one byte
//! at a time under [`Mode::Char`].

use wpp_util::{Diagnostic, FileId, Result, Span, Symbol};

use crate::cursor::{Cursor, CursorSnapshot};
use crate::token::{keyword_from_ident, StrKind, Token, TokenKind};

/// Lexing mode, chosen by the parser at each peek/advance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Whitespace and comments are skipped; keywords, identifiers,
    /// punctuation, and string openers are recognised.
    Normal,
    /// Inside a string body: literal chunks, escapes, and the closing quote.
    String,
    /// One raw byte at a time.
    Char,
}

/// Context for the string literal currently being lexed.
#[derive(Clone, Copy, Debug)]
struct StringCtx {
    /// The quote byte that opened the string (`"` or `'`).
    quote: u8,
    /// Byte range of the user-chosen delimiter in the source (empty for
    /// plain strings).
    delim_start: usize,
    delim_end: usize,
    kind: StrKind,
}

/// A saved lexer state, restorable with [`Lexer::restore`].
#[derive(Clone, Copy, Debug)]
pub struct LexerSnapshot {
    cursor: CursorSnapshot,
    string: Option<StringCtx>,
}

/// The Wot++ lexer.
///
/// # Example
///
/// ```
/// use wpp_lex::{Lexer, Mode, TokenKind};
/// use wpp_util::FileId;
///
/// let mut lexer = Lexer::new(b"let greet", FileId(0));
/// assert_eq!(lexer.next(Mode::Normal).unwrap().kind, TokenKind::Let);
/// ```
pub struct Lexer<'a> {
    cursor: Cursor<'a>,
    file: FileId,
    string: Option<StringCtx>,

    /// Start state of the token currently being lexed.
    token_start: usize,
    token_line: u32,
    token_column: u32,
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'/'
}

fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'/'
}

fn is_quote(b: u8) -> bool {
    b == b'"' || b == b'\''
}

/// Bytes allowed in a smart-string delimiter. Anything that could not start
/// or continue adjacent source text qualifies, which is what lets the lexer
/// back out to an identifier when no quote follows.
fn is_delim_byte(b: u8) -> bool {
    !b.is_ascii_whitespace() && !is_quote(b) && !is_ident_continue(b) && b.is_ascii() && b != 0
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a [u8], file: FileId) -> Self {
        Self {
            cursor: Cursor::new(source),
            file,
            string: None,
            token_start: 0,
            token_line: 1,
            token_column: 1,
        }
    }

    /// Lex one token under `mode` without consuming it.
    ///
    /// Implemented as lex-then-rewind, so repeated peeks under the same mode
    /// return the same token and commit nothing.
    pub fn peek(&mut self, mode: Mode) -> Result<Token> {
        let snapshot = self.snapshot();
        let token = self.next(mode);
        self.restore(snapshot);
        token
    }

    /// Lex and consume one token under `mode`.
    pub fn next(&mut self, mode: Mode) -> Result<Token> {
        match mode {
            Mode::Normal => self.next_normal(),
            Mode::String => self.next_string(),
            Mode::Char => self.next_byte(),
        }
    }

    /// The source bytes covered by `span`.
    pub fn slice(&self, span: Span) -> &'a [u8] {
        &self.cursor.source()[span.start..span.end]
    }

    pub fn snapshot(&self) -> LexerSnapshot {
        LexerSnapshot {
            cursor: self.cursor.snapshot(),
            string: self.string,
        }
    }

    pub fn restore(&mut self, snapshot: LexerSnapshot) {
        self.cursor.restore(snapshot.cursor);
        self.string = snapshot.string;
    }

    fn mark_start(&mut self) {
        self.token_start = self.cursor.position();
        self.token_line = self.cursor.line();
        self.token_column = self.cursor.column();
    }

    fn span(&self) -> Span {
        Span::new(
            self.file,
            self.token_start,
            self.cursor.position(),
            self.token_line,
            self.token_column,
        )
    }

    fn token(&self, kind: TokenKind) -> Token {
        Token::new(kind, self.span())
    }

    fn error(&self, message: impl Into<String>) -> Diagnostic {
        Diagnostic::lex(message, self.span())
    }

    // ------------------------------------------------------------------
    // Normal mode
    // ------------------------------------------------------------------

    fn next_normal(&mut self) -> Result<Token> {
        self.skip_trivia()?;
        self.mark_start();

        if self.cursor.is_at_end() {
            return Ok(self.token(TokenKind::Eof));
        }

        let b = self.cursor.current();
        match b {
            b'(' => {
                self.cursor.advance();
                Ok(self.token(TokenKind::LParen))
            }
            b')' => {
                self.cursor.advance();
                Ok(self.token(TokenKind::RParen))
            }
            b'{' => {
                self.cursor.advance();
                Ok(self.token(TokenKind::LBrace))
            }
            b'}' => {
                self.cursor.advance();
                Ok(self.token(TokenKind::RBrace))
            }
            b',' => {
                self.cursor.advance();
                Ok(self.token(TokenKind::Comma))
            }
            b'=' => {
                self.cursor.advance();
                Ok(self.token(TokenKind::Equal))
            }
            b'*' => {
                self.cursor.advance();
                Ok(self.token(TokenKind::Star))
            }
            b'!' => {
                self.cursor.advance();
                Ok(self.token(TokenKind::Bang))
            }
            b'.' => {
                self.cursor.advance();
                if self.cursor.match_byte(b'.') {
                    Ok(self.token(TokenKind::Cat))
                } else {
                    Err(self.error("expected '..'"))
                }
            }
            b'-' => {
                self.cursor.advance();
                if self.cursor.match_byte(b'>') {
                    Ok(self.token(TokenKind::Arrow))
                } else {
                    Err(self.error("expected '->'"))
                }
            }
            b'"' | b'\'' => {
                self.cursor.advance();
                let here = self.cursor.position();
                self.string = Some(StringCtx {
                    quote: b,
                    delim_start: here,
                    delim_end: here,
                    kind: StrKind::Normal,
                });
                Ok(self.token(TokenKind::Quote(StrKind::Normal)))
            }
            b'x' if is_quote(self.cursor.peek(1)) => self.lex_basis_opener(StrKind::Hex),
            b'b' if is_quote(self.cursor.peek(1)) => self.lex_basis_opener(StrKind::Bin),
            b'r' | b'p' | b'c' => {
                let kind = match b {
                    b'r' => StrKind::Raw,
                    b'p' => StrKind::Paragraph,
                    _ => StrKind::Code,
                };
                match self.try_smart_opener(kind) {
                    Some(token) => Ok(token),
                    None => Ok(self.lex_ident()),
                }
            }
            b if is_ident_start(b) => Ok(self.lex_ident()),
            b => {
                self.cursor.advance();
                Err(self.error(format!("unexpected character '{}'", render_byte(b))))
            }
        }
    }

    /// Lex a hex/bin opener: the basis letter immediately followed by a
    /// quote. The digit body is read by the parser under [`Mode::Char`].
    fn lex_basis_opener(&mut self, kind: StrKind) -> Result<Token> {
        self.cursor.advance(); // basis letter
        self.cursor.advance(); // quote
        Ok(self.token(TokenKind::Quote(kind)))
    }

    /// Try to lex `r`/`p`/`c` followed by a delimiter and a quote. Backs the
    /// cursor out and returns `None` when no quote follows, in which case
    /// the letter begins an ordinary identifier.
    fn try_smart_opener(&mut self, kind: StrKind) -> Option<Token> {
        let snapshot = self.cursor.snapshot();
        self.cursor.advance(); // type letter

        let delim_start = self.cursor.position();
        while !self.cursor.is_at_end() && is_delim_byte(self.cursor.current()) {
            self.cursor.advance();
        }
        let delim_end = self.cursor.position();

        let quote = self.cursor.current();
        if !is_quote(quote) {
            self.cursor.restore(snapshot);
            return None;
        }
        self.cursor.advance();

        self.string = Some(StringCtx {
            quote,
            delim_start,
            delim_end,
            kind,
        });
        Some(self.token(TokenKind::Quote(kind)))
    }

    fn lex_ident(&mut self) -> Token {
        while is_ident_continue(self.cursor.current()) {
            self.cursor.advance();
        }
        let text = self.cursor.slice_from(self.token_start);
        match keyword_from_ident(text) {
            Some(kind) => self.token(kind),
            None => self.token(TokenKind::Ident(Symbol::intern(text))),
        }
    }

    /// Skip whitespace and `#[ … ]` comments. Comments nest.
    fn skip_trivia(&mut self) -> Result<()> {
        loop {
            while !self.cursor.is_at_end() && self.cursor.current().is_ascii_whitespace() {
                self.cursor.advance();
            }

            if self.cursor.current() == b'#' && self.cursor.peek(1) == b'[' {
                self.mark_start();
                self.cursor.advance();
                self.cursor.advance();
                self.skip_comment()?;
                continue;
            }

            return Ok(());
        }
    }

    fn skip_comment(&mut self) -> Result<()> {
        let mut depth = 1u32;
        while depth > 0 {
            if self.cursor.is_at_end() {
                return Err(self.error("unterminated comment"));
            }
            if self.cursor.current() == b'#' && self.cursor.peek(1) == b'[' {
                self.cursor.advance();
                self.cursor.advance();
                depth += 1;
            } else if self.cursor.current() == b']' {
                self.cursor.advance();
                depth -= 1;
            } else {
                self.cursor.advance();
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // String mode
    // ------------------------------------------------------------------

    fn next_string(&mut self) -> Result<Token> {
        self.mark_start();

        let ctx = match self.string {
            Some(ctx) => ctx,
            None => return Err(self.error("string mode with no open string")),
        };

        if self.cursor.is_at_end() {
            return Err(self.error("unterminated string"));
        }

        if self.at_terminator(&ctx) {
            let delim_len = ctx.delim_end - ctx.delim_start;
            self.cursor.advance_n(1 + delim_len);
            self.string = None;
            return Ok(self.token(TokenKind::CloseQuote));
        }

        if ctx.kind.processes_escapes() && self.cursor.current() == b'\\' {
            return self.lex_escape();
        }

        // Literal chunk: everything up to the next escape or terminator.
        while !self.cursor.is_at_end() {
            if self.at_terminator(&ctx) {
                break;
            }
            if ctx.kind.processes_escapes() && self.cursor.current() == b'\\' {
                break;
            }
            self.cursor.advance();
        }
        Ok(self.token(TokenKind::Chunk))
    }

    /// True when the cursor sits on the string's quote byte and the bytes
    /// right after it spell the delimiter.
    fn at_terminator(&self, ctx: &StringCtx) -> bool {
        if self.cursor.current() != ctx.quote {
            return false;
        }
        let delim = &self.cursor.source()[ctx.delim_start..ctx.delim_end];
        self.cursor.remaining()[1..].starts_with(delim)
    }

    fn lex_escape(&mut self) -> Result<Token> {
        self.cursor.advance(); // backslash

        if self.cursor.is_at_end() {
            return Err(self.error("unterminated escape sequence"));
        }

        let marker = self.cursor.current();
        self.cursor.advance();

        let byte = match marker {
            b'"' => b'"',
            b'\'' => b'\'',
            b'\\' => b'\\',
            b'n' => b'\n',
            b't' => b'\t',
            b'r' => b'\r',
            b'x' => self.lex_escape_digits(16, 2)?,
            b'b' => self.lex_escape_digits(2, 8)?,
            other => {
                return Err(self.error(format!(
                    "unknown escape sequence '\\{}'",
                    render_byte(other)
                )))
            }
        };

        Ok(self.token(TokenKind::Escape(byte)))
    }

    /// Read exactly `count` digits in `base` and fold them into one byte.
    fn lex_escape_digits(&mut self, base: u32, count: u32) -> Result<u8> {
        let mut value: u32 = 0;
        for _ in 0..count {
            if self.cursor.is_at_end() {
                return Err(self.error("unterminated escape sequence"));
            }
            let digit = self.cursor.current();
            let parsed = (digit as char).to_digit(base).ok_or_else(|| {
                self.error(format!(
                    "invalid base-{} digit '{}' in escape",
                    base,
                    render_byte(digit)
                ))
            })?;
            value = value * base + parsed;
            self.cursor.advance();
        }
        Ok(value as u8)
    }

    // ------------------------------------------------------------------
    // Char mode
    // ------------------------------------------------------------------

    fn next_byte(&mut self) -> Result<Token> {
        self.mark_start();
        if self.cursor.is_at_end() {
            return Ok(self.token(TokenKind::Eof));
        }
        let b = self.cursor.current();
        self.cursor.advance();
        Ok(self.token(TokenKind::Byte(b)))
    }
}

/// Printable rendering of a byte for error messages.
fn render_byte(b: u8) -> String {
    if b.is_ascii_graphic() || b == b' ' {
        (b as char).to_string()
    } else {
        format!("\\x{:02X}", b)
    }
}
