//! Byte cursor for traversing source buffers.
//!
//! The cursor tracks the current byte offset plus 1-based line and column.
//! Columns count bytes — tab width is one — which keeps positions exact for
//! a language whose strings and identifiers are byte sequences.

/// A cursor over a source byte buffer.
///
/// # Example
///
/// ```
/// use wpp_lex::Cursor;
///
/// let mut cursor = Cursor::new(b"let x");
/// assert_eq!(cursor.current(), b'l');
/// cursor.advance();
/// assert_eq!(cursor.current(), b'e');
/// ```
pub struct Cursor<'a> {
    source: &'a [u8],
    position: usize,
    line: u32,
    column: u32,
}

/// A saved cursor state, restorable with [`Cursor::restore`].
#[derive(Clone, Copy, Debug)]
pub struct CursorSnapshot {
    position: usize,
    line: u32,
    column: u32,
}

impl<'a> Cursor<'a> {
    pub fn new(source: &'a [u8]) -> Self {
        Self {
            source,
            position: 0,
            line: 1,
            column: 1,
        }
    }

    /// The byte at the cursor, or `0` at end of input.
    #[inline]
    pub fn current(&self) -> u8 {
        self.peek(0)
    }

    /// The byte `offset` positions ahead, or `0` past the end.
    #[inline]
    pub fn peek(&self, offset: usize) -> u8 {
        self.source
            .get(self.position + offset)
            .copied()
            .unwrap_or(0)
    }

    /// Advance one byte, updating line/column tracking.
    #[inline]
    pub fn advance(&mut self) {
        if let Some(&b) = self.source.get(self.position) {
            self.position += 1;
            if b == b'\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    pub fn advance_n(&mut self, count: usize) {
        for _ in 0..count {
            if self.is_at_end() {
                break;
            }
            self.advance();
        }
    }

    #[inline]
    pub fn is_at_end(&self) -> bool {
        self.position >= self.source.len()
    }

    /// Consume `expected` if it is the current byte.
    pub fn match_byte(&mut self, expected: u8) -> bool {
        if self.current() == expected {
            self.advance();
            true
        } else {
            false
        }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    #[inline]
    pub fn line(&self) -> u32 {
        self.line
    }

    #[inline]
    pub fn column(&self) -> u32 {
        self.column
    }

    /// Bytes from `start` up to the cursor.
    pub fn slice_from(&self, start: usize) -> &'a [u8] {
        &self.source[start..self.position]
    }

    /// Bytes from the cursor to the end of input.
    pub fn remaining(&self) -> &'a [u8] {
        &self.source[self.position..]
    }

    pub fn source(&self) -> &'a [u8] {
        self.source
    }

    pub fn snapshot(&self) -> CursorSnapshot {
        CursorSnapshot {
            position: self.position,
            line: self.line,
            column: self.column,
        }
    }

    pub fn restore(&mut self, snapshot: CursorSnapshot) {
        self.position = snapshot.position;
        self.line = snapshot.line;
        self.column = snapshot.column;
    }
}
