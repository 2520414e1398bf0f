use std::fmt;

use delegate::delegate;
use tracing::debug;

use crate::source::Source;
use crate::span::Span;

/// Error codes of the format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Bad input handed to a constructor.
    Arguments,
    /// Unrecognised source kind.
    LexerType,
    /// A bracket was never closed.
    Unbalanced,
    /// A stray or mismatched bracket, or a name outside the head of a list.
    Unexpected,
    /// Quoted text that is never closed.
    Unterminated,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorCode::Arguments => "Invalid arguments",
            ErrorCode::LexerType => "Unknown lexer type",
            ErrorCode::Unbalanced => "Unbalanced",
            ErrorCode::Unexpected => "Unexpected",
            ErrorCode::Unterminated => "Unterminated",
        })
    }
}

/// A syntax error, located in the source.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("[{line}:{column}:{cursor}]: {code} {}", describe(.found))]
pub struct LexError {
    pub code: ErrorCode,
    /// Byte offset of the offending character.
    pub cursor: usize,
    pub line: usize,
    pub column: usize,
    /// The offending character, `None` at the end of input.
    pub found: Option<char>,
}

fn describe(found: &Option<char>) -> String {
    match found {
        Some(c) => format!("{c:?}"),
        None => "end of input".to_string(),
    }
}

/// Whitespace separating tokens.
#[inline]
pub(crate) fn is_space(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c)
}

/// Punctuation that ends a bare token.
#[inline]
pub(crate) fn is_punct(byte: u8) -> bool {
    matches!(
        byte,
        b'(' | b')' | b'[' | b']' | b'{' | b'}' | b'\'' | b'"' | b','
    )
}

/// Cursor over a [`Source`] that tracks lines and columns.
#[derive(Debug, Clone)]
pub struct Lexer<'src> {
    source: &'src Source,
    cursor: usize,
    line: usize,
    column: usize,
    error: Option<LexError>,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src Source) -> Self {
        Self {
            source,
            cursor: 0,
            line: 1,
            column: 1,
            error: None,
        }
    }

    #[inline]
    pub fn source(&self) -> &'src Source {
        self.source
    }

    delegate! {
        to self.source {
            /// Random access to any byte of the source.
            pub fn get(&self, pos: usize) -> Option<u8>;
            pub fn len(&self) -> usize;
            pub fn is_empty(&self) -> bool;
        }
    }

    /// The byte under the cursor.
    #[inline]
    pub fn peek(&self) -> Option<u8> {
        self.source.get(self.cursor)
    }

    /// Moves past the current byte and returns the new current byte.
    pub fn advance(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.cursor += 1;
        if byte == b'\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        self.peek()
    }

    #[inline]
    pub fn at_end(&self) -> bool {
        self.cursor >= self.source.len()
    }

    #[inline]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[inline]
    pub fn line(&self) -> usize {
        self.line
    }

    #[inline]
    pub fn column(&self) -> usize {
        self.column
    }

    pub fn skip_space(&mut self) {
        while self.peek().is_some_and(is_space) {
            self.advance();
        }
    }

    /// Skips a `;` comment up to and including its line terminator.
    pub fn skip_comment(&mut self) {
        if self.peek() != Some(b';') {
            return;
        }
        while let Some(byte) = self.peek() {
            self.advance();
            if byte == b'\n' || byte == b'\r' {
                break;
            }
        }
    }

    /// The span between `start` and the cursor.
    #[inline]
    pub(crate) fn span_from(&self, start: usize) -> Span {
        // Sources are limited to `u32::MAX` bytes.
        Span::new(start as u32, self.cursor as u32)
    }

    /// Records an error at the cursor.
    ///
    /// Only the first error of a lexer is kept; it is returned by every call.
    pub fn error(&mut self, code: ErrorCode) -> LexError {
        if self.error.is_none() {
            let error = LexError {
                code,
                cursor: self.cursor,
                line: self.line,
                column: self.column,
                found: self.char_at(self.cursor),
            };
            self.record(error);
        }
        self.recorded()
    }

    /// Records an error at an earlier byte offset.
    pub fn error_at(&mut self, code: ErrorCode, pos: usize) -> LexError {
        if self.error.is_none() {
            let (line, column) = self.source.location(pos);
            let error = LexError {
                code,
                cursor: pos,
                line,
                column,
                found: self.char_at(pos),
            };
            self.record(error);
        }
        self.recorded()
    }

    /// The first error recorded, if any.
    #[inline]
    pub fn last_error(&self) -> Option<&LexError> {
        self.error.as_ref()
    }

    fn record(&mut self, error: LexError) {
        debug!(
            code = ?error.code,
            line = error.line,
            column = error.column,
            cursor = error.cursor,
            "{error}"
        );
        self.error = Some(error);
    }

    fn recorded(&self) -> LexError {
        match &self.error {
            Some(error) => error.clone(),
            None => unreachable!("an error was just recorded"),
        }
    }

    fn char_at(&self, pos: usize) -> Option<char> {
        self.source.as_str().get(pos..)?.chars().next()
    }
}
