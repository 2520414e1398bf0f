//! Source buffers that spans refer back into.
//!
//! A [`Source`] is an immutable, fully buffered copy of the input. Whether the
//! input came from a string or from a seekable stream only matters while it is
//! being loaded; afterwards every span is resolved against the same buffer.
use std::fmt;
use std::io::{Read, Seek, SeekFrom};
use std::str::FromStr;

use tracing::debug;

use crate::lexer::ErrorCode;
use crate::span::Span;

/// Any byte stream that can be read and repositioned.
pub trait ReadSeek: Read + Seek {}

impl<T: Read + Seek + ?Sized> ReadSeek for T {}

/// The kinds of input a [`Source`] can be loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    String,
    Stream,
}

impl FromStr for SourceKind {
    type Err = LoadError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "string" => Ok(SourceKind::String),
            "stream" => Ok(SourceKind::Stream),
            other => Err(LoadError::LexerType(other.to_string())),
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::String => f.write_str("string"),
            SourceKind::Stream => f.write_str("stream"),
        }
    }
}

/// Input handed to [`Source::load`].
pub enum Origin<'a> {
    String(&'a str),
    Stream(&'a mut dyn ReadSeek),
}

impl Origin<'_> {
    pub fn kind(&self) -> SourceKind {
        match self {
            Origin::String(_) => SourceKind::String,
            Origin::Stream(_) => SourceKind::Stream,
        }
    }
}

/// Errors raised while constructing a [`Source`].
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("invalid arguments: {0}")]
    Arguments(String),
    #[error("unknown lexer type `{0}`")]
    LexerType(String),
    #[error("failed to read source: {0}")]
    Io(#[from] std::io::Error),
}

impl LoadError {
    /// The error code of this failure, if it belongs to the format's taxonomy.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            LoadError::Arguments(_) => Some(ErrorCode::Arguments),
            LoadError::LexerType(_) => Some(ErrorCode::LexerType),
            LoadError::Io(_) => None,
        }
    }
}

/// An immutable text buffer addressed by byte offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    text: Box<str>,
}

impl Source {
    /// Creates a source from an in-memory string.
    pub fn new(text: impl Into<Box<str>>) -> Result<Self, LoadError> {
        let text = text.into();
        check_length(text.len() as u64)?;
        Ok(Self { text })
    }

    /// Loads a source from a seekable stream.
    ///
    /// The length is measured once by seeking to the end and back; the bytes
    /// from the current position up to that length are then read into memory.
    pub fn from_stream<R: Read + Seek>(mut stream: R) -> Result<Self, LoadError> {
        let start = stream.stream_position()?;
        let end = stream.seek(SeekFrom::End(0))?;
        stream.seek(SeekFrom::Start(start))?;

        let length = end.saturating_sub(start);
        check_length(length)?;

        let mut bytes = Vec::new();
        bytes
            .try_reserve_exact(length as usize)
            .map_err(|err| LoadError::Arguments(format!("cannot buffer {length} bytes: {err}")))?;
        (&mut stream).take(length).read_to_end(&mut bytes)?;

        let text = String::from_utf8(bytes)
            .map_err(|err| LoadError::Arguments(format!("source is not valid UTF-8: {err}")))?;
        debug!(length, "loaded source from stream");

        Self::new(text)
    }

    /// Loads a source from either kind of origin.
    pub fn load(origin: Origin<'_>) -> Result<Self, LoadError> {
        match origin {
            Origin::String(text) => Self::new(text),
            Origin::Stream(stream) => Self::from_stream(stream),
        }
    }

    /// Loads a source after checking that `kind` names the kind of `origin`.
    pub fn open(kind: &str, origin: Origin<'_>) -> Result<Self, LoadError> {
        let kind: SourceKind = kind.parse()?;
        if kind != origin.kind() {
            return Err(LoadError::Arguments(format!(
                "expected a {kind} origin, got a {}",
                origin.kind()
            )));
        }
        Self::load(origin)
    }

    /// The byte at `pos`, or `None` past the end.
    #[inline]
    pub fn get(&self, pos: usize) -> Option<u8> {
        self.text.as_bytes().get(pos).copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.text.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// The text covered by `span`.
    ///
    /// # Panics
    ///
    /// Panics if the span is out of bounds or does not lie on character
    /// boundaries, which only happens when it was produced by another source.
    #[inline]
    pub fn slice(&self, span: Span) -> &str {
        &self.text[span.range()]
    }

    /// The text covered by `span`, if it lies within this source.
    #[inline]
    pub fn try_slice(&self, span: Span) -> Option<&str> {
        self.text.get(span.range())
    }

    /// One-based line and column of byte offset `pos`.
    pub fn location(&self, pos: usize) -> (usize, usize) {
        let before = &self.text.as_bytes()[..pos.min(self.text.len())];
        let line = 1 + before.iter().filter(|&&b| b == b'\n').count();
        let column = match before.iter().rposition(|&b| b == b'\n') {
            Some(newline) => pos - newline,
            None => pos + 1,
        };
        (line, column)
    }
}

impl FromStr for Source {
    type Err = LoadError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Self::new(text)
    }
}

impl TryFrom<String> for Source {
    type Error = LoadError;

    fn try_from(text: String) -> Result<Self, Self::Error> {
        Self::new(text)
    }
}

fn check_length(length: u64) -> Result<(), LoadError> {
    if length > u64::from(u32::MAX) {
        return Err(LoadError::Arguments(format!(
            "source of {length} bytes exceeds the addressable {} bytes",
            u32::MAX
        )));
    }
    Ok(())
}
