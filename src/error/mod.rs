//! Error types.
//!
//! [`EncodeError`] is returned by every fallible encoder operation. Markup
//! reading failures are reported as [`ParseError`], which carries the source
//! location of the problem.

use std::fmt;

use thiserror::Error;

/// Errors produced while configuring or running an encode pass.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Encoding was requested before a document was supplied.
    #[error("encoder has not been initialized with a document")]
    NotInitialized,

    /// A required argument was missing or malformed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// No content serializer is registered for the MIME type.
    #[error("unsupported output format: {0}")]
    UnsupportedFormat(String),

    /// The character-set label is unknown.
    #[error("unsupported character set: {0}")]
    EncodingUnsupported(String),

    /// Writing to the output sink failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Range promotion reached a boundary it could not resolve.
    #[error("range promotion failed: {0}")]
    PromotionFailed(String),

    /// An output buffer could not be grown.
    #[error("out of memory")]
    OutOfMemory,
}

/// Source location within a markup input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number (in characters, not bytes).
    pub column: u32,
    /// 0-based byte offset from the start of the input.
    pub byte_offset: usize,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// The error type returned when reading markup fails.
#[derive(Debug, Clone, Error)]
#[error("{message} at {location}")]
pub struct ParseError {
    /// Human-readable error message.
    pub message: String,
    /// Where in the source the error occurred.
    pub location: SourceLocation,
}
