//! The seven error kinds of §7: every public operation that can fail
//! returns a `Result<_, Error>` rather than unwinding, with the `Context`'s
//! reporter invoked once at the boundary (see [`crate::context::Context`]).

use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// A single parse failure from the WKT/WKB/TWKB readers: offset plus
/// message, never a partially constructed geometry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// Byte offset (WKB/TWKB) or column (WKT) at which parsing failed.
    pub offset: usize,
    pub message: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "at offset {}: {}", self.offset, self.message)
    }
}

impl std::error::Error for ParseError {}

impl ParseError {
    pub fn new(offset: usize, message: impl Into<String>) -> Self {
        ParseError {
            offset,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("{operation} is not supported for {kind}")]
    UnsupportedGeometryType {
        operation: &'static str,
        kind: &'static str,
    },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid input at {context}, near vertex {vertex_index}: {message}")]
    InvalidInputAt {
        context: &'static str,
        vertex_index: usize,
        message: String,
    },

    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error("degenerate arithmetic ({context}): {message}")]
    ArithmeticDegenerate {
        context: &'static str,
        message: String,
    },

    #[error("interrupted")]
    Interrupted,

    #[error("external collaborator failed: {0}")]
    ExternalFailure(String),

    #[error("allocation failure")]
    AllocationFailure,

    #[error("parse error: {0}")]
    Parse(ParseError),
}

impl Error {
    pub fn unsupported(operation: &'static str, kind: &'static str) -> Self {
        Error::UnsupportedGeometryType { operation, kind }
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        Error::InvariantViolation(message.into())
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Error::InvalidInput(message.into())
    }
}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        Error::Parse(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_message_names_kind_and_operation() {
        let e = Error::unsupported("maxdistance_2d", "CurvePolygon");
        assert_eq!(
            e.to_string(),
            "maxdistance_2d is not supported for CurvePolygon"
        );
    }
}
