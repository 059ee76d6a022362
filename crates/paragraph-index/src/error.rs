//! Error types for paragraph index operations.

use crate::descriptor::ParagraphId;
use crate::range::TextRange;
use std::fmt;
use thiserror::Error;

/// What a failed lookup was looking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Missing {
    /// A paragraph with this identifier.
    Paragraph(ParagraphId),
    /// A paragraph covering this offset.
    Offset(usize),
    /// Any paragraph overlapping this range.
    Range(TextRange),
}

impl fmt::Display for Missing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Missing::Paragraph(id) => write!(f, "paragraph {id}"),
            Missing::Offset(offset) => write!(f, "paragraph at offset {offset}"),
            Missing::Range(range) => write!(f, "paragraph in range {range}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Errors produced by paragraph lookups, edits and the synchronization engine.
pub enum ParagraphError {
    #[error("paragraph index {index} out of range (paragraph count {count})")]
    /// A paragraph index outside `[0, count)`.
    IndexOutOfRange {
        /// The requested index.
        index: usize,
        /// Number of paragraphs in the table.
        count: usize,
    },

    #[error("range {range} out of range for buffer of length {len}")]
    /// A range or offset reaching past the end of the buffer.
    OutOfRange {
        /// The offending range (an offset is reported as an empty range).
        range: TextRange,
        /// Buffer length in UTF-16 code units.
        len: usize,
    },

    #[error("offset {0} splits a surrogate pair")]
    /// An offset landing between the two halves of a surrogate pair.
    NotCharBoundary(usize),

    #[error("{0} not found")]
    /// An identifier or descriptor that is no longer present.
    NotFound(Missing),

    #[error("paragraph table invariant violated: {0}")]
    /// The descriptor table no longer mirrors the buffer. Always a defect.
    InvariantViolation(String),
}

/// Result alias used throughout the crate.
pub type Result<T, E = ParagraphError> = std::result::Result<T, E>;

impl ParagraphError {
    pub(crate) fn invariant(message: impl Into<String>) -> Self {
        ParagraphError::InvariantViolation(message.into())
    }
}
