//! Error kinds surfaced across the crate's public API.
//!
//! Rule-level parse failure is *not* an error (see [`crate::parse_result::ParseResult`]):
//! it is a normal, recoverable outcome that feeds back into `Choice`. The variants here
//! are the ones spec.md §7 calls out as propagating to the caller.

use crate::range::TextRange;

/// Errors produced by [`crate::parsed_string::ParsedString`] and its collaborators.
#[derive(Debug, thiserror::Error)]
pub enum ParchmentError {
    /// The parser terminated before consuming the whole buffer. The partial tree is
    /// still retained by the caller; this is recoverable.
    #[error("incomplete parse: stopped at position {position}")]
    IncompleteParsing { position: u32 },

    /// Attempted to insert a replacement interval overlapping one already recorded.
    #[error("replacement interval at {range:?} overlaps an existing one")]
    OverlappingReplacement { range: TextRange },

    /// A coordinate translation or `path(to:)` lookup used an index outside the buffer.
    #[error("index {index} is out of bounds (length {length})")]
    OutOfBounds { index: u32, length: u32 },

    /// Misuse that indicates a programming error rather than bad input: popping an
    /// empty scope stack, or a grammar with no `start` rule.
    #[error("programming error: {message}")]
    ProgrammingError { message: String },
}

pub type Result<T> = std::result::Result<T, ParchmentError>;
