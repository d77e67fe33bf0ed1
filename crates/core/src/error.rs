//! Error types for the adaptive Huffman codec.
//!
//! Nothing in this crate recovers from an error internally: every failure
//! aborts the current encode or decode and is returned to the caller, who
//! owns any partially written output.

use thiserror::Error;

/// Top-level error type for all codec operations.
///
/// Each variant corresponds to a specific failure domain:
/// - I/O: the underlying byte source or sink failed
/// - Bit I/O: bit-level framing problems (truncated stream, bad bit counts)
/// - Structural: the code tree and the stream disagree (corruption)
/// - Header: the container header is malformed
#[derive(Debug, Error)]
pub enum Error {
    /// File or stream I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Bit I/O operation failed (e.g., input ended before END_OF_STREAM)
    #[error("bit I/O error: {0}")]
    BitIo(#[from] BitIoError),

    /// The stream drove the code tree into an impossible state
    #[error("structural error: {0}")]
    Structural(#[from] StructuralError),

    /// Container header error (e.g., non-ASCII extension)
    #[error("header error: {0}")]
    Header(String),
}

/// Bit-level I/O errors.
#[derive(Debug, Error)]
pub enum BitIoError {
    /// The byte source ran dry in the middle of the logical stream
    #[error("unexpected end of bit stream after {bytes_read} bytes")]
    UnexpectedEof { bytes_read: u64 },

    /// Invalid bit count (more than 64 bits in one call)
    #[error("invalid bit count: {0}")]
    InvalidBitCount(usize),
}

/// Code tree consistency errors.
#[derive(Debug, Error)]
pub enum StructuralError {
    /// A decode traversal stepped outside the occupied node range
    #[error("node index {index} outside valid range 0..{limit}")]
    NodeOutOfRange { index: usize, limit: usize },

    /// No free slots remain for a new leaf
    #[error("code tree is full ({capacity} nodes)")]
    TreeFull { capacity: usize },

    /// An escaped literal named a symbol the tree already holds
    #[error("escaped literal {0:#04x} is already in the tree")]
    DuplicateSymbol(u8),

    /// The node chosen for splitting was not a leaf
    #[error("lightest node {index} is not a leaf")]
    LightestNotLeaf { index: usize },

    /// A symbol with no leaf was passed where one is required
    #[error("symbol {0} has no leaf in the tree")]
    MissingLeaf(u16),

    /// The control symbol ESCAPE cannot be coded directly
    #[error("symbol {0} cannot be coded directly")]
    InvalidSymbol(u16),

    /// A leaf sits deeper than the bit writer can emit in one call
    #[error("code length {0} exceeds 64 bits")]
    CodeTooLong(usize),
}

/// Type alias for Result with our Error type
pub type Result<T> = std::result::Result<T, Error>;
