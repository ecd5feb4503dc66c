//! Error types for BOC encoding and decoding.

use std::io;

use cellbag_core::CellError;

/// Errors that can occur while reading or writing a bag of cells.
#[derive(Debug, thiserror::Error)]
pub enum BocError {
    #[error("invalid BOC magic prefix {0:02x?}")]
    InvalidMagic([u8; 4]),

    #[error("not enough bytes for {what}")]
    NotEnoughBytes { what: &'static str },

    #[error("invalid size field width {0}, expected 1..=4")]
    InvalidSizeBytes(u8),

    #[error("invalid offset field width {0}, expected 1..=8")]
    InvalidOffsetBytes(u8),

    #[error("root index {index} out of range for {count} cells")]
    RootIndexOutOfRange { index: usize, count: usize },

    #[error("crc32c mismatch: stored {stored:08x}, computed {computed:08x}")]
    CrcMismatch { stored: u32, computed: u32 },

    #[error("too much bytes in BoC serialization: {0} trailing")]
    TrailingBytes(usize),

    #[error("topological order is broken: cell {cell} references cell {reference}")]
    BrokenTopologicalOrder { cell: usize, reference: usize },

    #[error("cell {cell} references index {index}, but only {count} cells are present")]
    RefIndexOutOfRange {
        cell: usize,
        index: usize,
        count: usize,
    },

    /// A decoded cell sits above a reference chain longer than
    /// [`MAX_DEPTH`](cellbag_core::MAX_DEPTH).
    #[error("cell {cell} exceeds the maximum depth of {max}")]
    DepthLimitExceeded { cell: usize, max: u16 },

    /// A cell holds more references than the 3-bit descriptor field can count.
    #[error("cell {index} has {refs} references and cannot be encoded")]
    UnencodableRefs { index: usize, refs: usize },

    #[error("expected exactly one root cell, found {0}")]
    RootCountMismatch(usize),

    #[error("input is neither hex nor base64: {0}")]
    InvalidEncoding(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Cell(#[from] CellError),
}

/// Result type for BOC operations.
pub type Result<T> = std::result::Result<T, BocError>;
