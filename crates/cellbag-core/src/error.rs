//! Error types for bit string, cell and slice operations.

use num_bigint::BigInt;

/// Errors that can occur while building, reading or hashing cells.
#[derive(Debug, thiserror::Error)]
pub enum CellError {
    /// A write was attempted with the cursor already at capacity.
    #[error("BitString overflow")]
    Overflow,

    /// Indexed bit access beyond the bit string's capacity.
    #[error("bit index {index} out of range for capacity {capacity}")]
    OutOfRange {
        /// The requested bit index.
        index: usize,
        /// Capacity of the bit string.
        capacity: usize,
    },

    /// The value's minimal binary representation does not fit the width.
    #[error("bitLength is too small for number, got number={value}, bitLength={bit_len}")]
    BitLengthTooSmall {
        /// The value that was being written.
        value: BigInt,
        /// The requested width in bits.
        bit_len: usize,
    },

    /// An unsigned encoding was asked to write a negative value.
    #[error("cannot write negative number {0} as unsigned")]
    NegativeUnsigned(BigInt),

    /// No terminator bit in the trailing 7 bits of a top-upped byte array.
    #[error("incorrect top-upped array: terminator bit not found")]
    MalformedPadding,

    /// A cell already holds the maximum number of references.
    #[error("cell cannot hold more than {max} references")]
    TooManyRefs {
        /// Maximum number of references per cell.
        max: usize,
    },

    /// Attaching a child would make the cell graph deeper than allowed.
    #[error("cell depth cannot exceed {max}")]
    DepthLimitExceeded {
        /// Maximum depth of a cell graph.
        max: u16,
    },

    /// A slice read requested more bits than remain.
    #[error("slice underflow: requested {requested} bits, {remaining} remaining")]
    SliceUnderflow {
        /// Number of bits requested.
        requested: usize,
        /// Number of bits left in the slice.
        remaining: usize,
    },

    /// All references of the slice's cell have been consumed.
    #[error("no references left in slice")]
    RefsExhausted,

    /// An address record carried a tag other than `00` or `10`.
    #[error("unsupported address tag {0:#04b}")]
    InvalidAddressTag(u8),

    /// An address string could not be parsed.
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

/// Result type for cell operations.
pub type Result<T> = std::result::Result<T, CellError>;
