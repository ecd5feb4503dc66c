//! Bit strings, cells and slices for the Bag of Cells format.
//!
//! Data is built bottom-up: write bits into a [`Cell`], attach children as
//! shared [`Arc`](std::sync::Arc) handles, then hash the result or hand it to
//! a serializer. [`Slice`] reads a finished cell back field by field.
//!
//! ```
//! use cellbag_core::{BigUint, Cell};
//!
//! let mut child = Cell::new();
//! child.bits.write_uint8(3).unwrap();
//!
//! let mut root = Cell::new();
//! root.bits.write_uint(0x0102u16, 16).unwrap();
//! root.push_ref(child).unwrap();
//!
//! assert_eq!(root.print(), "x{0102}\n x{03}\n");
//! assert_eq!(root.begin_parse().load_uint(16).unwrap(), BigUint::from(0x0102u16));
//! ```

pub mod address;
pub mod bits;
pub mod cell;
pub mod error;
pub mod hash;
pub mod slice;

pub use address::{Address, FriendlyFormat};
pub use bits::BitString;
pub use cell::{Cell, MAX_BITS, MAX_DEPTH, MAX_REFS};
pub use error::{CellError, Result};
pub use hash::{hash_hex, CellHash};
pub use slice::Slice;

pub use num_bigint::{BigInt, BigUint};
