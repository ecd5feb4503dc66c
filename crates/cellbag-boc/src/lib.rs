//! Bag of Cells (BOC) serialization for cell graphs.
//!
//! Flattens one or more root cells into the standard binary container and
//! reads it back, sharing repeated sub-graphs and verifying the optional
//! CRC32-C trailer.
//!
//! ## Layout
//!
//! ```text
//! BOC Layout:
//! ┌──────────────────────────────────────┐
//! │ Magic: B5EE9C72                      │  4 bytes
//! │ has_idx|crc|cache|flags(2)|size(3)   │  1 byte
//! │ offset_bytes                         │  1 byte
//! ├──────────────────────────────────────┤
//! │ cell_count, root_count, absent       │  size_bytes each
//! │ total_cells_size                     │  offset_bytes
//! │ root indices                         │  size_bytes each
//! │ index (optional)                     │  offset_bytes each
//! ├──────────────────────────────────────┤
//! │ cells: d1 d2 data ref-indices        │
//! ├──────────────────────────────────────┤
//! │ CRC32-C, little-endian (optional)    │  4 bytes
//! └──────────────────────────────────────┘
//! ```
//!
//! ```
//! use cellbag_boc::{BocOptions, CellBoc};
//! use cellbag_core::Cell;
//!
//! let mut cell = Cell::new();
//! cell.bits.write_uint(2, 8).unwrap();
//!
//! let hex = cell.to_boc_hex(&BocOptions::default()).unwrap();
//! let back = Cell::one_from_boc(hex.as_str()).unwrap();
//! assert_eq!(back.hash(), cell.hash());
//! ```

mod codec;
pub mod error;
mod format;
mod source;

use std::io::{Read, Write};
use std::sync::Arc;

use cellbag_core::Cell;

pub use error::{BocError, Result};
pub use format::{
    crc32c, BocHeader, BocMagic, BocOptions, LEAN_CRC_MAGIC, LEAN_MAGIC, REACH_MAGIC,
};
pub use source::BocSource;

/// A set of root cells serialized together.
#[derive(Debug, Clone, Default)]
pub struct BagOfCells {
    pub roots: Vec<Arc<Cell>>,
}

impl BagOfCells {
    pub fn new(roots: Vec<Arc<Cell>>) -> Self {
        Self { roots }
    }

    pub fn single(root: impl Into<Arc<Cell>>) -> Self {
        Self {
            roots: vec![root.into()],
        }
    }

    /// Serialize to a byte vector.
    pub fn to_bytes(&self, options: &BocOptions) -> Result<Vec<u8>> {
        let roots: Vec<&Cell> = self.roots.iter().map(|root| root.as_ref()).collect();
        codec::serialize(&roots, options)
    }

    /// Serialize as uppercase hex.
    pub fn to_hex(&self, options: &BocOptions) -> Result<String> {
        Ok(hex::encode_upper(self.to_bytes(options)?))
    }

    /// Serialize to a writer.
    pub fn write_to<W: Write>(&self, writer: &mut W, options: &BocOptions) -> Result<()> {
        writer.write_all(&self.to_bytes(options)?)?;
        Ok(())
    }

    /// Deserialize from raw bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_bytes_with_header(data).map(|(_, bag)| bag)
    }

    /// Deserialize from raw bytes, also returning the decoded header.
    pub fn from_bytes_with_header(data: &[u8]) -> Result<(BocHeader, Self)> {
        let (header, roots) = codec::deserialize(data)?;
        Ok((header, Self { roots }))
    }

    /// Deserialize from bytes, hex or base64.
    pub fn parse<'a>(source: impl Into<BocSource<'a>>) -> Result<Self> {
        Self::from_bytes(&source.into().decode()?)
    }

    /// Deserialize from a reader, detecting binary or text content.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::parse(BocSource::sniff(&data))
    }

    /// The only root, or [`BocError::RootCountMismatch`].
    pub fn into_single_root(mut self) -> Result<Arc<Cell>> {
        match self.roots.len() {
            1 => Ok(self.roots.remove(0)),
            n => Err(BocError::RootCountMismatch(n)),
        }
    }
}

/// BOC conversions on a single cell.
pub trait CellBoc {
    /// Serialize the graph below this cell with it as the only root.
    fn to_boc(&self, options: &BocOptions) -> Result<Vec<u8>>;

    /// [`CellBoc::to_boc`] rendered as uppercase hex.
    fn to_boc_hex(&self, options: &BocOptions) -> Result<String> {
        Ok(hex::encode_upper(self.to_boc(options)?))
    }

    /// All roots of a serialized bag.
    fn from_boc<'a>(source: impl Into<BocSource<'a>>) -> Result<Vec<Arc<Cell>>> {
        BagOfCells::parse(source).map(|bag| bag.roots)
    }

    /// The root of a bag that must hold exactly one.
    fn one_from_boc<'a>(source: impl Into<BocSource<'a>>) -> Result<Arc<Cell>> {
        BagOfCells::parse(source)?.into_single_root()
    }
}

impl CellBoc for Cell {
    fn to_boc(&self, options: &BocOptions) -> Result<Vec<u8>> {
        codec::serialize(&[self], options)
    }
}
