//! Cells: the nodes of a Bag of Cells graph.
//!
//! A cell owns up to 1023 bits of data and up to four ordered references to
//! child cells. Children are shared through `Arc`, so one cell may be
//! referenced by several parents (or several times by the same parent), but
//! a cell can never reach itself: once wrapped in an `Arc` it is immutable.

use std::fmt;
use std::sync::Arc;

use crate::bits::BitString;
use crate::error::{CellError, Result};
use crate::hash::{hash_hex, CellHash, HashCache};
use crate::slice::Slice;

/// Data capacity of a cell in bits.
pub const MAX_BITS: usize = 1023;

/// Maximum number of references a cell may hold.
pub const MAX_REFS: usize = 4;

/// Deepest path allowed below any cell, counted in references.
pub const MAX_DEPTH: u16 = 1024;

/// A DAG node holding a bit payload and ordered child references.
#[derive(Debug, Clone)]
pub struct Cell {
    pub bits: BitString,
    pub refs: Vec<Arc<Cell>>,
    /// Special-cell flag carried through from decoded data. Its contents are
    /// not interpreted.
    pub exotic: bool,
}

impl Default for Cell {
    fn default() -> Self {
        Self::new()
    }
}

impl Cell {
    /// Create an empty cell with a full-capacity bit string.
    pub fn new() -> Self {
        Self {
            bits: BitString::new(MAX_BITS),
            refs: Vec::new(),
            exotic: false,
        }
    }

    /// Assemble a cell from already-decoded parts.
    pub fn from_parts(bits: BitString, refs: Vec<Arc<Cell>>, exotic: bool) -> Self {
        Self { bits, refs, exotic }
    }

    /// Append a child reference, failing once the cell holds [`MAX_REFS`]
    /// or when the child would put this cell beyond [`MAX_DEPTH`].
    pub fn push_ref(&mut self, child: impl Into<Arc<Cell>>) -> Result<()> {
        if self.refs.len() >= MAX_REFS {
            return Err(CellError::TooManyRefs { max: MAX_REFS });
        }
        let child = child.into();
        if child.max_depth() >= MAX_DEPTH {
            return Err(CellError::DepthLimitExceeded { max: MAX_DEPTH });
        }
        self.refs.push(child);
        Ok(())
    }

    /// Flatten `other` into this cell: its bits are appended to ours and its
    /// references to our reference list.
    pub fn write_cell(&mut self, other: &Cell) -> Result<()> {
        if self.refs.len() + other.refs.len() > MAX_REFS {
            return Err(CellError::TooManyRefs { max: MAX_REFS });
        }
        if other.max_depth() > MAX_DEPTH {
            return Err(CellError::DepthLimitExceeded { max: MAX_DEPTH });
        }
        self.bits.write_bit_string(&other.bits)?;
        self.refs.extend(other.refs.iter().cloned());
        Ok(())
    }

    /// First descriptor byte: reference count plus 8 for exotic cells. Level
    /// bits are always zero.
    pub fn refs_descriptor(&self) -> u8 {
        self.refs.len() as u8 + if self.exotic { 8 } else { 0 }
    }

    /// Second descriptor byte: `ceil(bits / 8) + floor(bits / 8)`, so the low
    /// bit is set when the last byte is padded.
    pub fn bits_descriptor(&self) -> u8 {
        let used = self.bits.used_bits();
        (used.div_ceil(8) + used / 8) as u8
    }

    /// Descriptor bytes followed by the top-upped data.
    pub fn data_with_descriptors(&self) -> Vec<u8> {
        let data = self.bits.top_upped_bytes();
        let mut out = Vec::with_capacity(2 + data.len());
        out.push(self.refs_descriptor());
        out.push(self.bits_descriptor());
        out.extend_from_slice(&data);
        out
    }

    /// Depth of the deepest path below this cell.
    pub fn max_depth(&self) -> u16 {
        HashCache::new().depth(self)
    }

    /// The bytes hashed by [`Cell::hash`].
    pub fn repr(&self) -> Vec<u8> {
        HashCache::new().repr(self)
    }

    /// SHA-256 hash of this cell and, transitively, its children.
    pub fn hash(&self) -> CellHash {
        HashCache::new().hash(self)
    }

    pub fn hash_hex(&self) -> String {
        hash_hex(&self.hash())
    }

    /// Recursive dump: `x{HEX}` per line, children indented by one space per
    /// level, depth first.
    pub fn print(&self) -> String {
        self.to_string()
    }

    fn print_into(&self, out: &mut impl fmt::Write, depth: usize) -> fmt::Result {
        writeln!(out, "{:depth$}x{{{}}}", "", self.bits)?;
        for child in &self.refs {
            child.print_into(out, depth + 1)?;
        }
        Ok(())
    }

    /// Start reading this cell from its first bit and first reference.
    pub fn begin_parse(&self) -> Slice<'_> {
        Slice::new(self)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.print_into(f, 0)
    }
}
