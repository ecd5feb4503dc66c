//! Header layout, magic prefixes and serialization options.
//!
//! Every multi-byte integer in the header is big-endian. Counts use
//! `size_bytes` bytes each and sizes or offsets use `offset_bytes` bytes each.
//! The trailing CRC32-C is the only little-endian field.

use crc::{Crc, CRC_32_ISCSI};

use crate::error::{BocError, Result};

/// Generic BOC prefix; the header carries explicit flags.
pub const REACH_MAGIC: [u8; 4] = [0xB5, 0xEE, 0x9C, 0x72];

/// Lean prefix: index present, no checksum.
pub const LEAN_MAGIC: [u8; 4] = [0x68, 0xFF, 0x65, 0xF3];

/// Lean prefix: index present, CRC32-C appended.
pub const LEAN_CRC_MAGIC: [u8; 4] = [0xAC, 0xC3, 0xA7, 0x28];

const CASTAGNOLI: Crc<u32> = Crc::<u32>::new(&CRC_32_ISCSI);

/// CRC32-C (Castagnoli) checksum as appended to serialized bags.
pub fn crc32c(data: &[u8]) -> u32 {
    CASTAGNOLI.checksum(data)
}

/// The prefix a bag was serialized with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BocMagic {
    Reach,
    Lean,
    LeanCrc,
}

impl BocMagic {
    pub fn bytes(self) -> [u8; 4] {
        match self {
            BocMagic::Reach => REACH_MAGIC,
            BocMagic::Lean => LEAN_MAGIC,
            BocMagic::LeanCrc => LEAN_CRC_MAGIC,
        }
    }

    pub fn from_bytes(bytes: [u8; 4]) -> Option<Self> {
        match bytes {
            REACH_MAGIC => Some(BocMagic::Reach),
            LEAN_MAGIC => Some(BocMagic::Lean),
            LEAN_CRC_MAGIC => Some(BocMagic::LeanCrc),
            _ => None,
        }
    }

    /// True when `data` starts with any known prefix.
    pub fn detect(data: &[u8]) -> bool {
        data.get(..4)
            .and_then(|prefix| <[u8; 4]>::try_from(prefix).ok())
            .and_then(Self::from_bytes)
            .is_some()
    }
}

impl std::fmt::Display for BocMagic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            BocMagic::Reach => "reach",
            BocMagic::Lean => "lean",
            BocMagic::LeanCrc => "lean-crc",
        })
    }
}

/// Serialization switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BocOptions {
    /// Write the per-cell offset table.
    pub index: bool,
    /// Append a CRC32-C over the whole serialization.
    pub crc32c: bool,
    /// Set the cache-bits header flag. Nothing else changes.
    pub cache_bits: bool,
}

impl Default for BocOptions {
    fn default() -> Self {
        Self {
            index: true,
            crc32c: true,
            cache_bits: false,
        }
    }
}

impl BocOptions {
    /// No index, with checksum: the layout most wallet contracts ship in.
    pub const COMPACT: BocOptions = BocOptions {
        index: false,
        crc32c: true,
        cache_bits: false,
    };

    pub fn with_index(mut self, index: bool) -> Self {
        self.index = index;
        self
    }

    pub fn with_crc32c(mut self, crc32c: bool) -> Self {
        self.crc32c = crc32c;
        self
    }

    pub fn with_cache_bits(mut self, cache_bits: bool) -> Self {
        self.cache_bits = cache_bits;
        self
    }
}

/// Decoded BOC header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BocHeader {
    pub magic: BocMagic,
    pub has_index: bool,
    pub has_crc32c: bool,
    pub has_cache_bits: bool,
    /// The two reserved flag bits.
    pub flags: u8,
    pub size_bytes: u8,
    pub offset_bytes: u8,
    pub cell_count: usize,
    pub root_count: usize,
    pub absent_count: usize,
    pub total_cells_size: usize,
    pub root_indices: Vec<usize>,
    /// Offset table, when present.
    pub index: Vec<usize>,
}

impl BocHeader {
    /// Parse the header and locate the cell data.
    ///
    /// Validates the checksum and that nothing follows it. Returns the header
    /// together with exactly `total_cells_size` bytes of cell data.
    pub fn parse(data: &[u8]) -> Result<(Self, &[u8])> {
        let mut reader = ByteReader::new(data);
        let prefix: [u8; 4] = reader
            .take(4, "magic prefix")?
            .try_into()
            .map_err(|_| BocError::NotEnoughBytes {
                what: "magic prefix",
            })?;
        let magic = BocMagic::from_bytes(prefix).ok_or(BocError::InvalidMagic(prefix))?;

        let (has_index, has_crc32c, has_cache_bits, flags, size_bytes) = match magic {
            BocMagic::Reach => {
                let byte = reader.u8("header flags")?;
                (
                    byte & 0x80 != 0,
                    byte & 0x40 != 0,
                    byte & 0x20 != 0,
                    (byte >> 3) & 0b11,
                    byte & 0b111,
                )
            }
            BocMagic::Lean => (true, false, false, 0, reader.u8("size width")?),
            BocMagic::LeanCrc => (true, true, false, 0, reader.u8("size width")?),
        };
        if !(1..=4).contains(&size_bytes) {
            return Err(BocError::InvalidSizeBytes(size_bytes));
        }
        let offset_bytes = reader.u8("offset width")?;
        if !(1..=8).contains(&offset_bytes) {
            return Err(BocError::InvalidOffsetBytes(offset_bytes));
        }
        let size = size_bytes as usize;
        let offset = offset_bytes as usize;

        let cell_count = reader.uint(size, "cell count")?;
        let root_count = reader.uint(size, "root count")?;
        let absent_count = reader.uint(size, "absent count")?;
        let total_cells_size = reader.uint(offset, "total cells size")?;

        let mut root_indices = Vec::with_capacity(root_count.min(reader.remaining()));
        for _ in 0..root_count {
            let index = reader.uint(size, "root list")?;
            if index >= cell_count {
                return Err(BocError::RootIndexOutOfRange {
                    index,
                    count: cell_count,
                });
            }
            root_indices.push(index);
        }

        let mut index = Vec::new();
        if has_index {
            index.reserve(cell_count.min(reader.remaining()));
            for _ in 0..cell_count {
                index.push(reader.uint(offset, "index")?);
            }
        }

        let cells = reader.take(total_cells_size, "cell data")?;

        if has_crc32c {
            let stored = reader.take(4, "crc32c")?;
            let stored = u32::from_le_bytes([stored[0], stored[1], stored[2], stored[3]]);
            let computed = crc32c(&data[..data.len() - 4]);
            if stored != computed {
                return Err(BocError::CrcMismatch { stored, computed });
            }
        }
        if reader.remaining() > 0 {
            return Err(BocError::TrailingBytes(reader.remaining()));
        }

        let header = Self {
            magic,
            has_index,
            has_crc32c,
            has_cache_bits,
            flags,
            size_bytes,
            offset_bytes,
            cell_count,
            root_count,
            absent_count,
            total_cells_size,
            root_indices,
            index,
        };
        Ok((header, cells))
    }
}

/// Bytes needed to hold `value`, never less than one.
pub(crate) fn byte_width(value: usize) -> usize {
    ((usize::BITS - value.leading_zeros()) as usize)
        .div_ceil(8)
        .max(1)
}

/// Append `value` as a `width`-byte big-endian integer.
pub(crate) fn put_uint(out: &mut Vec<u8>, value: usize, width: usize) {
    let bytes = (value as u64).to_be_bytes();
    out.extend_from_slice(&bytes[8 - width..]);
}

/// Forward-only cursor over a byte slice.
pub(crate) struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub(crate) fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub(crate) fn take(&mut self, n: usize, what: &'static str) -> Result<&'a [u8]> {
        if n > self.remaining() {
            return Err(BocError::NotEnoughBytes { what });
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    pub(crate) fn u8(&mut self, what: &'static str) -> Result<u8> {
        Ok(self.take(1, what)?[0])
    }

    /// Big-endian unsigned integer of `width` bytes, at most 8.
    pub(crate) fn uint(&mut self, width: usize, what: &'static str) -> Result<usize> {
        let value = self
            .take(width, what)?
            .iter()
            .fold(0u64, |acc, &b| (acc << 8) | u64::from(b));
        // Larger than memory; the next length check rejects it.
        Ok(usize::try_from(value).unwrap_or(usize::MAX))
    }
}
