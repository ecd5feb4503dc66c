//! Cell graph flattening, serialization and deserialization.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use cellbag_core::{BitString, Cell, MAX_DEPTH};
use tracing::{debug, trace};

use crate::error::{BocError, Result};
use crate::format::{byte_width, crc32c, put_uint, BocHeader, BocOptions, ByteReader, REACH_MAGIC};

/// Largest reference count the descriptor byte can express.
const MAX_ENCODABLE_REFS: usize = 7;

fn key(cell: &Cell) -> *const Cell {
    cell as *const Cell
}

/// Cells in serialization order, each stored once by identity.
///
/// Every reference points to a cell with a strictly greater index than its
/// parent. Roots are walked in the order given.
pub(crate) struct CellOrder<'c> {
    cells: Vec<&'c Cell>,
    index: HashMap<*const Cell, usize>,
}

impl<'c> CellOrder<'c> {
    pub(crate) fn build(roots: &[&'c Cell]) -> Self {
        let mut order = Self {
            cells: Vec::new(),
            index: HashMap::new(),
        };
        for &root in roots {
            order.walk(root, None);
        }
        order
    }

    pub(crate) fn len(&self) -> usize {
        self.cells.len()
    }

    pub(crate) fn index_of(&self, cell: &Cell) -> usize {
        self.index[&key(cell)]
    }

    fn walk(&mut self, cell: &'c Cell, parent: Option<*const Cell>) {
        let cell_key = key(cell);
        if let Some(&existing) = self.index.get(&cell_key) {
            let parent_index = parent.and_then(|p| self.index.get(&p).copied());
            if parent_index.is_some_and(|p| p > existing) {
                self.move_to_end(cell);
            }
            return;
        }
        self.index.insert(cell_key, self.cells.len());
        self.cells.push(cell);
        for child in &cell.refs {
            self.walk(child, Some(cell_key));
        }
    }

    /// Move `cell` and everything below it behind all other cells.
    ///
    /// The moved block is ordered as if `cell` and then each of its children
    /// were moved to the end one at a time, depth first, so a cell reached
    /// twice ends up where its last move put it.
    fn move_to_end(&mut self, cell: &'c Cell) {
        let Some(&target) = self.index.get(&key(cell)) else {
            return;
        };
        let mut moved = HashSet::new();
        let mut block = Vec::new();
        collect_subtree(cell, &mut moved, &mut block);
        block.reverse();

        self.cells.retain(|c| !moved.contains(&key(c)));
        self.cells.extend(block);
        for (position, c) in self.cells.iter().enumerate() {
            self.index.insert(key(c), position);
        }
        trace!(from = target, cells = moved.len(), "moved subtree to end");
    }
}

/// Post-order over the cells below `cell`, children last to first, each
/// distinct cell once.
fn collect_subtree<'c>(cell: &'c Cell, seen: &mut HashSet<*const Cell>, out: &mut Vec<&'c Cell>) {
    if !seen.insert(key(cell)) {
        return;
    }
    for child in cell.refs.iter().rev() {
        collect_subtree(child, seen, out);
    }
    out.push(cell);
}

/// Serialize the graphs below `roots` into one bag.
pub(crate) fn serialize(roots: &[&Cell], options: &BocOptions) -> Result<Vec<u8>> {
    let order = CellOrder::build(roots);
    let cell_count = order.len();
    let size_bytes = byte_width(cell_count);

    let mut cells_data = Vec::new();
    let mut offsets = Vec::with_capacity(cell_count);
    for (index, cell) in order.cells.iter().enumerate() {
        if cell.refs.len() > MAX_ENCODABLE_REFS {
            return Err(BocError::UnencodableRefs {
                index,
                refs: cell.refs.len(),
            });
        }
        offsets.push(cells_data.len());
        cells_data.extend_from_slice(&cell.data_with_descriptors());
        for child in &cell.refs {
            let child_index = order.index_of(child);
            debug_assert!(child_index > index);
            put_uint(&mut cells_data, child_index, size_bytes);
        }
    }

    let total_size = cells_data.len();
    let offset_bytes = byte_width(total_size);

    let mut out = Vec::with_capacity(total_size + 32);
    out.extend_from_slice(&REACH_MAGIC);
    out.push(
        (u8::from(options.index) << 7)
            | (u8::from(options.crc32c) << 6)
            | (u8::from(options.cache_bits) << 5)
            | size_bytes as u8,
    );
    out.push(offset_bytes as u8);
    put_uint(&mut out, cell_count, size_bytes);
    put_uint(&mut out, roots.len(), size_bytes);
    put_uint(&mut out, 0, size_bytes);
    put_uint(&mut out, total_size, offset_bytes);
    for root in roots {
        put_uint(&mut out, order.index_of(root), size_bytes);
    }
    if options.index {
        for offset in &offsets {
            put_uint(&mut out, *offset, offset_bytes);
        }
    }
    out.extend_from_slice(&cells_data);
    if options.crc32c {
        let crc = crc32c(&out);
        out.extend_from_slice(&crc.to_le_bytes());
    }

    debug!(
        cells = cell_count,
        roots = roots.len(),
        size_bytes,
        offset_bytes,
        bytes = out.len(),
        "serialized bag of cells"
    );
    Ok(out)
}

struct RawCell {
    bits: BitString,
    refs: Vec<usize>,
    exotic: bool,
}

fn parse_cell(reader: &mut ByteReader<'_>, size_bytes: usize) -> Result<RawCell> {
    let d1 = reader.u8("cell descriptors")?;
    let d2 = reader.u8("cell descriptors")?;
    let ref_count = (d1 & 0b111) as usize;
    let exotic = d1 & 0b1000 != 0;

    let data = reader.take((d2 as usize).div_ceil(2), "cell data")?;
    let bits = BitString::from_top_upped(data, d2 % 2 == 0)?;

    let mut refs = Vec::with_capacity(ref_count);
    for _ in 0..ref_count {
        refs.push(reader.uint(size_bytes, "cell references")?);
    }
    Ok(RawCell { bits, refs, exotic })
}

/// Decode a bag into its root cells.
pub(crate) fn deserialize(data: &[u8]) -> Result<(BocHeader, Vec<Arc<Cell>>)> {
    let (header, cells_data) = BocHeader::parse(data)?;
    let count = header.cell_count;
    // Each cell takes at least its two descriptor bytes.
    if count > cells_data.len() / 2 {
        return Err(BocError::NotEnoughBytes { what: "cell data" });
    }

    let mut reader = ByteReader::new(cells_data);
    let mut raw = Vec::with_capacity(count);
    for _ in 0..count {
        raw.push(parse_cell(&mut reader, header.size_bytes as usize)?);
    }

    // References always point forward, so building from the back means every
    // child exists before its parent.
    let mut built: Vec<Option<Arc<Cell>>> = vec![None; count];
    let mut depths = vec![0u16; count];
    for (cell, raw_cell) in raw.into_iter().enumerate().rev() {
        let mut refs = Vec::with_capacity(raw_cell.refs.len());
        let mut depth = 0;
        for &reference in &raw_cell.refs {
            if reference <= cell {
                return Err(BocError::BrokenTopologicalOrder { cell, reference });
            }
            let child = built
                .get(reference)
                .and_then(Option::clone)
                .ok_or(BocError::RefIndexOutOfRange {
                    cell,
                    index: reference,
                    count,
                })?;
            depth = depth.max(depths[reference] + 1);
            refs.push(child);
        }
        if depth > MAX_DEPTH {
            return Err(BocError::DepthLimitExceeded {
                cell,
                max: MAX_DEPTH,
            });
        }
        depths[cell] = depth;
        built[cell] = Some(Arc::new(Cell::from_parts(
            raw_cell.bits,
            refs,
            raw_cell.exotic,
        )));
    }

    let roots = header
        .root_indices
        .iter()
        .filter_map(|&index| built.get(index).and_then(Option::clone))
        .collect::<Vec<_>>();

    debug!(
        cells = count,
        roots = roots.len(),
        size_bytes = header.size_bytes,
        offset_bytes = header.offset_bytes,
        bytes = data.len(),
        "deserialized bag of cells"
    );
    Ok((header, roots))
}
