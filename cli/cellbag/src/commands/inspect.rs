//! `cellbag inspect`: header fields and per-root summaries.

use anyhow::Result;
use cellbag_boc::{BagOfCells, BocHeader};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct Report {
    magic: String,
    has_index: bool,
    has_crc32c: bool,
    has_cache_bits: bool,
    size_bytes: u8,
    offset_bytes: u8,
    cell_count: usize,
    root_count: usize,
    absent_count: usize,
    total_cells_size: usize,
    roots: Vec<RootReport>,
}

#[derive(Debug, Serialize)]
struct RootReport {
    index: usize,
    bits: usize,
    refs: usize,
    depth: u16,
    hash: String,
}

fn report(header: &BocHeader, bag: &BagOfCells) -> Report {
    Report {
        magic: header.magic.to_string(),
        has_index: header.has_index,
        has_crc32c: header.has_crc32c,
        has_cache_bits: header.has_cache_bits,
        size_bytes: header.size_bytes,
        offset_bytes: header.offset_bytes,
        cell_count: header.cell_count,
        root_count: header.root_count,
        absent_count: header.absent_count,
        total_cells_size: header.total_cells_size,
        roots: header
            .root_indices
            .iter()
            .zip(&bag.roots)
            .map(|(&index, root)| RootReport {
                index,
                bits: root.bits.used_bits(),
                refs: root.refs.len(),
                depth: root.max_depth(),
                hash: root.hash_hex(),
            })
            .collect(),
    }
}

pub fn run(input: &str, json: bool) -> Result<()> {
    let (header, bag) = super::load(input)?;
    let report = report(&header, &bag);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("--- Bag of Cells ({input}) ---");
    println!("  Magic:         {}", report.magic);
    println!("  Index:         {}", report.has_index);
    println!("  CRC32-C:       {}", report.has_crc32c);
    println!("  Cache bits:    {}", report.has_cache_bits);
    println!("  Size bytes:    {}", report.size_bytes);
    println!("  Offset bytes:  {}", report.offset_bytes);
    println!("  Cells:         {}", report.cell_count);
    println!("  Roots:         {}", report.root_count);
    println!("  Absent:        {}", report.absent_count);
    println!("  Data size:     {}", report.total_cells_size);
    for root in &report.roots {
        println!();
        println!("  Root #{}", root.index);
        println!("    Bits:  {}", root.bits);
        println!("    Refs:  {}", root.refs);
        println!("    Depth: {}", root.depth);
        println!("    Hash:  {}", root.hash);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use cellbag_boc::{BocOptions, CellBoc};
    use cellbag_core::Cell;

    use super::*;

    #[test]
    fn report_fields() {
        let mut leaf = Cell::new();
        leaf.bits.write_uint8(3).unwrap();
        let mut root = Cell::new();
        root.bits.write_uint(0x0102u16, 16).unwrap();
        root.push_ref(leaf).unwrap();

        let bytes = root.to_boc(&BocOptions::COMPACT).unwrap();
        let (header, bag) = BagOfCells::from_bytes_with_header(&bytes).unwrap();
        let report = report(&header, &bag);

        assert_eq!(report.magic, "reach");
        assert!(!report.has_index);
        assert_eq!(report.cell_count, 2);
        assert_eq!(report.roots.len(), 1);
        assert_eq!(report.roots[0].bits, 16);
        assert_eq!(report.roots[0].depth, 1);
        assert_eq!(report.roots[0].hash, root.hash_hex());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["roots"][0]["refs"], 1);
    }
}
