//! CLI command implementations.

pub mod address;
pub mod convert;
pub mod hash;
pub mod inspect;
pub mod print;

use std::fs;
use std::io::{self, Read};

use anyhow::{Context, Result};
use cellbag_boc::{BagOfCells, BocHeader, BocSource};

/// Read `input` (a path, or `-` for stdin) and decode the bag it holds.
pub fn load(input: &str) -> Result<(BocHeader, BagOfCells)> {
    let data = if input == "-" {
        let mut data = Vec::new();
        io::stdin()
            .read_to_end(&mut data)
            .context("reading stdin")?;
        data
    } else {
        fs::read(input).with_context(|| format!("reading {input}"))?
    };

    let bytes = BocSource::sniff(&data)
        .decode()
        .with_context(|| format!("decoding {input}"))?;
    BagOfCells::from_bytes_with_header(&bytes).with_context(|| format!("parsing {input}"))
}
