//! `cellbag convert`: re-serialize with new options or a new encoding.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use cellbag_boc::{BagOfCells, BocOptions};

use crate::config::OutputFormat;

/// Serialize `bag` in the requested encoding. Text formats end with a newline.
pub fn encode(bag: &BagOfCells, format: OutputFormat, options: &BocOptions) -> Result<Vec<u8>> {
    let bytes = bag.to_bytes(options).context("serializing bag of cells")?;
    Ok(match format {
        OutputFormat::Binary => bytes,
        OutputFormat::Hex => format!("{}\n", hex::encode_upper(bytes)).into_bytes(),
        OutputFormat::Base64 => format!("{}\n", STANDARD.encode(bytes)).into_bytes(),
    })
}

pub fn run(
    input: &str,
    format: OutputFormat,
    output: Option<&Path>,
    options: &BocOptions,
) -> Result<()> {
    let (_, bag) = super::load(input)?;
    let encoded = encode(&bag, format, options)?;

    match output {
        Some(path) => {
            fs::write(path, &encoded).with_context(|| format!("writing {}", path.display()))?;
            tracing::debug!(path = %path.display(), bytes = encoded.len(), "wrote output");
        }
        None => io::stdout()
            .write_all(&encoded)
            .context("writing to stdout")?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use cellbag_core::Cell;

    use super::*;

    fn sample() -> BagOfCells {
        let mut cell = Cell::new();
        cell.bits.write_uint8(1).unwrap();
        cell.bits.write_uint8(2).unwrap();
        BagOfCells::single(cell)
    }

    #[test]
    fn hex_output() {
        let out = encode(&sample(), OutputFormat::Hex, &BocOptions::default()).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "B5EE9C72C1010101000400000004010268BB104C\n"
        );
    }

    #[test]
    fn every_format_reads_back() {
        for format in [OutputFormat::Hex, OutputFormat::Base64, OutputFormat::Binary] {
            let out = encode(&sample(), format, &BocOptions::COMPACT).unwrap();
            let bag = BagOfCells::read_from(&mut out.as_slice()).unwrap();
            assert_eq!(bag.roots[0].hash(), sample().roots[0].hash());
        }
    }

    #[test]
    fn run_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.boc");
        let output = dir.path().join("out.boc");
        fs::write(&input, "b5ee9c72c1010101000400000004010268bb104c").unwrap();

        run(
            input.to_str().unwrap(),
            OutputFormat::Binary,
            Some(&output),
            &BocOptions::default().with_crc32c(false),
        )
        .unwrap();

        let written = fs::read(&output).unwrap();
        let (header, _) = BagOfCells::from_bytes_with_header(&written).unwrap();
        assert!(!header.has_crc32c);
        assert!(header.has_index);
    }
}
