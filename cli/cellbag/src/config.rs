//! `cellbag.toml` parsing.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use cellbag_boc::BocOptions;
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE: &str = "cellbag.toml";

/// Top-level configuration. Every section is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CellbagConfig {
    #[serde(default)]
    pub boc: BocSection,
    #[serde(default)]
    pub output: OutputSection,
}

/// Serialization defaults for `convert`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BocSection {
    #[serde(default = "enabled")]
    pub index: bool,
    #[serde(default = "enabled")]
    pub crc32c: bool,
    #[serde(default)]
    pub cache_bits: bool,
}

fn enabled() -> bool {
    true
}

impl Default for BocSection {
    fn default() -> Self {
        let options = BocOptions::default();
        Self {
            index: options.index,
            crc32c: options.crc32c,
            cache_bits: options.cache_bits,
        }
    }
}

impl BocSection {
    pub fn options(&self) -> BocOptions {
        BocOptions {
            index: self.index,
            crc32c: self.crc32c,
            cache_bits: self.cache_bits,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSection {
    #[serde(default)]
    pub format: OutputFormat,
}

/// Encoding for serialized output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Hex,
    Base64,
    Binary,
}

impl CellbagConfig {
    /// Search upward from `start_dir` for `cellbag.toml`, returning the parsed
    /// config and the file it came from.
    pub fn find_and_load(start_dir: &Path) -> Result<Option<(Self, PathBuf)>> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join(CONFIG_FILE);
            if candidate.is_file() {
                let content = std::fs::read_to_string(&candidate)
                    .with_context(|| format!("reading {}", candidate.display()))?;
                let config = Self::from_toml(&content)
                    .with_context(|| format!("parsing {}", candidate.display()))?;
                return Ok(Some((config, candidate)));
            }
            if !dir.pop() {
                break;
            }
        }
        Ok(None)
    }

    pub fn from_toml(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }
}
