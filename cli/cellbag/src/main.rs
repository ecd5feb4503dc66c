//! cellbag CLI: inspect, dump, hash and convert Bag of Cells files.

mod commands;
mod config;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use config::{CellbagConfig, OutputFormat};

#[derive(Parser)]
#[command(name = "cellbag", version, about = "Bag of Cells inspection and conversion")]
struct Cli {
    /// Enable debug logging for the cellbag crates
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show header fields and per-root summaries
    Inspect {
        /// Input file (binary, hex or base64), or `-` for stdin
        input: String,
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Dump every root as nested x{HEX} lines
    Print {
        /// Input file (binary, hex or base64), or `-` for stdin
        input: String,
    },
    /// Print the hash of every root
    Hash {
        /// Input file (binary, hex or base64), or `-` for stdin
        input: String,
    },
    /// Re-serialize a bag with different options or encoding
    Convert {
        /// Input file (binary, hex or base64), or `-` for stdin
        input: String,
        /// Output encoding (default from cellbag.toml, else hex)
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
        /// Write to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
        /// Omit the offset index table
        #[arg(long)]
        no_index: bool,
        /// Omit the CRC32-C trailer
        #[arg(long)]
        no_crc: bool,
    },
    /// Show the raw and user-friendly forms of an address
    ParseAddress {
        /// Raw (`0:<hex>`) or user-friendly address
        address: String,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = run(cli);
    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "warn,cellbag=debug,cellbag_boc=debug,cellbag_core=debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Inspect { input, json } => commands::inspect::run(&input, json),

        Commands::Print { input } => commands::print::run(&input),

        Commands::Hash { input } => commands::hash::run(&input),

        Commands::Convert {
            input,
            format,
            output,
            no_index,
            no_crc,
        } => {
            let cwd = std::env::current_dir()?;
            let config = match CellbagConfig::find_and_load(&cwd)? {
                Some((config, path)) => {
                    tracing::debug!(path = %path.display(), "loaded config");
                    config
                }
                None => CellbagConfig::default(),
            };
            let mut options = config.boc.options();
            if no_index {
                options.index = false;
            }
            if no_crc {
                options.crc32c = false;
            }
            let format = format.unwrap_or(config.output.format);
            commands::convert::run(&input, format, output.as_deref(), &options)
        }

        Commands::ParseAddress { address } => commands::address::run(&address),
    }
}
