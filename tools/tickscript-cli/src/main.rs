//! Tickscript CLI - compact match telemetry documents
//!
//! # Commands
//!
//! - `tickscript encode` - Encode a telemetry JSON file into a compact document
//! - `tickscript decode` - Decode a document and print its rounds (or JSON)
//! - `tickscript validate` - Check a document and fail on any defect
//! - `tickscript stats` - Print match statistics for a document
//!
//! # Usage
//!
//! ```bash
//! # Encode with the default 32 tick sample interval
//! tickscript encode match.json -o match.txt
//!
//! # Sample every 64 ticks, codec settings from a file
//! tickscript encode match.json -o match.txt --interval 64 --config codec.toml
//!
//! # Inspect
//! tickscript decode match.txt --json
//! tickscript validate match.txt
//! tickscript stats match.txt
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

mod decode;
mod encode;
mod stats;
mod validate;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::Path;

use tickscript_core::CodecConfig;

/// Tickscript CLI - compact match telemetry documents
#[derive(Parser)]
#[command(name = "tickscript")]
#[command(about = "Encode and inspect compact match telemetry documents")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a telemetry JSON file into a compact document
    Encode(encode::EncodeArgs),

    /// Decode a document and print its contents
    Decode(decode::DecodeArgs),

    /// Check a document for defects
    Validate(validate::ValidateArgs),

    /// Print match statistics for a document
    Stats(stats::StatsArgs),
}

/// Load a codec config file, or the defaults when none is given
pub(crate) fn load_config(path: Option<&Path>) -> Result<CodecConfig> {
    match path {
        Some(path) => CodecConfig::from_file(path)
            .with_context(|| format!("Failed to load config: {}", path.display())),
        None => Ok(CodecConfig::default()),
    }
}

fn main() -> Result<()> {
    // Logs go to stderr so `decode --json` output stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Encode(args) => encode::execute(args),
        Commands::Decode(args) => decode::execute(args),
        Commands::Validate(args) => validate::execute(args),
        Commands::Stats(args) => stats::execute(args),
    }
}
