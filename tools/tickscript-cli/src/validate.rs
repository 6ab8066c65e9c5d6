//! Validate a compact document

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use tickscript_core::DocumentParser;

/// Arguments for the validate command
#[derive(Args)]
pub struct ValidateArgs {
    /// Compact document
    pub input: PathBuf,

    /// Codec config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Validate a document, failing if any defect was found
pub fn execute(args: ValidateArgs) -> Result<()> {
    println!("Validating document: {}", args.input.display());

    let config = crate::load_config(args.config.as_deref())?;
    let decoded = DocumentParser::new(&config)
        .parse_file(&args.input)
        .with_context(|| format!("Failed to read document: {}", args.input.display()))?;

    let tracks: usize = decoded.rounds.iter().map(|r| r.tracks.len()).sum();
    let events: usize = decoded.rounds.iter().map(|r| r.events.len()).sum();

    println!();
    println!("Map: {}", decoded.metadata.map_name);
    println!("Rounds: {}", decoded.rounds.len());
    println!("Players: {}", decoded.metadata.roster.len());
    println!("Tracks: {}", tracks);
    println!("Events: {}", events);

    if decoded.metadata.round_count as usize != decoded.rounds.len() {
        println!(
            "Note: header declares {} round(s)",
            decoded.metadata.round_count
        );
    }

    if decoded.is_clean() {
        println!();
        println!("=== Document Valid ===");
        return Ok(());
    }

    println!();
    println!("=== Defects ===");
    for defect in &decoded.defects {
        println!("  {}", defect);
    }
    anyhow::bail!("{} defect(s) found", decoded.defects.len());
}
