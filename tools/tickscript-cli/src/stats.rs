//! Stats command - match statistics from a compact document

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use tickscript_core::{DocumentParser, MatchStats};

/// Arguments for the stats command
#[derive(Args)]
pub struct StatsArgs {
    /// Compact document
    pub input: PathBuf,

    /// Print statistics as JSON
    #[arg(long)]
    pub json: bool,

    /// Codec config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Execute the stats command
pub fn execute(args: StatsArgs) -> Result<()> {
    let config = crate::load_config(args.config.as_deref())?;
    let decoded = DocumentParser::new(&config)
        .parse_file(&args.input)
        .with_context(|| format!("Failed to read document: {}", args.input.display()))?;

    if !decoded.is_clean() {
        tracing::warn!(
            defects = decoded.defects.len(),
            "Document has defects; statistics cover the readable parts only"
        );
    }

    let stats = MatchStats::compute_with(&decoded, &config.stats);
    if args.json {
        let json =
            serde_json::to_string_pretty(&stats).context("Failed to serialize statistics")?;
        println!("{}", json);
    } else {
        print!("{}", stats);
    }

    Ok(())
}
