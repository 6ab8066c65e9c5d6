//! Decode command - print a document's rounds and events

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use tickscript_core::DocumentParser;

/// Arguments for the decode command
#[derive(Args)]
pub struct DecodeArgs {
    /// Compact document
    pub input: PathBuf,

    /// Print the decoded match as JSON
    #[arg(long)]
    pub json: bool,

    /// Codec config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Execute the decode command
pub fn execute(args: DecodeArgs) -> Result<()> {
    let config = crate::load_config(args.config.as_deref())?;
    let decoded = DocumentParser::new(&config)
        .parse_file(&args.input)
        .with_context(|| format!("Failed to read document: {}", args.input.display()))?;

    if args.json {
        let json = serde_json::to_string_pretty(&decoded)
            .context("Failed to serialize decoded match")?;
        println!("{}", json);
        return Ok(());
    }

    let meta = &decoded.metadata;
    println!("Map: {}", meta.map_name);
    println!("Rounds: {} ({} decoded)", meta.round_count, decoded.rounds.len());
    println!("Tick rate: {}", meta.tick_rate);
    println!("Players:");
    for player in meta.roster.iter() {
        println!("  P{}  {}", player.index, player.display_name);
    }

    for round in &decoded.rounds {
        let window = &round.window;
        println!();
        println!(
            "Round {} ({} win) ticks {}-{}",
            window.round_number, window.winner, window.start_tick, window.end_tick
        );
        for track in &round.tracks {
            println!(
                "  {} {} position(s)",
                meta.roster.label(&track.player),
                track.points.len()
            );
        }
        for event in &round.events {
            println!("  {}", event);
        }
    }

    if !decoded.defects.is_empty() {
        println!();
        println!("=== Defects ===");
        for defect in &decoded.defects {
            println!("  {}", defect);
        }
    }

    Ok(())
}
