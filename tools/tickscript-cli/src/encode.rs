//! Encode command - telemetry JSON to compact document

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use tickscript_core::{Encoder, MatchTelemetry};

/// Arguments for the encode command
#[derive(Args)]
pub struct EncodeArgs {
    /// Telemetry JSON file
    pub input: PathBuf,

    /// Output document path
    #[arg(short, long)]
    pub output: PathBuf,

    /// Keep one position sample every N ticks (overrides config)
    #[arg(long)]
    pub interval: Option<u64>,

    /// Codec config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Source label for the metadata preamble (enables the preamble)
    #[arg(long)]
    pub source: Option<String>,
}

/// Execute the encode command
pub fn execute(args: EncodeArgs) -> Result<()> {
    println!(
        "Encoding: {} -> {}",
        args.input.display(),
        args.output.display()
    );

    let mut config = crate::load_config(args.config.as_deref())?;
    if let Some(interval) = args.interval {
        config.sample_interval = interval;
    }
    if args.source.is_some() {
        config.sections.preamble = true;
    }
    config.validate().context("Invalid codec settings")?;

    let telemetry = MatchTelemetry::from_file(&args.input)
        .with_context(|| format!("Failed to read telemetry: {}", args.input.display()))?;

    let mut encoder = Encoder::new(config);
    if let Some(source) = args.source {
        encoder = encoder.with_source(source);
    }

    let encoded = encoder
        .encode(&telemetry)
        .with_context(|| format!("Failed to encode: {}", args.input.display()))?;

    encoded
        .document
        .write_to(&args.output)
        .with_context(|| format!("Failed to write document: {}", args.output.display()))?;

    let text = encoded.document.to_text();
    println!();
    println!("=== Encoding Complete ===");
    println!("Map: {}", encoded.metadata.map_name);
    println!("Rounds: {}", encoded.metadata.round_count);
    println!("Players: {}", encoded.metadata.roster.len());
    println!("Size: {} bytes", text.len());
    println!("Estimated tokens: {}", encoded.document.token_estimate());
    if !encoded.boundary_conflicts.is_empty() {
        println!(
            "Overlapping round windows: {}",
            encoded.boundary_conflicts.len()
        );
    }
    println!("Output: {}", args.output.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tickscript_core::DecodedMatch;

    const TELEMETRY: &str = r#"{
        "map_name": "de_nuke",
        "tick_rate": 64,
        "players": [
            { "external_id": 76561198000000002, "name": "bravo" },
            { "external_id": 76561198000000001, "name": "alpha" }
        ],
        "rounds": [
            { "round_number": 1, "winner": "CT", "start_tick": 0, "freeze_end_tick": 640, "end_tick": 3000 }
        ],
        "positions": [
            { "tick": 640, "round_number": 1, "external_id": 76561198000000001, "x": 1.5, "y": 2.5, "z": 0.0 },
            { "tick": 672, "round_number": 1, "external_id": 76561198000000001, "x": 9.9, "y": 2.5, "z": 0.0 }
        ],
        "deaths": [
            { "tick": 1200, "attacker": 76561198000000002, "victim": 76561198000000001, "weapon": "awp" }
        ]
    }"#;

    #[test]
    fn test_encode_command_writes_document() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("match.json");
        let output = dir.path().join("match.txt");
        std::fs::write(&input, TELEMETRY).unwrap();

        execute(EncodeArgs {
            input,
            output: output.clone(),
            interval: Some(32),
            config: None,
            source: Some("match.dem".to_string()),
        })
        .unwrap();

        let decoded = DecodedMatch::from_file(&output).unwrap();
        assert!(decoded.is_clean(), "{:?}", decoded.defects);
        assert_eq!(decoded.metadata.map_name, "de_nuke");
        assert_eq!(decoded.metadata.roster.name_of(0), Some("alpha"));
        assert_eq!(decoded.provenance.source.as_deref(), Some("match.dem"));
        assert_eq!(decoded.rounds[0].events[0].to_string(), "1200:D,P1>P0,AWP");

        crate::validate::execute(crate::validate::ValidateArgs {
            input: output,
            config: None,
        })
        .unwrap();
    }

    #[test]
    fn test_encode_command_rejects_zero_interval() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("match.json");
        std::fs::write(&input, TELEMETRY).unwrap();

        let result = execute(EncodeArgs {
            input,
            output: dir.path().join("out.txt"),
            interval: Some(0),
            config: None,
            source: None,
        });
        assert!(result.is_err());
    }
}
