//! Upstream telemetry interface
//!
//! The replay parser that produces these rows lives outside this crate. The
//! encoder only needs the row shapes below, exposed through
//! [`TelemetrySource`].

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::DocumentError;
use crate::types::{ExternalId, Side};

/// One player as reported by the replay parser
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRow {
    pub external_id: ExternalId,
    pub name: String,
}

/// One row of the round table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundRow {
    pub round_number: u32,
    #[serde(default)]
    pub winner: Side,
    pub start_tick: u64,
    #[serde(default)]
    pub freeze_end_tick: Option<u64>,
    #[serde(default)]
    pub end_tick: Option<u64>,
}

/// Raw per-tick player position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionRow {
    pub tick: u64,
    pub round_number: u32,
    pub external_id: ExternalId,
    #[serde(default)]
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeathRow {
    pub tick: u64,
    /// `None` for world damage, falls, suicides
    #[serde(default)]
    pub attacker: Option<ExternalId>,
    pub victim: ExternalId,
    #[serde(default)]
    pub weapon: String,
    #[serde(default)]
    pub headshot: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantRow {
    pub tick: u64,
    pub planter: ExternalId,
    /// Engine bombsite id, mapped to a letter by the site table
    pub site: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefuseRow {
    pub tick: u64,
    pub defuser: ExternalId,
}

/// Bombsite centre, written to the `# SITES:` line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BombsiteRow {
    pub letter: char,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Read access to one match worth of telemetry
pub trait TelemetrySource {
    fn map_name(&self) -> &str;

    /// Server tick rate, if the source knows it
    fn tick_rate(&self) -> Option<u32>;

    fn bombsites(&self) -> &[BombsiteRow];
    fn players(&self) -> &[PlayerRow];
    fn rounds(&self) -> &[RoundRow];
    fn positions(&self) -> &[PositionRow];
    fn deaths(&self) -> &[DeathRow];
    fn plants(&self) -> &[PlantRow];
    fn defuses(&self) -> &[DefuseRow];
}

/// In-memory telemetry, deserializable from JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchTelemetry {
    #[serde(default = "default_map_name")]
    pub map_name: String,
    #[serde(default)]
    pub tick_rate: Option<u32>,
    #[serde(default)]
    pub bombsites: Vec<BombsiteRow>,
    #[serde(default)]
    pub players: Vec<PlayerRow>,
    #[serde(default)]
    pub rounds: Vec<RoundRow>,
    #[serde(default)]
    pub positions: Vec<PositionRow>,
    #[serde(default)]
    pub deaths: Vec<DeathRow>,
    #[serde(default)]
    pub plants: Vec<PlantRow>,
    #[serde(default)]
    pub defuses: Vec<DefuseRow>,
}

fn default_map_name() -> String {
    "unknown".to_string()
}

impl Default for MatchTelemetry {
    fn default() -> Self {
        Self {
            map_name: default_map_name(),
            tick_rate: None,
            bombsites: Vec::new(),
            players: Vec::new(),
            rounds: Vec::new(),
            positions: Vec::new(),
            deaths: Vec::new(),
            plants: Vec::new(),
            defuses: Vec::new(),
        }
    }
}

impl MatchTelemetry {
    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, DocumentError> {
        let content = std::fs::read_to_string(path).map_err(|source| DocumentError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }
}

impl TelemetrySource for MatchTelemetry {
    fn map_name(&self) -> &str {
        &self.map_name
    }

    fn tick_rate(&self) -> Option<u32> {
        self.tick_rate
    }

    fn bombsites(&self) -> &[BombsiteRow] {
        &self.bombsites
    }

    fn players(&self) -> &[PlayerRow] {
        &self.players
    }

    fn rounds(&self) -> &[RoundRow] {
        &self.rounds
    }

    fn positions(&self) -> &[PositionRow] {
        &self.positions
    }

    fn deaths(&self) -> &[DeathRow] {
        &self.deaths
    }

    fn plants(&self) -> &[PlantRow] {
        &self.plants
    }

    fn defuses(&self) -> &[DefuseRow] {
        &self.defuses
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_json() {
        let telemetry = MatchTelemetry::from_json(
            r#"{
                "rounds": [{ "round_number": 1, "winner": "ct", "start_tick": 0 }],
                "deaths": [{ "tick": 10, "victim": 7 }]
            }"#,
        )
        .unwrap();

        assert_eq!(telemetry.map_name(), "unknown");
        assert_eq!(telemetry.tick_rate(), None);
        assert_eq!(telemetry.rounds()[0].winner, Side::Ct);
        assert_eq!(telemetry.rounds()[0].end_tick, None);
        assert_eq!(telemetry.deaths()[0].attacker, None);
        assert_eq!(telemetry.deaths()[0].victim, ExternalId(7));
        assert!(!telemetry.deaths()[0].headshot);
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            MatchTelemetry::from_json("{ \"rounds\": 3 }"),
            Err(DocumentError::Telemetry(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("match.json");
        std::fs::write(&path, r#"{ "map_name": "de_ancient", "tick_rate": 64 }"#).unwrap();

        let telemetry = MatchTelemetry::from_file(&path).unwrap();
        assert_eq!(telemetry.map_name(), "de_ancient");
        assert_eq!(telemetry.tick_rate(), Some(64));

        assert!(matches!(
            MatchTelemetry::from_file(&dir.path().join("nope.json")),
            Err(DocumentError::Read { .. })
        ));
    }
}
