//! Core types for the compact codec
//!
//! These structures are shared by the encoder (telemetry → text) and the
//! decoder (text → records). They carry no format knowledge of their own
//! beyond the token spellings in their `Display` impls.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::roster::Roster;

/// Opaque upstream player identifier (e.g. a platform account id)
///
/// Only its ordering matters to the codec: roster indices are assigned in
/// ascending external id order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExternalId(pub u64);

impl fmt::Display for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One roster entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRecord {
    /// Small stable index, rendered as `P<index>`
    pub index: u32,
    /// Display name as first observed
    pub display_name: String,
    /// Upstream id; unknown when the record was recovered from a document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<ExternalId>,
}

/// Which side won a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    T,
    Ct,
    #[default]
    Unknown,
}

impl<'de> Deserialize<'de> for Side {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let label = String::deserialize(deserializer)?;
        Ok(Side::from_label(&label))
    }
}

impl Side {
    /// Interpret a winner label from telemetry or a round header.
    ///
    /// Anything that is not recognisably T or CT maps to `Unknown`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "t" | "terrorist" | "terrorists" => Side::T,
            "ct" | "counterterrorist" | "counter-terrorist" | "counterterrorists" => Side::Ct,
            _ => Side::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::T => "t",
            Side::Ct => "ct",
            Side::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tick range and outcome of one round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundWindow {
    pub round_number: u32,
    pub winner: Side,
    /// First tick of live play (end of freeze time)
    pub start_tick: u64,
    /// Last tick of the round, inclusive
    pub end_tick: u64,
}

impl RoundWindow {
    /// Inclusive on both ends.
    pub fn contains(&self, tick: u64) -> bool {
        tick >= self.start_tick && tick <= self.end_tick
    }

    pub fn duration_ticks(&self) -> u64 {
        self.end_tick.saturating_sub(self.start_tick)
    }
}

/// Sampled position, coordinates truncated toward zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionSample {
    pub tick: u64,
    pub player_index: u32,
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl PositionSample {
    pub fn coords(&self) -> [i64; 3] {
        [self.x, self.y, self.z]
    }
}

/// Player reference inside an event or position line
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerRef {
    /// Index present in the roster
    Index(u32),
    /// Reference that could not be resolved; keeps the raw text (e.g. `P?`)
    Unresolved(String),
}

impl PlayerRef {
    /// Placeholder used when no player is involved (world damage, etc.)
    pub fn nobody() -> Self {
        PlayerRef::Unresolved("P?".to_string())
    }

    pub fn index(&self) -> Option<u32> {
        match self {
            PlayerRef::Index(i) => Some(*i),
            PlayerRef::Unresolved(_) => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, PlayerRef::Index(_))
    }
}

impl fmt::Display for PlayerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerRef::Index(i) => write!(f, "P{}", i),
            PlayerRef::Unresolved(raw) => f.write_str(raw),
        }
    }
}

/// Discrete game event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Event {
    Death {
        tick: u64,
        killer: PlayerRef,
        victim: PlayerRef,
        weapon_code: String,
        headshot: bool,
    },
    BombPlant {
        tick: u64,
        planter: PlayerRef,
        site: char,
    },
    BombDefuse {
        tick: u64,
        defuser: PlayerRef,
    },
}

impl Event {
    pub fn tick(&self) -> u64 {
        match self {
            Event::Death { tick, .. }
            | Event::BombPlant { tick, .. }
            | Event::BombDefuse { tick, .. } => *tick,
        }
    }

    /// Leading code used in the textual token
    pub fn code(&self) -> &'static str {
        match self {
            Event::Death { .. } => "D",
            Event::BombPlant { .. } => "BP",
            Event::BombDefuse { .. } => "BD",
        }
    }

    /// Players referenced by this event, in token order
    pub fn players(&self) -> Vec<&PlayerRef> {
        match self {
            Event::Death { killer, victim, .. } => vec![killer, victim],
            Event::BombPlant { planter, .. } => vec![planter],
            Event::BombDefuse { defuser, .. } => vec![defuser],
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Death {
                tick,
                killer,
                victim,
                weapon_code,
                headshot,
            } => {
                write!(f, "{}:D,{}>{},{}", tick, killer, victim, weapon_code)?;
                if *headshot {
                    f.write_str(",HS")?;
                }
                Ok(())
            }
            Event::BombPlant {
                tick,
                planter,
                site,
            } => write!(f, "{}:BP,{},{}", tick, planter, site),
            Event::BombDefuse { tick, defuser } => write!(f, "{}:BD,{}", tick, defuser),
        }
    }
}

/// Decoded event token: structured when the code is known, raw otherwise
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventToken {
    Event(Event),
    Opaque(String),
}

impl EventToken {
    pub fn event(&self) -> Option<&Event> {
        match self {
            EventToken::Event(e) => Some(e),
            EventToken::Opaque(_) => None,
        }
    }
}

impl fmt::Display for EventToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventToken::Event(e) => write!(f, "{}", e),
            EventToken::Opaque(raw) => f.write_str(raw),
        }
    }
}

/// Bombsite marker from the optional `# SITES:` line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteMarker {
    pub letter: char,
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl fmt::Display for SiteMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({},{},{})", self.letter, self.x, self.y, self.z)
    }
}

/// Match-level metadata, immutable once built
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchMetadata {
    pub map_name: String,
    pub round_count: u32,
    pub tick_rate: u32,
    pub roster: Roster,
}

/// Where a document came from (optional preamble)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_interval: Option<u64>,
}
