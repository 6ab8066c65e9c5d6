//! Document assembler
//!
//! Turns encoded rounds into the compact text form.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use super::DocumentSections;
use crate::error::DocumentError;
use crate::event::format_events;
use crate::position::{PositionToken, format_track};
use crate::types::{Event, MatchMetadata, Provenance, RoundWindow, SiteMarker};

/// One round ready for assembly
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedRound {
    pub window: RoundWindow,
    /// Token streams keyed by player index
    pub tracks: BTreeMap<u32, Vec<PositionToken>>,
    /// Ascending tick order
    pub events: Vec<Event>,
}

/// Assembled document: header text plus one text block per round
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompactDocument {
    pub header: String,
    pub rounds: Vec<String>,
}

impl CompactDocument {
    /// Full document text; blocks are separated by one blank line
    pub fn to_text(&self) -> String {
        let mut text = self.header.clone();
        for round in &self.rounds {
            text.push_str("\n\n");
            text.push_str(round);
        }
        text
    }

    /// Rough LLM token count (four characters per token)
    pub fn token_estimate(&self) -> usize {
        self.to_text().chars().count() / 4
    }

    pub fn write_to(&self, path: &Path) -> Result<(), DocumentError> {
        let mut text = self.to_text();
        text.push('\n');
        std::fs::write(path, text).map_err(|source| DocumentError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl fmt::Display for CompactDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

/// Roster names are space-delimited and pragma fields pipe-delimited.
fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_whitespace() || c == '|' { '_' } else { c })
        .collect()
}

/// Free-text pragma values keep inner spaces but never a field or line break.
fn sanitize_pragma(value: &str) -> String {
    value
        .trim()
        .chars()
        .map(|c| if c.is_control() || c == '|' { '_' } else { c })
        .collect()
}

/// Builds the header and round blocks for one match
pub struct DocumentAssembler<'m> {
    metadata: &'m MatchMetadata,
    sections: DocumentSections,
    sites: Vec<SiteMarker>,
    provenance: Provenance,
    weapon_legend: Option<String>,
}

impl<'m> DocumentAssembler<'m> {
    pub fn new(metadata: &'m MatchMetadata) -> Self {
        Self {
            metadata,
            sections: DocumentSections::default(),
            sites: Vec::new(),
            provenance: Provenance::default(),
            weapon_legend: None,
        }
    }

    pub fn sections(mut self, sections: DocumentSections) -> Self {
        self.sections = sections;
        self
    }

    pub fn sites(mut self, sites: Vec<SiteMarker>) -> Self {
        self.sites = sites;
        self
    }

    pub fn provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = provenance;
        self
    }

    /// `CODE=pattern` list appended to the legend
    pub fn weapon_legend(mut self, legend: String) -> Self {
        self.weapon_legend = Some(legend);
        self
    }

    pub fn header(&self) -> String {
        let meta = self.metadata;
        let map_name = sanitize_pragma(&meta.map_name);
        let mut lines: Vec<String> = Vec::new();

        if self.sections.contains(DocumentSections::PREAMBLE) {
            lines.push("# METADATA".to_string());
            if let Some(generated) = self.provenance.generated_at {
                lines.push(format!("# Generated: {}", generated.to_rfc3339()));
            }
            if let Some(source) = &self.provenance.source {
                lines.push(format!("# Source: {}", sanitize_pragma(source)));
            }
            lines.push(format!("# Map: {}", map_name));
            lines.push(format!("# Rounds: {}", meta.round_count));
            lines.push(format!("# Tickrate: {}", meta.tick_rate));
            if let Some(interval) = self.provenance.sample_interval {
                lines.push(format!("# Sample Interval: {} ticks", interval));
            }
            lines.push("#".to_string());
        }

        lines.push(format!(
            "# MAP: {} | ROUNDS: {} | TICK: {}",
            map_name, meta.round_count, meta.tick_rate
        ));

        let players: Vec<String> = meta
            .roster
            .iter()
            .map(|p| format!("P{}:{}", p.index, sanitize_name(&p.display_name)))
            .collect();
        lines.push(format!("# PLAYERS: {}", players.join(" ")).trim_end().to_string());

        if self.sections.contains(DocumentSections::SITES) && !self.sites.is_empty() {
            let sites: Vec<String> = self.sites.iter().map(ToString::to_string).collect();
            lines.push(format!("# SITES: {}", sites.join(" ")));
        }

        if self.sections.contains(DocumentSections::LEGEND) {
            lines.push("#".to_string());
            lines.push("# FORMAT LEGEND:".to_string());
            lines.push(
                "#   Positions: tick:X,Y,Z (initial) then tick:+dX,+dY,+dZ (deltas)".to_string(),
            );
            lines.push("#   Events: tick:CODE,params | D=death BP=plant BD=defuse".to_string());
            match &self.weapon_legend {
                Some(weapons) if !weapons.is_empty() => lines.push(format!(
                    "#   Players: P<n> indexed above | Weapons: {}",
                    sanitize_pragma(weapons)
                )),
                _ => lines.push("#   Players: P<n> indexed above".to_string()),
            }
        }

        lines.join("\n")
    }

    pub fn round_block(&self, round: &EncodedRound) -> String {
        let window = &round.window;
        let mut lines = vec![format!(
            "## ROUND {} ({} win) | t{}-t{}",
            window.round_number, window.winner, window.start_tick, window.end_tick
        )];

        if !round.tracks.is_empty() {
            lines.push("### Positions".to_string());
            for (player, tokens) in &round.tracks {
                lines.push(format!("P{} {}", player, format_track(tokens)));
            }
        }

        if !round.events.is_empty() {
            lines.push("### Events".to_string());
            lines.push(format_events(&round.events));
        }

        lines.join("\n")
    }

    pub fn assemble(&self, rounds: &[EncodedRound]) -> CompactDocument {
        CompactDocument {
            header: self.header(),
            rounds: rounds.iter().map(|r| self.round_block(r)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::Roster;
    use crate::types::{ExternalId, PlayerRef, Side};
    use chrono::{TimeZone, Utc};

    fn metadata() -> MatchMetadata {
        MatchMetadata {
            map_name: "de_ancient".to_string(),
            round_count: 1,
            tick_rate: 64,
            roster: Roster::build(vec![
                (ExternalId(200), "bravo two"),
                (ExternalId(100), "alpha"),
            ]),
        }
    }

    fn round() -> EncodedRound {
        let mut tracks = BTreeMap::new();
        tracks.insert(
            1,
            vec![
                PositionToken::Absolute {
                    tick: 1000,
                    x: -1520,
                    y: 240,
                    z: 32,
                },
                PositionToken::Delta {
                    tick: 1032,
                    dx: 12,
                    dy: -4,
                    dz: 0,
                },
            ],
        );
        tracks.insert(
            0,
            vec![PositionToken::Absolute {
                tick: 1000,
                x: 5,
                y: 6,
                z: 7,
            }],
        );
        EncodedRound {
            window: RoundWindow {
                round_number: 1,
                winner: Side::Ct,
                start_tick: 1000,
                end_tick: 4800,
            },
            tracks,
            events: vec![
                Event::Death {
                    tick: 2100,
                    killer: PlayerRef::Index(0),
                    victim: PlayerRef::Index(1),
                    weapon_code: "AK".to_string(),
                    headshot: true,
                },
                Event::BombDefuse {
                    tick: 4000,
                    defuser: PlayerRef::Index(0),
                },
            ],
        }
    }

    #[test]
    fn test_minimal_header() {
        let meta = metadata();
        let assembler = DocumentAssembler::new(&meta).sections(DocumentSections::empty());
        assert_eq!(
            assembler.header(),
            "# MAP: de_ancient | ROUNDS: 1 | TICK: 64\n# PLAYERS: P0:alpha P1:bravo_two"
        );
    }

    #[test]
    fn test_full_document() {
        let meta = metadata();
        let doc = DocumentAssembler::new(&meta)
            .sections(DocumentSections::SITES)
            .sites(vec![SiteMarker {
                letter: 'A',
                x: 1,
                y: -2,
                z: 3,
            }])
            .assemble(&[round()]);

        let expected = "\
# MAP: de_ancient | ROUNDS: 1 | TICK: 64
# PLAYERS: P0:alpha P1:bravo_two
# SITES: A(1,-2,3)

## ROUND 1 (ct win) | t1000-t4800
### Positions
P0 1000:5,6,7
P1 1000:-1520,240,32 1032:+12,-4,+0
### Events
2100:D,P0>P1,AK,HS | 4000:BD,P0";
        assert_eq!(doc.to_text(), expected);
        assert_eq!(doc.to_string(), expected);
        assert_eq!(doc.token_estimate(), expected.len() / 4);
    }

    #[test]
    fn test_empty_sections_omitted() {
        let meta = metadata();
        let mut empty = round();
        empty.tracks.clear();
        empty.events.clear();

        let block = DocumentAssembler::new(&meta).round_block(&empty);
        assert_eq!(block, "## ROUND 1 (ct win) | t1000-t4800");
    }

    #[test]
    fn test_preamble_and_legend() {
        let meta = metadata();
        let header = DocumentAssembler::new(&meta)
            .sections(DocumentSections::all())
            .provenance(Provenance {
                generated_at: Some(Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()),
                source: Some("match.dem".to_string()),
                sample_interval: Some(32),
            })
            .weapon_legend("AK=ak47".to_string())
            .header();

        let lines: Vec<&str> = header.lines().collect();
        assert_eq!(lines[0], "# METADATA");
        assert_eq!(lines[1], "# Generated: 2025-03-01T12:00:00+00:00");
        assert_eq!(lines[2], "# Source: match.dem");
        assert_eq!(lines[6], "# Sample Interval: 32 ticks");
        assert_eq!(lines[7], "#");
        assert_eq!(lines[8], "# MAP: de_ancient | ROUNDS: 1 | TICK: 64");
        assert!(header.ends_with("Weapons: AK=ak47"));
    }

    #[test]
    fn test_pragma_values_cannot_break_fields() {
        let mut meta = metadata();
        meta.map_name = "de_x | ROUNDS: 99\n# PLAYERS: P7:evil".to_string();
        let doc = DocumentAssembler::new(&meta)
            .sections(DocumentSections::PREAMBLE)
            .provenance(Provenance {
                source: Some("cup|final\r\ngame 2.dem".to_string()),
                ..Provenance::default()
            })
            .assemble(&[]);

        let decoded = crate::document::DocumentParser::default().parse(&doc.to_text());
        assert!(decoded.is_clean(), "{:?}", decoded.defects);
        assert_eq!(decoded.metadata.map_name, "de_x _ ROUNDS: 99_# PLAYERS: P7:evil");
        assert_eq!(decoded.metadata.round_count, 1);
        assert_eq!(decoded.metadata.roster.len(), 2);
        assert_eq!(
            decoded.provenance.source.as_deref(),
            Some("cup_final__game 2.dem")
        );
    }

    #[test]
    fn test_write_to() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("match.txt");
        let meta = metadata();
        let doc = DocumentAssembler::new(&meta).assemble(&[round()]);

        doc.write_to(&path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written.trim_end(), doc.to_text());
    }
}
