//! Document parser
//!
//! Parsing never fails as a whole. Every problem becomes a [`Defect`] and the
//! rest of the document still decodes.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info, warn};

use super::line::{Line, Section};
use crate::config::CodecConfig;
use crate::error::{Defect, DefectKind, DocumentError};
use crate::event::parse_event_line;
use crate::position::{TrackPoint, decode_track, parse_track};
use crate::roster::Roster;
use crate::types::{
    EventToken, MatchMetadata, PlayerRecord, PlayerRef, Provenance, RoundWindow, Side, SiteMarker,
};

/// Decoded position track for one player in one round
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerTrack {
    pub player: PlayerRef,
    pub points: Vec<TrackPoint>,
}

/// One decoded round block
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundRecord {
    pub window: RoundWindow,
    /// Document order (ascending player index for encoder output)
    pub tracks: Vec<PlayerTrack>,
    /// Document order (ascending tick for encoder output)
    pub events: Vec<EventToken>,
}

impl RoundRecord {
    pub fn track(&self, player: u32) -> Option<&PlayerTrack> {
        self.tracks.iter().find(|t| t.player.index() == Some(player))
    }
}

/// Everything recovered from a document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedMatch {
    pub metadata: MatchMetadata,
    pub provenance: Provenance,
    pub sites: Vec<SiteMarker>,
    /// Document order
    pub rounds: Vec<RoundRecord>,
    pub defects: Vec<Defect>,
}

impl DecodedMatch {
    /// Parse a document file with the default configuration
    pub fn from_file(path: &Path) -> Result<Self, DocumentError> {
        DocumentParser::default().parse_file(path)
    }

    pub fn round(&self, round_number: u32) -> Option<&RoundRecord> {
        self.rounds
            .iter()
            .find(|r| r.window.round_number == round_number)
    }

    pub fn is_clean(&self) -> bool {
        self.defects.is_empty()
    }
}

/// First occurrence of each header field, with its line number
#[derive(Default)]
struct HeaderFields<'a> {
    map: Option<(usize, &'a str)>,
    rounds: Option<(usize, &'a str)>,
    tick: Option<(usize, &'a str)>,
    players: Option<(usize, &'a str)>,
    sites: Option<(usize, &'a str)>,
    generated: Option<(usize, &'a str)>,
    source: Option<(usize, &'a str)>,
    sample_interval: Option<(usize, &'a str)>,
}

impl<'a> HeaderFields<'a> {
    fn collect(&mut self, line: usize, pragma: &'a str) {
        for field in pragma.split('|') {
            let Some((key, value)) = field.split_once(':') else {
                continue;
            };
            let slot = match key.trim() {
                "MAP" | "Map" => &mut self.map,
                "ROUNDS" | "Rounds" => &mut self.rounds,
                "TICK" | "Tickrate" => &mut self.tick,
                "PLAYERS" => &mut self.players,
                "SITES" => &mut self.sites,
                "Generated" => &mut self.generated,
                "Source" => &mut self.source,
                "Sample Interval" => &mut self.sample_interval,
                _ => continue,
            };
            slot.get_or_insert((line, value.trim()));
        }
    }
}

/// A `##` line and the lines that follow it
struct Block<'a> {
    line: usize,
    header: &'a str,
    body: Vec<(usize, Line<'a>)>,
}

/// Parse a `ROUND <n> (<winner> win) | t<start>-t<end>` header
fn parse_round_header(text: &str) -> Option<RoundWindow> {
    let rest = text.strip_prefix("ROUND")?.trim_start();
    let (number, rest) = rest.split_once(char::is_whitespace)?;
    let round_number = number.parse().ok()?;

    let rest = rest.trim_start().strip_prefix('(')?;
    let (winner, rest) = rest.split_once(')')?;
    let winner = Side::from_label(winner.trim().strip_suffix("win")?);

    let range = rest.trim_start().strip_prefix('|')?.trim();
    let (start, end) = range.split_once('-')?;
    let start_tick: u64 = start.trim().strip_prefix('t')?.parse().ok()?;
    let end_tick: u64 = end.trim().strip_prefix('t')?.parse().ok()?;
    if end_tick < start_tick {
        return None;
    }

    Some(RoundWindow {
        round_number,
        winner,
        start_tick,
        end_tick,
    })
}

/// Parse an `A(x,y,z)` site marker
fn parse_site(token: &str) -> Option<SiteMarker> {
    let (letter, rest) = token.split_once('(')?;
    let mut chars = letter.chars();
    let letter = match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphabetic() => c,
        _ => return None,
    };
    let coords: Vec<i64> = rest
        .strip_suffix(')')?
        .split(',')
        .map(|v| v.trim().parse().ok())
        .collect::<Option<_>>()?;
    let [x, y, z] = coords[..] else {
        return None;
    };
    Some(SiteMarker { letter, x, y, z })
}

/// Parse a `P<idx>:<name>` roster entry
fn parse_roster_entry(token: &str) -> Option<PlayerRecord> {
    let (index, name) = token.strip_prefix('P')?.split_once(':')?;
    Some(PlayerRecord {
        index: index.parse().ok()?,
        display_name: name.to_string(),
        external_id: None,
    })
}

/// Compact document decoder
#[derive(Debug, Clone)]
pub struct DocumentParser {
    default_tick_rate: u32,
}

impl Default for DocumentParser {
    fn default() -> Self {
        Self::new(&CodecConfig::default())
    }
}

impl DocumentParser {
    pub fn new(config: &CodecConfig) -> Self {
        Self {
            default_tick_rate: config.default_tick_rate,
        }
    }

    pub fn parse_file(&self, path: &Path) -> Result<DecodedMatch, DocumentError> {
        let text = std::fs::read_to_string(path).map_err(|source| DocumentError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(self.parse(&text))
    }

    pub fn parse(&self, text: &str) -> DecodedMatch {
        let mut defects = Vec::new();
        let mut fields = HeaderFields::default();
        let mut blocks: Vec<Block> = Vec::new();

        // Pass 1: classify lines, gather pragmas and round blocks
        let mut section: Option<Section> = None;
        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            match Line::classify_in(raw, section) {
                Line::Pragma(pragma) => fields.collect(line_no, pragma),
                Line::RoundHeader(header) => {
                    section = None;
                    blocks.push(Block {
                        line: line_no,
                        header,
                        body: Vec::new(),
                    });
                }
                Line::Section(next) => section = blocks.last().map(|_| next),
                Line::Blank => {}
                Line::UnknownSection(other) => {
                    section = None;
                    defects.push(Defect::at(
                        line_no,
                        DefectKind::UnrecognizedLine(other.to_string()),
                    ));
                }
                Line::Unrecognized(other) => defects.push(Defect::at(
                    line_no,
                    DefectKind::UnrecognizedLine(other.to_string()),
                )),
                line @ (Line::Positions(_) | Line::Events(_)) => match blocks.last_mut() {
                    Some(block) => block.body.push((line_no, line)),
                    None => defects.push(Defect::at(
                        line_no,
                        DefectKind::UnrecognizedLine(raw.trim().to_string()),
                    )),
                },
            }
        }

        // Header fields, roster first since every block depends on it
        let roster = Self::parse_roster(fields.players, &mut defects);
        let metadata = MatchMetadata {
            map_name: Self::parse_map(fields.map, &mut defects),
            round_count: Self::parse_number(fields.rounds, "ROUNDS", 0, &mut defects),
            tick_rate: Self::parse_tick_rate(fields.tick, self.default_tick_rate, &mut defects),
            roster,
        };
        let provenance = Self::parse_provenance(&fields, &mut defects);
        let sites = Self::parse_sites(fields.sites, &mut defects);

        // Pass 2: decode round blocks against the roster
        let mut rounds = Vec::with_capacity(blocks.len());
        for block in &blocks {
            let Some(window) = parse_round_header(block.header) else {
                warn!(
                    line = block.line,
                    header = block.header,
                    "Skipping unreadable round block"
                );
                defects.push(Defect::at(
                    block.line,
                    DefectKind::MalformedRoundHeader(block.header.to_string()),
                ));
                continue;
            };
            let record = Self::decode_block(window, &block.body, &metadata.roster, &mut defects);
            debug!(
                round = window.round_number,
                tracks = record.tracks.len(),
                events = record.events.len(),
                "Decoded round"
            );
            rounds.push(record);
        }

        info!(
            map = %metadata.map_name,
            rounds = rounds.len(),
            players = metadata.roster.len(),
            defects = defects.len(),
            "Decoded compact document"
        );

        DecodedMatch {
            metadata,
            provenance,
            sites,
            rounds,
            defects,
        }
    }

    fn decode_block(
        window: RoundWindow,
        body: &[(usize, Line<'_>)],
        roster: &Roster,
        defects: &mut Vec<Defect>,
    ) -> RoundRecord {
        let mut tracks = Vec::new();
        let mut events = Vec::new();

        for &(line_no, line) in body {
            match line {
                Line::Positions(text) => {
                    if let Some(track) = Self::decode_positions(line_no, text, roster, defects) {
                        tracks.push(track);
                    }
                }
                Line::Events(text) => {
                    for (token, result) in parse_event_line(text, roster) {
                        match result {
                            Ok(event) => {
                                Self::check_players(line_no, &event, defects);
                                events.push(event);
                            }
                            Err(reason) => defects.push(Defect::at(
                                line_no,
                                DefectKind::MalformedEvent {
                                    token: token.to_string(),
                                    reason,
                                },
                            )),
                        }
                    }
                }
                _ => {}
            }
        }

        RoundRecord {
            window,
            tracks,
            events,
        }
    }

    fn decode_positions(
        line_no: usize,
        text: &str,
        roster: &Roster,
        defects: &mut Vec<Defect>,
    ) -> Option<PlayerTrack> {
        let (label, tokens) = text.split_once(char::is_whitespace).unwrap_or((text, ""));
        let player = match label.strip_prefix('P').map(str::parse::<u32>) {
            Some(Ok(index)) => roster.resolve(index),
            _ => PlayerRef::Unresolved(label.to_string()),
        };

        let points = parse_track(tokens).and_then(|tokens| decode_track(&tokens));
        let points = match points {
            Ok(points) => points,
            Err(reason) => {
                defects.push(Defect::at(
                    line_no,
                    DefectKind::MalformedPositions {
                        player: label.to_string(),
                        reason,
                    },
                ));
                return None;
            }
        };

        if !player.is_resolved() {
            defects.push(Defect::at(
                line_no,
                DefectKind::UnresolvedPlayer(label.to_string()),
            ));
        }
        Some(PlayerTrack { player, points })
    }

    /// `P?` marks "no player" and is not a defect.
    fn check_players(line_no: usize, token: &EventToken, defects: &mut Vec<Defect>) {
        let Some(event) = token.event() else {
            return;
        };
        for player in event.players() {
            if let PlayerRef::Unresolved(raw) = player
                && *player != PlayerRef::nobody()
            {
                defects.push(Defect::at(line_no, DefectKind::UnresolvedPlayer(raw.clone())));
            }
        }
    }

    fn parse_roster(field: Option<(usize, &str)>, defects: &mut Vec<Defect>) -> Roster {
        let Some((line_no, value)) = field else {
            defects.push(Defect::document(DefectKind::MissingPragma("PLAYERS")));
            return Roster::default();
        };

        let records = value
            .split_whitespace()
            .filter_map(|token| {
                let record = parse_roster_entry(token);
                if record.is_none() {
                    defects.push(Defect::at(
                        line_no,
                        DefectKind::MalformedRosterEntry(token.to_string()),
                    ));
                }
                record
            })
            .collect();
        Roster::from_records(records)
    }

    fn parse_map(field: Option<(usize, &str)>, defects: &mut Vec<Defect>) -> String {
        match field {
            Some((_, value)) if !value.is_empty() => value.to_string(),
            Some((line_no, value)) => {
                defects.push(Defect::at(
                    line_no,
                    DefectKind::MalformedPragma {
                        key: "MAP",
                        value: value.to_string(),
                    },
                ));
                "unknown".to_string()
            }
            None => {
                defects.push(Defect::document(DefectKind::MissingPragma("MAP")));
                "unknown".to_string()
            }
        }
    }

    fn parse_number(
        field: Option<(usize, &str)>,
        key: &'static str,
        default: u32,
        defects: &mut Vec<Defect>,
    ) -> u32 {
        match field {
            Some((line_no, value)) => value.parse().unwrap_or_else(|_| {
                defects.push(Defect::at(
                    line_no,
                    DefectKind::MalformedPragma {
                        key,
                        value: value.to_string(),
                    },
                ));
                default
            }),
            None => {
                defects.push(Defect::document(DefectKind::MissingPragma(key)));
                default
            }
        }
    }

    fn parse_tick_rate(
        field: Option<(usize, &str)>,
        default: u32,
        defects: &mut Vec<Defect>,
    ) -> u32 {
        match Self::parse_number(field, "TICK", default, defects) {
            0 => {
                if let Some((line_no, value)) = field {
                    defects.push(Defect::at(
                        line_no,
                        DefectKind::MalformedPragma {
                            key: "TICK",
                            value: value.to_string(),
                        },
                    ));
                }
                default
            }
            rate => rate,
        }
    }

    fn parse_sites(field: Option<(usize, &str)>, defects: &mut Vec<Defect>) -> Vec<SiteMarker> {
        let Some((line_no, value)) = field else {
            return Vec::new();
        };
        value
            .split_whitespace()
            .filter_map(|token| {
                let site = parse_site(token);
                if site.is_none() {
                    defects.push(Defect::at(line_no, DefectKind::MalformedSite(token.to_string())));
                }
                site
            })
            .collect()
    }

    /// Preamble fields are optional; only malformed values are defects.
    fn parse_provenance(fields: &HeaderFields<'_>, defects: &mut Vec<Defect>) -> Provenance {
        let mut malformed = |line_no: usize, key: &'static str, value: &str| {
            defects.push(Defect::at(
                line_no,
                DefectKind::MalformedPragma {
                    key,
                    value: value.to_string(),
                },
            ));
        };

        let generated_at = fields.generated.and_then(|(line_no, value)| {
            match DateTime::parse_from_rfc3339(value) {
                Ok(at) => Some(at.with_timezone(&Utc)),
                Err(_) => {
                    malformed(line_no, "Generated", value);
                    None
                }
            }
        });

        let sample_interval = fields.sample_interval.and_then(|(line_no, value)| {
            match value.split_whitespace().next().map(str::parse::<u64>) {
                Some(Ok(interval)) if interval > 0 => Some(interval),
                _ => {
                    malformed(line_no, "Sample Interval", value);
                    None
                }
            }
        });

        Provenance {
            generated_at,
            source: fields
                .source
                .map(|(_, value)| value.to_string())
                .filter(|s| !s.is_empty()),
            sample_interval,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventParseError;
    use crate::position::TokenError;
    use crate::types::Event;

    const DOC: &str = "\
# MAP: de_ancient | ROUNDS: 2 | TICK: 64
# PLAYERS: P0:alpha P1:bravo
# SITES: A(-1,2,3) B(10,20,30)

## ROUND 1 (t win) | t1000-t4800
### Positions
P0 1000:1,2,3 1032:+1,+0,-1
P1 1000:0,0,0
### Events
2100:D,P0>P1,AK,HS | 2400:BP,P0,A

## ROUND 2 (ct win) | t5000-t9000
### Events
6000:D,P1>P0,AWP";

    fn parse(text: &str) -> DecodedMatch {
        DocumentParser::default().parse(text)
    }

    #[test]
    fn test_parse_clean_document() {
        let decoded = parse(DOC);
        assert!(decoded.is_clean(), "{:?}", decoded.defects);

        assert_eq!(decoded.metadata.map_name, "de_ancient");
        assert_eq!(decoded.metadata.round_count, 2);
        assert_eq!(decoded.metadata.tick_rate, 64);
        assert_eq!(decoded.metadata.roster.name_of(1), Some("bravo"));
        assert_eq!(decoded.sites.len(), 2);
        assert_eq!(decoded.sites[0].to_string(), "A(-1,2,3)");

        assert_eq!(decoded.rounds.len(), 2);
        let first = &decoded.rounds[0];
        assert_eq!(first.window.winner, Side::T);
        assert_eq!(first.window.start_tick, 1000);
        assert_eq!(first.window.end_tick, 4800);
        assert_eq!(
            first.track(0).unwrap().points[1],
            TrackPoint {
                tick: 1032,
                x: 2,
                y: 2,
                z: 2
            }
        );
        assert_eq!(first.events.len(), 2);

        let second = decoded.round(2).unwrap();
        assert_eq!(second.window.winner, Side::Ct);
        assert!(second.tracks.is_empty());
        assert_eq!(second.events[0].to_string(), "6000:D,P1>P0,AWP");
    }

    #[test]
    fn test_missing_pragmas_use_defaults() {
        let decoded = parse("# MAP: de_nuke | TICK: 64\n# PLAYERS: P0:a");
        assert_eq!(decoded.metadata.round_count, 0);
        assert_eq!(
            decoded.defects,
            vec![Defect::document(DefectKind::MissingPragma("ROUNDS"))]
        );

        let decoded = parse("");
        assert_eq!(decoded.metadata.map_name, "unknown");
        assert_eq!(decoded.metadata.tick_rate, 128);
        assert!(decoded.metadata.roster.is_empty());
        assert_eq!(decoded.defects.len(), 4);
    }

    #[test]
    fn test_configured_tick_rate_default() {
        let config = CodecConfig {
            default_tick_rate: 64,
            ..CodecConfig::default()
        };
        let decoded = DocumentParser::new(&config).parse("# TICK: fast");
        assert_eq!(decoded.metadata.tick_rate, 64);
        assert!(decoded.defects.contains(&Defect::at(
            1,
            DefectKind::MalformedPragma {
                key: "TICK",
                value: "fast".to_string()
            }
        )));

        let decoded = DocumentParser::new(&config).parse("# TICK: 0");
        assert_eq!(decoded.metadata.tick_rate, 64);
    }

    #[test]
    fn test_first_pragma_wins_in_any_order() {
        let decoded = parse(
            "# PLAYERS: P0:a\n# TICK: 64 | ROUNDS: 3 | MAP: de_inferno\n# MAP: de_mirage | ROUNDS: 9",
        );
        assert!(decoded.is_clean(), "{:?}", decoded.defects);
        assert_eq!(decoded.metadata.map_name, "de_inferno");
        assert_eq!(decoded.metadata.round_count, 3);
    }

    #[test]
    fn test_legend_lines_are_ignored() {
        let decoded = parse(
            "# MAP: m | ROUNDS: 0 | TICK: 64\n# PLAYERS:\n#\n# FORMAT LEGEND:\n\
             #   Events: tick:CODE,params | D=death BP=plant BD=defuse\n\
             #   Players: P<n> indexed above | Weapons: AK=ak47",
        );
        assert!(decoded.is_clean(), "{:?}", decoded.defects);
        assert!(decoded.metadata.roster.is_empty());
    }

    #[test]
    fn test_preamble_provenance() {
        let decoded = parse(
            "# METADATA\n# Generated: 2025-03-01T12:00:00+00:00\n# Source: final.dem\n\
             # Map: de_dust2\n# Rounds: 24\n# Tickrate: 64\n# Sample Interval: 32 ticks\n#\n\
             # MAP: de_dust2 | ROUNDS: 24 | TICK: 64\n# PLAYERS: P0:a",
        );
        assert!(decoded.is_clean(), "{:?}", decoded.defects);
        assert_eq!(decoded.provenance.source.as_deref(), Some("final.dem"));
        assert_eq!(decoded.provenance.sample_interval, Some(32));
        assert_eq!(
            decoded.provenance.generated_at.map(|t| t.to_rfc3339()),
            Some("2025-03-01T12:00:00+00:00".to_string())
        );
        assert_eq!(decoded.metadata.round_count, 24);
    }

    #[test]
    fn test_bad_round_header_skips_block() {
        let decoded = parse(
            "# MAP: m | ROUNDS: 2 | TICK: 64\n# PLAYERS: P0:a P1:b\n\n\
             ## ROUND 1 (t win) | t0-t100\n### Events\n50:D,P0>P1,AK\n\n\
             ## ROUND two (ct win) | t200-t100\n### Events\n250:D,P1>P0,AK",
        );
        assert_eq!(decoded.rounds.len(), 1);
        assert_eq!(decoded.rounds[0].events.len(), 1);
        assert_eq!(
            decoded.defects,
            vec![Defect::at(
                8,
                DefectKind::MalformedRoundHeader("ROUND two (ct win) | t200-t100".to_string())
            )]
        );
    }

    #[test]
    fn test_round_header_variants() {
        let window = parse_round_header("ROUND 12 (unknown win) | t10-t20").unwrap();
        assert_eq!(window.round_number, 12);
        assert_eq!(window.winner, Side::Unknown);
        assert!(parse_round_header("ROUND 3 (ct win) | t20-t10").is_none());
        assert!(parse_round_header("ROUND 3 ct win | t0-t10").is_none());
        assert!(parse_round_header("ROUND 3 (ct win) t0-t10").is_none());
    }

    #[test]
    fn test_positions_defects_are_scoped() {
        let decoded = parse(
            "# MAP: m | ROUNDS: 1 | TICK: 64\n# PLAYERS: P0:a P1:b\n\
             ## ROUND 1 (t win) | t0-t100\n### Positions\n\
             P0 0:1,2,3 32:+x,+0,+0\nP1 0:4,5,6\nP7 0:0,0,0",
        );
        let round = &decoded.rounds[0];
        assert_eq!(round.tracks.len(), 2);
        assert_eq!(round.tracks[0].player, PlayerRef::Index(1));
        assert_eq!(
            round.tracks[1].player,
            PlayerRef::Unresolved("P7".to_string())
        );
        assert!(matches!(
            &decoded.defects[0].kind,
            DefectKind::MalformedPositions {
                reason: TokenError::NumericParse(_),
                ..
            }
        ));
        assert_eq!(
            decoded.defects[1],
            Defect::at(7, DefectKind::UnresolvedPlayer("P7".to_string()))
        );
    }

    #[test]
    fn test_event_defects_are_scoped() {
        let decoded = parse(
            "# MAP: m | ROUNDS: 1 | TICK: 64\n# PLAYERS: P0:a P1:b\n\
             ## ROUND 1 (ct win) | t0-t100\n### Events\n\
             10:D,P?>P1,UNK | 20:D,P0>P9,AK | 3x:BD,P1 | 40:H,P0>P1,25 | 50:BD,P1",
        );
        let events = &decoded.rounds[0].events;
        assert_eq!(events.len(), 4);
        assert_eq!(events[2], EventToken::Opaque("40:H,P0>P1,25".to_string()));
        assert!(matches!(
            events[3].event(),
            Some(Event::BombDefuse { tick: 50, .. })
        ));

        assert_eq!(decoded.defects.len(), 2);
        assert_eq!(
            decoded.defects[0],
            Defect::at(5, DefectKind::UnresolvedPlayer("P9".to_string()))
        );
        assert!(matches!(
            decoded.defects[1].kind,
            DefectKind::MalformedEvent { .. }
        ));
    }

    #[test]
    fn test_corrupted_leading_event_token_keeps_siblings() {
        let decoded = parse(
            "# MAP: m | ROUNDS: 1 | TICK: 64\n# PLAYERS: P0:a P1:b\n\
             ## ROUND 1 (t win) | t0-t100\n### Events\n\
             x10:D,P0>P1,AK | 20:BD,P1 | 30:BP,P0,A\n\
             SM,P0,A | 40:BD,P1",
        );
        let events: Vec<String> = decoded.rounds[0]
            .events
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(events, vec!["20:BD,P1", "30:BP,P0,A", "SM,P0,A", "40:BD,P1"]);
        assert_eq!(
            decoded.defects,
            vec![Defect::at(
                5,
                DefectKind::MalformedEvent {
                    token: "x10:D,P0>P1,AK".to_string(),
                    reason: EventParseError::NumericParse("x10".to_string()),
                }
            )]
        );
    }

    #[test]
    fn test_corrupted_position_label_stays_in_section() {
        let decoded = parse(
            "# MAP: m | ROUNDS: 1 | TICK: 64\n# PLAYERS: P0:a\n\
             ## ROUND 1 (t win) | t0-t100\n### Positions\n\
             é0 0:1,2,3\nP0 0:4,5,6\n### Grenades\nsmoke 10",
        );
        let round = &decoded.rounds[0];
        assert_eq!(round.tracks.len(), 2);
        assert_eq!(round.tracks[0].player, PlayerRef::Unresolved("é0".to_string()));
        assert_eq!(round.tracks[1].player, PlayerRef::Index(0));
        assert_eq!(
            decoded.defects,
            vec![
                Defect::at(7, DefectKind::UnrecognizedLine("### Grenades".to_string())),
                Defect::at(8, DefectKind::UnrecognizedLine("smoke 10".to_string())),
                Defect::at(5, DefectKind::UnresolvedPlayer("é0".to_string())),
            ]
        );
    }

    #[test]
    fn test_stray_lines() {
        let decoded =
            parse("# MAP: m | ROUNDS: 0 | TICK: 64\n# PLAYERS: P0:a\n100:BD,P0\nnonsense");
        assert!(decoded.rounds.is_empty());
        assert_eq!(decoded.defects.len(), 2);
        assert_eq!(decoded.defects[0].line, Some(3));
        assert_eq!(decoded.defects[1].line, Some(4));
    }

    #[test]
    fn test_malformed_roster_and_sites() {
        let decoded = parse(
            "# MAP: m | ROUNDS: 0 | TICK: 64\n# PLAYERS: P0:a Px:b P2:c_d\n# SITES: A(1,2) B(1,2,3)",
        );
        assert_eq!(decoded.metadata.roster.len(), 2);
        assert_eq!(decoded.metadata.roster.name_of(2), Some("c_d"));
        assert_eq!(decoded.sites.len(), 1);
        assert_eq!(
            decoded.defects,
            vec![
                Defect::at(2, DefectKind::MalformedRosterEntry("Px:b".to_string())),
                Defect::at(3, DefectKind::MalformedSite("A(1,2)".to_string())),
            ]
        );
    }

    #[test]
    fn test_parse_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.txt");
        std::fs::write(&path, DOC).unwrap();

        let decoded = DecodedMatch::from_file(&path).unwrap();
        assert_eq!(decoded.rounds.len(), 2);

        assert!(matches!(
            DecodedMatch::from_file(&dir.path().join("missing.txt")),
            Err(DocumentError::Read { .. })
        ));
    }
}
