//! Match encoder
//!
//! Telemetry → round slices → position and event tokens → document.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::config::CodecConfig;
use crate::document::{CompactDocument, DocumentAssembler, DocumentSections, EncodedRound};
use crate::error::EncodeError;
use crate::event::{EventEncoder, WeaponTable};
use crate::position::{self, truncate};
use crate::roster::Roster;
use crate::segment::{BoundaryConflict, RoundSegmenter, RoundSlice};
use crate::telemetry::TelemetrySource;
use crate::types::{MatchMetadata, PositionSample, Provenance, SiteMarker};

/// Result of encoding one match
#[derive(Debug, Clone)]
pub struct EncodedMatch {
    pub metadata: MatchMetadata,
    pub rounds: Vec<EncodedRound>,
    pub document: CompactDocument,
    /// Overlapping round windows found while segmenting
    pub boundary_conflicts: Vec<BoundaryConflict>,
}

/// Telemetry to compact document encoder
#[derive(Debug, Clone, Default)]
pub struct Encoder {
    config: CodecConfig,
    source: Option<String>,
    generated_at: Option<DateTime<Utc>>,
}

impl Encoder {
    pub fn new(config: CodecConfig) -> Self {
        Self {
            config,
            source: None,
            generated_at: None,
        }
    }

    /// Source label written to the preamble
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Fixed preamble timestamp (defaults to the time of encoding)
    pub fn with_generated_at(mut self, at: DateTime<Utc>) -> Self {
        self.generated_at = Some(at);
        self
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    pub fn encode<S: TelemetrySource + ?Sized>(
        &self,
        source: &S,
    ) -> Result<EncodedMatch, EncodeError> {
        let interval = self.config.sample_interval;
        if interval == 0 {
            return Err(EncodeError::ZeroSampleInterval);
        }

        // Players may appear only in position rows, so both feed the roster
        let roster = Roster::build(
            source
                .players()
                .iter()
                .map(|p| (p.external_id, p.name.as_str()))
                .chain(source.positions().iter().map(|p| (p.external_id, p.name.as_str()))),
        );

        let segmenter = RoundSegmenter::new(source.rounds(), self.config.round_span_fallback)?;
        let slices = segmenter.segment(source);

        let rounds = {
            let events = EventEncoder::new(&roster, &self.config);
            slices
                .iter()
                .map(|slice| self.encode_round(slice, &roster, &events))
                .collect::<Result<Vec<_>, _>>()?
        };

        let metadata = MatchMetadata {
            map_name: source.map_name().to_string(),
            round_count: segmenter.windows().len() as u32,
            tick_rate: source.tick_rate().unwrap_or(self.config.encode_tick_rate),
            roster,
        };

        let sections = self.config.sections.flags();
        let sites = source
            .bombsites()
            .iter()
            .map(|s| {
                let coord = |v: f64| truncate(v).ok_or(EncodeError::SiteOutOfRange(s.letter));
                Ok(SiteMarker {
                    letter: s.letter,
                    x: coord(s.x)?,
                    y: coord(s.y)?,
                    z: coord(s.z)?,
                })
            })
            .collect::<Result<Vec<_>, EncodeError>>()?;
        let provenance = Provenance {
            generated_at: self.generated_at.or_else(|| {
                sections
                    .contains(DocumentSections::PREAMBLE)
                    .then(Utc::now)
            }),
            source: self.source.clone(),
            sample_interval: Some(interval),
        };

        let document = DocumentAssembler::new(&metadata)
            .sections(sections)
            .sites(sites)
            .provenance(provenance)
            .weapon_legend(WeaponTable::from_config(&self.config).legend())
            .assemble(&rounds);

        info!(
            map = %metadata.map_name,
            rounds = rounds.len(),
            players = metadata.roster.len(),
            bytes = document.to_text().len(),
            tokens = document.token_estimate(),
            "Encoded match"
        );

        Ok(EncodedMatch {
            metadata,
            rounds,
            document,
            boundary_conflicts: segmenter.boundary_conflicts(),
        })
    }

    fn encode_round(
        &self,
        slice: &RoundSlice<'_>,
        roster: &Roster,
        events: &EventEncoder<'_>,
    ) -> Result<EncodedRound, EncodeError> {
        let window = slice.window;

        let samples = slice
            .positions
            .iter()
            .map(|row| -> Result<PositionSample, EncodeError> {
                let player_index = roster
                    .index_of(row.external_id)
                    .ok_or(EncodeError::UnknownPlayer {
                        kind: "position",
                        tick: row.tick,
                        external_id: row.external_id,
                    })?;
                let coord = |v: f64| {
                    truncate(v).ok_or(EncodeError::CoordinateOutOfRange {
                        tick: row.tick,
                        player: player_index,
                    })
                };
                Ok(PositionSample {
                    tick: row.tick,
                    player_index,
                    x: coord(row.x)?,
                    y: coord(row.y)?,
                    z: coord(row.z)?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let tracks =
            position::encode_round(&samples, window.start_tick, self.config.sample_interval)?;
        let events = events.encode_round(&slice.deaths, &slice.plants, &slice.defuses)?;

        debug!(
            round = window.round_number,
            samples = samples.len(),
            players = tracks.len(),
            events = events.len(),
            "Encoded round"
        );

        Ok(EncodedRound {
            window,
            tracks,
            events,
        })
    }
}
