//! Tickscript Core - compact match telemetry codec
//!
//! Turns per-tick match telemetry into a small, human-legible text document
//! and parses that document back into typed rounds, tracks and events.
//!
//! # Architecture
//!
//! - [`Roster`] - stable `P<n>` player indices
//! - [`position`] - sampled positions as absolute + delta tokens
//! - [`event`] - deaths, plants and defuses as abbreviated tokens
//! - [`RoundSegmenter`] - per-round telemetry windows
//! - [`document`] - header and round blocks, assembler and recovering parser
//! - [`Encoder`] - telemetry → [`CompactDocument`]
//! - [`DocumentParser`] - text → [`DecodedMatch`]
//! - [`MatchStats`] - summary statistics over a decoded match

pub mod config;
pub mod document;
pub mod encoder;
pub mod error;
pub mod event;
pub mod position;
pub mod roster;
pub mod segment;
pub mod stats;
pub mod telemetry;
pub mod types;

pub use config::{CodecConfig, StatsConfig};
pub use document::{
    CompactDocument, DecodedMatch, DocumentAssembler, DocumentParser, DocumentSections,
    EncodedRound, PlayerTrack, RoundRecord,
};
pub use encoder::{EncodedMatch, Encoder};
pub use error::{ConfigError, Defect, DefectKind, DocumentError, EncodeError};
pub use event::{EventParseError, SiteTable, WeaponTable};
pub use position::{PositionToken, TokenError, TrackPoint};
pub use roster::Roster;
pub use segment::{BoundaryConflict, RoundSegmenter};
pub use stats::MatchStats;
pub use telemetry::{MatchTelemetry, TelemetrySource};
pub use types::{
    Event, EventToken, ExternalId, MatchMetadata, PlayerRecord, PlayerRef, Provenance,
    RoundWindow, Side, SiteMarker,
};

/// Encode a match with the given configuration
pub fn encode_match<S: TelemetrySource + ?Sized>(
    source: &S,
    config: &CodecConfig,
) -> Result<EncodedMatch, EncodeError> {
    Encoder::new(config.clone()).encode(source)
}

/// Decode a compact document with the given configuration
pub fn decode_document(text: &str, config: &CodecConfig) -> DecodedMatch {
    DocumentParser::new(config).parse(text)
}
