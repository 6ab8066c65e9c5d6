//! Error and defect types
//!
//! Encoding is strict and returns [`EncodeError`]. Decoding never fails as a
//! whole; problems are recorded as [`Defect`]s scoped to a single line.

use serde::{Serialize, Serializer};
use std::fmt;
use std::path::PathBuf;

use crate::event::EventParseError;
use crate::position::TokenError;
use crate::types::ExternalId;

/// Encode failures (upstream data is expected to be valid)
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("sample interval must be greater than zero")]
    ZeroSampleInterval,

    #[error("{kind} at tick {tick} references player {external_id} missing from the roster")]
    UnknownPlayer {
        kind: &'static str,
        tick: u64,
        external_id: ExternalId,
    },

    #[error("round {0} appears more than once in the round table")]
    DuplicateRound(u32),

    #[error("round {round} ends at tick {end} before it starts at tick {start}")]
    InvertedRound { round: u32, start: u64, end: u64 },

    #[error("position of P{player} at tick {tick} is outside the integer coordinate range")]
    CoordinateOutOfRange { tick: u64, player: u32 },

    #[error("bombsite {0} is outside the integer coordinate range")]
    SiteOutOfRange(char),
}

/// Configuration loading failures
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Failures reading or writing document and telemetry files
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid telemetry JSON: {0}")]
    Telemetry(#[from] serde_json::Error),
}

/// What went wrong with one piece of a document
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DefectKind {
    #[error("missing {0} pragma, using default")]
    MissingPragma(&'static str),

    #[error("malformed {key} pragma {value:?}, using default")]
    MalformedPragma { key: &'static str, value: String },

    #[error("malformed roster entry {0:?}")]
    MalformedRosterEntry(String),

    #[error("malformed site marker {0:?}")]
    MalformedSite(String),

    #[error("round block skipped, unreadable header {0:?}")]
    MalformedRoundHeader(String),

    #[error("positions for {player} dropped: {reason}")]
    MalformedPositions { player: String, reason: TokenError },

    #[error("event {token:?} dropped: {reason}")]
    MalformedEvent {
        token: String,
        reason: EventParseError,
    },

    #[error("player reference {0} is not in the roster")]
    UnresolvedPlayer(String),

    #[error("unrecognized line {0:?}")]
    UnrecognizedLine(String),
}

/// A localized decode problem
#[derive(Debug, Clone, PartialEq)]
pub struct Defect {
    /// 1-based line number, `None` for document-level defects
    pub line: Option<usize>,
    pub kind: DefectKind,
}

impl Defect {
    pub fn at(line: usize, kind: DefectKind) -> Self {
        Self {
            line: Some(line),
            kind,
        }
    }

    pub fn document(kind: DefectKind) -> Self {
        Self { line: None, kind }
    }
}

impl fmt::Display for Defect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "line {}: {}", line, self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for Defect {}

impl Serialize for Defect {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}
