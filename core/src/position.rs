//! Position delta codec
//!
//! Per player and per round, positions are written as one absolute token
//! followed by signed deltas:
//!
//! ```text
//! P3 1000:-1520,240,32 1032:+12,-4,+0 1096:+40,+18,+0
//! ```
//!
//! Only ticks on the sampling grid are considered, and a sample equal to the
//! last *emitted* position is dropped. A missing tick therefore means either
//! "not sampled" or "did not move"; decoding cannot tell the two apart.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::EncodeError;
use crate::types::PositionSample;

/// One encoded position token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionToken {
    /// Full coordinates, starts (or restarts) a track
    Absolute { tick: u64, x: i64, y: i64, z: i64 },
    /// Offset from the previous emitted position
    Delta { tick: u64, dx: i64, dy: i64, dz: i64 },
}

impl PositionToken {
    pub fn tick(&self) -> u64 {
        match self {
            PositionToken::Absolute { tick, .. } | PositionToken::Delta { tick, .. } => *tick,
        }
    }

    /// Parse a single `<tick>:<a>,<b>,<c>` token.
    ///
    /// With `anchored == false` (no absolute position seen yet) the token is
    /// always absolute. Otherwise it is a delta when every component carries
    /// an explicit sign, and an absolute re-anchor when any component does
    /// not.
    pub fn parse(s: &str, anchored: bool) -> Result<Self, TokenError> {
        let (tick_str, coords) = s
            .split_once(':')
            .ok_or_else(|| TokenError::Malformed(s.to_string()))?;
        let tick: u64 = tick_str
            .parse()
            .map_err(|_| TokenError::NumericParse(s.to_string()))?;

        let parts: Vec<&str> = coords.split(',').collect();
        let [a, b, c] = parts[..] else {
            return Err(TokenError::Malformed(s.to_string()));
        };

        let parse = |v: &str| -> Result<i64, TokenError> {
            v.parse().map_err(|_| TokenError::NumericParse(s.to_string()))
        };
        let (a, b, c) = (parse(a)?, parse(b)?, parse(c)?);

        let signed = parts.iter().all(|p| p.starts_with(['+', '-']));
        if anchored && signed {
            Ok(PositionToken::Delta {
                tick,
                dx: a,
                dy: b,
                dz: c,
            })
        } else {
            Ok(PositionToken::Absolute {
                tick,
                x: a,
                y: b,
                z: c,
            })
        }
    }
}

impl fmt::Display for PositionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionToken::Absolute { tick, x, y, z } => write!(f, "{}:{},{},{}", tick, x, y, z),
            PositionToken::Delta { tick, dx, dy, dz } => {
                write!(f, "{}:{:+},{:+},{:+}", tick, dx, dy, dz)
            }
        }
    }
}

/// Position token failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("malformed token {0:?}")]
    Malformed(String),

    #[error("non-integer value in token {0:?}")]
    NumericParse(String),

    #[error("delta at tick {0} has no absolute position to apply to")]
    DeltaWithoutAnchor(u64),

    #[error("coordinate overflow at tick {0}")]
    Overflow(u64),
}

/// Decoded absolute position at a sampled tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TrackPoint {
    pub tick: u64,
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

/// Truncate a raw coordinate toward zero.
///
/// `None` for NaN, infinities and values outside the `i64` range.
pub fn truncate(v: f64) -> Option<i64> {
    let t = v.trunc();
    (t >= i64::MIN as f64 && t < i64::MAX as f64).then_some(t as i64)
}

/// Whether a tick lies on the round's sampling grid
pub fn is_sampled(tick: u64, round_start: u64, sample_interval: u64) -> bool {
    tick >= round_start && (tick - round_start) % sample_interval == 0
}

/// Encoder state for a single player's track
#[derive(Debug, Default)]
pub struct TrackEncoder {
    last_emitted: Option<[i64; 3]>,
    tokens: Vec<PositionToken>,
}

impl TrackEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one retained sample; returns the token emitted, if any.
    ///
    /// Fails with [`TokenError::Overflow`] when the delta does not fit an
    /// `i64`. The encoder state is left unchanged in that case.
    pub fn push(&mut self, tick: u64, pos: [i64; 3]) -> Result<Option<PositionToken>, TokenError> {
        let token = match self.last_emitted {
            None => PositionToken::Absolute {
                tick,
                x: pos[0],
                y: pos[1],
                z: pos[2],
            },
            Some(last) if last == pos => return Ok(None),
            Some(last) => {
                let sub = |a: i64, b: i64| a.checked_sub(b).ok_or(TokenError::Overflow(tick));
                PositionToken::Delta {
                    tick,
                    dx: sub(pos[0], last[0])?,
                    dy: sub(pos[1], last[1])?,
                    dz: sub(pos[2], last[2])?,
                }
            }
        };
        self.last_emitted = Some(pos);
        self.tokens.push(token);
        Ok(Some(token))
    }

    pub fn finish(self) -> Vec<PositionToken> {
        self.tokens
    }
}

/// Encode one round's samples into per-player token streams.
///
/// `samples` must be in ascending tick order per player. Samples off the
/// sampling grid are ignored. Output is keyed by player index.
pub fn encode_round(
    samples: &[PositionSample],
    round_start: u64,
    sample_interval: u64,
) -> Result<BTreeMap<u32, Vec<PositionToken>>, EncodeError> {
    let mut tracks: BTreeMap<u32, TrackEncoder> = BTreeMap::new();

    for sample in samples
        .iter()
        .filter(|s| is_sampled(s.tick, round_start, sample_interval))
    {
        tracks
            .entry(sample.player_index)
            .or_default()
            .push(sample.tick, sample.coords())
            .map_err(|_| EncodeError::CoordinateOutOfRange {
                tick: sample.tick,
                player: sample.player_index,
            })?;
    }

    Ok(tracks
        .into_iter()
        .map(|(player, encoder)| (player, encoder.finish()))
        .filter(|(_, tokens)| !tokens.is_empty())
        .collect())
}

/// Render a token stream as space-separated text
pub fn format_track(tokens: &[PositionToken]) -> String {
    tokens
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse the whitespace-separated tokens of one player line.
pub fn parse_track(text: &str) -> Result<Vec<PositionToken>, TokenError> {
    let mut anchored = false;
    text.split_whitespace()
        .map(|raw| {
            let token = PositionToken::parse(raw, anchored)?;
            anchored = true;
            Ok(token)
        })
        .collect()
}

/// Fold a token stream back into absolute positions.
///
/// Exact in integer space: each point equals the coordinates the encoder saw
/// when it emitted the corresponding token.
pub fn decode_track(tokens: &[PositionToken]) -> Result<Vec<TrackPoint>, TokenError> {
    tokens
        .iter()
        .try_fold(Vec::with_capacity(tokens.len()), |mut points, token| {
            let point = match *token {
                PositionToken::Absolute { tick, x, y, z } => TrackPoint { tick, x, y, z },
                PositionToken::Delta { tick, dx, dy, dz } => {
                    let last: &TrackPoint =
                        points.last().ok_or(TokenError::DeltaWithoutAnchor(tick))?;
                    let add = |a: i64, b: i64| a.checked_add(b).ok_or(TokenError::Overflow(tick));
                    TrackPoint {
                        tick,
                        x: add(last.x, dx)?,
                        y: add(last.y, dy)?,
                        z: add(last.z, dz)?,
                    }
                }
            };
            points.push(point);
            Ok(points)
        })
}
