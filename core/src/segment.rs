//! Round segmentation
//!
//! Splits match-wide telemetry into per-round subsets. Windows are inclusive
//! on both ends; positions are selected by round number *and* tick range,
//! events by tick range only.

use hashbrown::{HashMap, HashSet};
use tracing::warn;

use crate::error::EncodeError;
use crate::telemetry::{DeathRow, DefuseRow, PlantRow, PositionRow, RoundRow, TelemetrySource};
use crate::types::RoundWindow;

/// Two consecutive windows that share at least one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundaryConflict {
    pub earlier: u32,
    pub later: u32,
    /// Ticks claimed by both rounds
    pub shared_ticks: u64,
}

/// Telemetry belonging to one round
#[derive(Debug, Clone)]
pub struct RoundSlice<'a> {
    pub window: RoundWindow,
    /// Ascending tick order (stable for equal ticks)
    pub positions: Vec<&'a PositionRow>,
    pub deaths: Vec<&'a DeathRow>,
    pub plants: Vec<&'a PlantRow>,
    pub defuses: Vec<&'a DefuseRow>,
}

/// Round windows for one match, ascending by round number
#[derive(Debug, Clone)]
pub struct RoundSegmenter {
    windows: Vec<RoundWindow>,
}

impl RoundSegmenter {
    /// Build windows from the round table.
    ///
    /// Window start is the freeze end when known; a missing end tick becomes
    /// `start + round_span_fallback`.
    pub fn new(rounds: &[RoundRow], round_span_fallback: u64) -> Result<Self, EncodeError> {
        let mut seen = HashSet::with_capacity(rounds.len());
        let mut windows = Vec::with_capacity(rounds.len());

        for row in rounds {
            if !seen.insert(row.round_number) {
                return Err(EncodeError::DuplicateRound(row.round_number));
            }

            let start_tick = row.freeze_end_tick.unwrap_or(row.start_tick);
            let end_tick = row
                .end_tick
                .unwrap_or_else(|| start_tick.saturating_add(round_span_fallback));
            if end_tick < start_tick {
                return Err(EncodeError::InvertedRound {
                    round: row.round_number,
                    start: start_tick,
                    end: end_tick,
                });
            }

            windows.push(RoundWindow {
                round_number: row.round_number,
                winner: row.winner,
                start_tick,
                end_tick,
            });
        }
        windows.sort_by_key(|w| w.round_number);

        let segmenter = Self { windows };
        for conflict in segmenter.boundary_conflicts() {
            warn!(
                earlier = conflict.earlier,
                later = conflict.later,
                shared_ticks = conflict.shared_ticks,
                "Round windows overlap; shared ticks are assigned to both rounds"
            );
        }
        Ok(segmenter)
    }

    pub fn windows(&self) -> &[RoundWindow] {
        &self.windows
    }

    /// Consecutive windows (by round number) whose tick ranges intersect.
    ///
    /// Events inside the shared ticks appear in both rounds.
    pub fn boundary_conflicts(&self) -> Vec<BoundaryConflict> {
        self.windows
            .windows(2)
            .filter_map(|pair| {
                let (a, b) = (&pair[0], &pair[1]);
                let first = a.start_tick.max(b.start_tick);
                let last = a.end_tick.min(b.end_tick);
                (first <= last).then(|| BoundaryConflict {
                    earlier: a.round_number,
                    later: b.round_number,
                    shared_ticks: last - first + 1,
                })
            })
            .collect()
    }

    /// Slice the source's rows into per-round subsets, in window order
    pub fn segment<'a, S: TelemetrySource + ?Sized>(&self, source: &'a S) -> Vec<RoundSlice<'a>> {
        let mut positions_by_round: HashMap<u32, Vec<&'a PositionRow>> = HashMap::new();
        for row in source.positions() {
            positions_by_round.entry(row.round_number).or_default().push(row);
        }

        self.windows
            .iter()
            .map(|window| {
                let mut positions: Vec<&PositionRow> = positions_by_round
                    .get(&window.round_number)
                    .map(|rows| {
                        rows.iter()
                            .copied()
                            .filter(|r| window.contains(r.tick))
                            .collect()
                    })
                    .unwrap_or_default();
                positions.sort_by_key(|r| r.tick);

                RoundSlice {
                    window: *window,
                    positions,
                    deaths: within(source.deaths(), window, |r| r.tick),
                    plants: within(source.plants(), window, |r| r.tick),
                    defuses: within(source.defuses(), window, |r| r.tick),
                }
            })
            .collect()
    }
}

fn within<'a, T>(rows: &'a [T], window: &RoundWindow, tick: impl Fn(&T) -> u64) -> Vec<&'a T> {
    let mut selected: Vec<&T> = rows.iter().filter(|r| window.contains(tick(*r))).collect();
    selected.sort_by_key(|r| tick(*r));
    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::MatchTelemetry;
    use crate::types::{ExternalId, Side};

    fn round(n: u32, start: u64, freeze_end: Option<u64>, end: Option<u64>) -> RoundRow {
        RoundRow {
            round_number: n,
            winner: Side::T,
            start_tick: start,
            freeze_end_tick: freeze_end,
            end_tick: end,
        }
    }

    fn position(tick: u64, round_number: u32) -> PositionRow {
        PositionRow {
            tick,
            round_number,
            external_id: ExternalId(1),
            name: "a".to_string(),
            x: 0.0,
            y: 0.0,
            z: 0.0,
        }
    }

    #[test]
    fn test_window_bounds() {
        let segmenter = RoundSegmenter::new(
            &[round(2, 500, None, None), round(1, 0, Some(64), Some(400))],
            10_000,
        )
        .unwrap();

        let windows = segmenter.windows();
        assert_eq!(windows[0].round_number, 1);
        assert_eq!((windows[0].start_tick, windows[0].end_tick), (64, 400));
        assert_eq!(windows[1].round_number, 2);
        assert_eq!((windows[1].start_tick, windows[1].end_tick), (500, 10_500));
        assert!(segmenter.boundary_conflicts().is_empty());
    }

    #[test]
    fn test_invalid_round_tables() {
        assert!(matches!(
            RoundSegmenter::new(&[round(1, 0, None, None), round(1, 10, None, None)], 100),
            Err(EncodeError::DuplicateRound(1))
        ));
        assert!(matches!(
            RoundSegmenter::new(&[round(3, 500, None, Some(100))], 100),
            Err(EncodeError::InvertedRound { round: 3, .. })
        ));
    }

    #[test]
    fn test_adjacent_windows_are_flagged() {
        let segmenter = RoundSegmenter::new(
            &[round(1, 0, None, Some(100)), round(2, 100, None, Some(200))],
            10_000,
        )
        .unwrap();

        assert_eq!(
            segmenter.boundary_conflicts(),
            vec![BoundaryConflict {
                earlier: 1,
                later: 2,
                shared_ticks: 1,
            }]
        );
    }

    #[test]
    fn test_segment_filters() {
        let telemetry = MatchTelemetry {
            rounds: vec![round(1, 0, None, Some(100)), round(2, 200, None, Some(300))],
            positions: vec![
                position(64, 1),
                position(0, 1),
                position(100, 1),
                position(101, 1),
                // inside round 2's range but tagged round 1
                position(232, 1),
                position(232, 2),
            ],
            deaths: vec![
                DeathRow {
                    tick: 100,
                    attacker: None,
                    victim: ExternalId(1),
                    weapon: String::new(),
                    headshot: false,
                },
                DeathRow {
                    tick: 150,
                    attacker: None,
                    victim: ExternalId(1),
                    weapon: String::new(),
                    headshot: false,
                },
            ],
            ..Default::default()
        };

        let segmenter = RoundSegmenter::new(telemetry.rounds(), 10_000).unwrap();
        let slices = segmenter.segment(&telemetry);
        assert_eq!(slices.len(), 2);

        let ticks: Vec<u64> = slices[0].positions.iter().map(|p| p.tick).collect();
        assert_eq!(ticks, vec![0, 64, 100]);
        assert_eq!(slices[0].deaths.len(), 1);

        let ticks: Vec<u64> = slices[1].positions.iter().map(|p| p.tick).collect();
        assert_eq!(ticks, vec![232]);
        assert!(slices[1].deaths.is_empty());
    }
}
