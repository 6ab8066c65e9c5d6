//! Match statistics over a decoded document
//!
//! Everything here works from the compact form alone: round windows, the
//! event stream and the roster. Times are in seconds via the document's tick
//! rate.

use serde::Serialize;
use std::fmt;

use crate::config::StatsConfig;
use crate::document::{DecodedMatch, RoundRecord};
use crate::types::{Event, PlayerRef, Side};

/// Rounds with at most this many deaths count as quick
pub const QUICK_ROUND_DEATHS: usize = 3;
/// Rounds with at least this many deaths count as heavy
pub const HEAVY_ROUND_DEATHS: usize = 8;
/// Notable rounds reported
pub const MAX_NOTABLE_ROUNDS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotableKind {
    Quick,
    Heavy,
    Retake,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotableRound {
    pub round_number: u32,
    pub kind: NotableKind,
    pub deaths: usize,
}

impl fmt::Display for NotableRound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            NotableKind::Quick => write!(
                f,
                "Round {}: quick round ({} deaths)",
                self.round_number, self.deaths
            ),
            NotableKind::Heavy => write!(
                f,
                "Round {}: heavy casualties ({} deaths)",
                self.round_number, self.deaths
            ),
            NotableKind::Retake => write!(f, "Round {}: CT retake after plant", self.round_number),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerStats {
    pub index: u32,
    pub name: String,
    pub kills: u32,
    pub deaths: u32,
    /// Opening kills of a round
    pub first_kills: u32,
    /// Kills when the player never died
    pub kd_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchStats {
    pub map_name: String,
    pub rounds: usize,
    pub t_wins: usize,
    pub ct_wins: usize,
    pub t_win_rate: f64,
    pub ct_win_rate: f64,
    /// Seconds from round start to the first death
    pub avg_time_to_first_kill: Option<f64>,
    /// Seconds from round start to the first plant
    pub avg_plant_time: Option<f64>,
    pub avg_round_duration: Option<f64>,
    pub deaths_per_round: f64,
    pub plant_rounds: usize,
    /// T wins among rounds with a plant
    pub post_plant_win_rate: Option<f64>,
    /// Share of T-won rounds whose opening kill came from the configured
    /// entry team; `None` without a team or a qualifying round
    pub entry_success_rate: Option<f64>,
    /// Sorted by K/D, best first
    pub players: Vec<PlayerStats>,
    pub notable_rounds: Vec<NotableRound>,
}

fn deaths(round: &RoundRecord) -> impl Iterator<Item = (u64, &PlayerRef, &PlayerRef)> {
    round.events.iter().filter_map(|token| match token.event() {
        Some(Event::Death {
            tick,
            killer,
            victim,
            ..
        }) => Some((*tick, killer, victim)),
        _ => None,
    })
}

fn first_plant(round: &RoundRecord) -> Option<u64> {
    round.events.iter().find_map(|token| match token.event() {
        Some(Event::BombPlant { tick, .. }) => Some(*tick),
        _ => None,
    })
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 { 0.0 } else { part as f64 / whole as f64 }
}

impl MatchStats {
    /// Statistics with default settings (no entry team)
    pub fn compute(decoded: &DecodedMatch) -> Self {
        Self::compute_with(decoded, &StatsConfig::default())
    }

    pub fn compute_with(decoded: &DecodedMatch, config: &StatsConfig) -> Self {
        let rounds = &decoded.rounds;
        let tick_rate = f64::from(decoded.metadata.tick_rate.max(1));
        let seconds = |from: u64, to: u64| to.saturating_sub(from) as f64 / tick_rate;

        let t_wins = rounds.iter().filter(|r| r.window.winner == Side::T).count();
        let ct_wins = rounds.iter().filter(|r| r.window.winner == Side::Ct).count();

        let avg_time_to_first_kill = mean(rounds.iter().filter_map(|r| {
            deaths(r)
                .next()
                .map(|(tick, _, _)| seconds(r.window.start_tick, tick))
        }));
        let avg_plant_time = mean(
            rounds
                .iter()
                .filter_map(|r| first_plant(r).map(|tick| seconds(r.window.start_tick, tick))),
        );
        let avg_round_duration = mean(
            rounds
                .iter()
                .map(|r| seconds(r.window.start_tick, r.window.end_tick)),
        );

        let total_deaths: usize = rounds.iter().map(|r| deaths(r).count()).sum();
        let plant_rounds: Vec<&RoundRecord> =
            rounds.iter().filter(|r| first_plant(r).is_some()).collect();
        let post_plant_t_wins = plant_rounds
            .iter()
            .filter(|r| r.window.winner == Side::T)
            .count();

        Self {
            map_name: decoded.metadata.map_name.clone(),
            rounds: rounds.len(),
            t_wins,
            ct_wins,
            t_win_rate: ratio(t_wins, rounds.len()),
            ct_win_rate: ratio(ct_wins, rounds.len()),
            avg_time_to_first_kill,
            avg_plant_time,
            avg_round_duration,
            deaths_per_round: ratio(total_deaths, rounds.len()),
            plant_rounds: plant_rounds.len(),
            post_plant_win_rate: (!plant_rounds.is_empty())
                .then(|| ratio(post_plant_t_wins, plant_rounds.len())),
            entry_success_rate: Self::entry_success_rate(rounds, &config.entry_team),
            players: Self::player_stats(decoded),
            notable_rounds: Self::notable_rounds(rounds),
        }
    }

    /// Opening kills by an unresolved player (`P?`) do not count.
    fn entry_success_rate(rounds: &[RoundRecord], team: &[u32]) -> Option<f64> {
        if team.is_empty() {
            return None;
        }
        let openers: Vec<u32> = rounds
            .iter()
            .filter(|r| r.window.winner == Side::T)
            .filter_map(|r| deaths(r).next().and_then(|(_, killer, _)| killer.index()))
            .collect();
        let entries = openers.iter().filter(|i| team.contains(i)).count();
        (!openers.is_empty()).then(|| ratio(entries, openers.len()))
    }

    fn player_stats(decoded: &DecodedMatch) -> Vec<PlayerStats> {
        let roster = &decoded.metadata.roster;
        let mut players: Vec<PlayerStats> = roster
            .iter()
            .map(|p| PlayerStats {
                index: p.index,
                name: p.display_name.clone(),
                kills: 0,
                deaths: 0,
                first_kills: 0,
                kd_ratio: 0.0,
            })
            .collect();
        // Roster iteration is in index order; positions map back via binary search
        let slot = |player: &PlayerRef| {
            player
                .index()
                .and_then(|i| players.binary_search_by_key(&i, |p| p.index).ok())
        };

        let mut tallies = vec![(0u32, 0u32, 0u32); players.len()];
        for round in &decoded.rounds {
            for (nth, (_, killer, victim)) in deaths(round).enumerate() {
                if let Some(k) = slot(killer) {
                    tallies[k].0 += 1;
                    if nth == 0 {
                        tallies[k].2 += 1;
                    }
                }
                if let Some(v) = slot(victim) {
                    tallies[v].1 += 1;
                }
            }
        }

        for (player, (kills, deaths, first_kills)) in players.iter_mut().zip(tallies) {
            player.kills = kills;
            player.deaths = deaths;
            player.first_kills = first_kills;
            player.kd_ratio = if deaths > 0 {
                f64::from(kills) / f64::from(deaths)
            } else {
                f64::from(kills)
            };
        }

        players.sort_by(|a, b| b.kd_ratio.total_cmp(&a.kd_ratio));
        players
    }

    fn notable_rounds(rounds: &[RoundRecord]) -> Vec<NotableRound> {
        let mut notable = Vec::new();
        for round in rounds {
            let round_number = round.window.round_number;
            let count = deaths(round).count();
            if count <= QUICK_ROUND_DEATHS {
                notable.push(NotableRound {
                    round_number,
                    kind: NotableKind::Quick,
                    deaths: count,
                });
            } else if count >= HEAVY_ROUND_DEATHS {
                notable.push(NotableRound {
                    round_number,
                    kind: NotableKind::Heavy,
                    deaths: count,
                });
            }
            if first_plant(round).is_some() && round.window.winner == Side::Ct {
                notable.push(NotableRound {
                    round_number,
                    kind: NotableKind::Retake,
                    deaths: count,
                });
            }
        }
        notable.truncate(MAX_NOTABLE_ROUNDS);
        notable
    }
}

impl fmt::Display for MatchStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs =
            |v: Option<f64>| v.map_or_else(|| "n/a".to_string(), |s| format!("{:.1}s", s));
        let pct = |v: f64| format!("{:.1}%", v * 100.0);

        writeln!(f, "Map: {}", self.map_name)?;
        writeln!(f, "Rounds: {}", self.rounds)?;
        writeln!(
            f,
            "T wins: {}/{} ({})",
            self.t_wins,
            self.rounds,
            pct(self.t_win_rate)
        )?;
        writeln!(
            f,
            "CT wins: {}/{} ({})",
            self.ct_wins,
            self.rounds,
            pct(self.ct_win_rate)
        )?;
        writeln!(f, "Time to first kill: {}", secs(self.avg_time_to_first_kill))?;
        writeln!(f, "Plant time: {}", secs(self.avg_plant_time))?;
        writeln!(f, "Round duration: {}", secs(self.avg_round_duration))?;
        writeln!(f, "Deaths per round: {:.1}", self.deaths_per_round)?;
        match self.post_plant_win_rate {
            Some(rate) => writeln!(
                f,
                "Post-plant T win rate: {} ({} rounds)",
                pct(rate),
                self.plant_rounds
            )?,
            None => writeln!(f, "Post-plant T win rate: n/a")?,
        }
        if let Some(rate) = self.entry_success_rate {
            writeln!(f, "Entry success in T wins: {}", pct(rate))?;
        }

        writeln!(f)?;
        writeln!(
            f,
            "{:<16} {:>5} {:>6} {:>6} {:>6}",
            "Player", "Kills", "Deaths", "K/D", "Entry"
        )?;
        for p in &self.players {
            writeln!(
                f,
                "{:<16} {:>5} {:>6} {:>6.2} {:>6}",
                p.name, p.kills, p.deaths, p.kd_ratio, p.first_kills
            )?;
        }

        if !self.notable_rounds.is_empty() {
            writeln!(f)?;
            for round in &self.notable_rounds {
                writeln!(f, "{}", round)?;
            }
        }
        Ok(())
    }
}
