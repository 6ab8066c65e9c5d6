//! Event codec
//!
//! Events are written as `<tick>:<CODE>,<params>` tokens joined by ` | `:
//!
//! - `1234:D,P3>P8,AK,HS`: P3 killed P8 with an AK, headshot
//! - `5234:BP,P2,A`: P2 planted at site A
//! - `6100:BD,P7`: P7 defused
//!
//! Unknown codes survive decoding as opaque text.

use hashbrown::HashMap;

use crate::config::CodecConfig;
use crate::error::EncodeError;
use crate::roster::Roster;
use crate::telemetry::{DeathRow, DefuseRow, PlantRow};
use crate::types::{Event, EventToken, ExternalId, PlayerRef};

/// Separator between event tokens on an Events line
pub const EVENT_SEPARATOR: &str = " | ";

/// Weapon name → short code lookup
#[derive(Debug, Clone)]
pub struct WeaponTable {
    /// (lowercase pattern, code), checked in order
    entries: Vec<(String, String)>,
}

impl WeaponTable {
    pub fn from_config(config: &CodecConfig) -> Self {
        Self {
            entries: config
                .weapons
                .iter()
                .map(|w| (w.pattern.to_lowercase(), w.code.clone()))
                .collect(),
        }
    }

    /// Code for a raw weapon name.
    ///
    /// First table entry contained in the name (case-insensitive), else the
    /// first three characters uppercased, else `UNK` for an empty name.
    pub fn code_for(&self, raw: &str) -> String {
        let raw = raw.trim();
        if raw.is_empty() {
            return "UNK".to_string();
        }

        let lower = raw.to_lowercase();
        if let Some((_, code)) = self
            .entries
            .iter()
            .find(|(pattern, _)| lower.contains(pattern.as_str()))
        {
            return code.clone();
        }

        raw.chars()
            .filter(|c| !matches!(c, ',' | '|' | '>') && !c.is_whitespace())
            .take(3)
            .collect::<String>()
            .to_uppercase()
    }

    /// `CODE=pattern` pairs for the legend
    pub fn legend(&self) -> String {
        self.entries
            .iter()
            .map(|(pattern, code)| format!("{}={}", code, pattern))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Default for WeaponTable {
    fn default() -> Self {
        Self::from_config(&CodecConfig::default())
    }
}

/// Bombsite id → letter lookup
#[derive(Debug, Clone)]
pub struct SiteTable {
    letters: HashMap<u32, char>,
    fallback: char,
}

impl SiteTable {
    pub fn from_config(config: &CodecConfig) -> Self {
        Self {
            letters: config.sites.iter().map(|s| (s.id, s.letter)).collect(),
            fallback: config.site_fallback,
        }
    }

    pub fn letter_for(&self, site_id: u32) -> char {
        self.letters.get(&site_id).copied().unwrap_or(self.fallback)
    }
}

/// Converts raw event rows into [`Event`]s for one match
pub struct EventEncoder<'r> {
    roster: &'r Roster,
    weapons: WeaponTable,
    sites: SiteTable,
}

impl<'r> EventEncoder<'r> {
    pub fn new(roster: &'r Roster, config: &CodecConfig) -> Self {
        Self {
            roster,
            weapons: WeaponTable::from_config(config),
            sites: SiteTable::from_config(config),
        }
    }

    fn player(
        &self,
        kind: &'static str,
        tick: u64,
        id: ExternalId,
    ) -> Result<PlayerRef, EncodeError> {
        self.roster
            .index_of(id)
            .map(PlayerRef::Index)
            .ok_or(EncodeError::UnknownPlayer {
                kind,
                tick,
                external_id: id,
            })
    }

    pub fn death(&self, row: &DeathRow) -> Result<Event, EncodeError> {
        // No attacker means world damage, written as P?
        let killer = match row.attacker {
            Some(id) => self.player("death", row.tick, id)?,
            None => PlayerRef::nobody(),
        };
        Ok(Event::Death {
            tick: row.tick,
            killer,
            victim: self.player("death", row.tick, row.victim)?,
            weapon_code: self.weapons.code_for(&row.weapon),
            headshot: row.headshot,
        })
    }

    pub fn plant(&self, row: &PlantRow) -> Result<Event, EncodeError> {
        Ok(Event::BombPlant {
            tick: row.tick,
            planter: self.player("bomb plant", row.tick, row.planter)?,
            site: self.sites.letter_for(row.site),
        })
    }

    pub fn defuse(&self, row: &DefuseRow) -> Result<Event, EncodeError> {
        Ok(Event::BombDefuse {
            tick: row.tick,
            defuser: self.player("bomb defuse", row.tick, row.defuser)?,
        })
    }

    /// Encode one round's rows, ordered by ascending tick.
    ///
    /// Ties keep kind order (deaths, plants, defuses) and input order.
    pub fn encode_round(
        &self,
        deaths: &[&DeathRow],
        plants: &[&PlantRow],
        defuses: &[&DefuseRow],
    ) -> Result<Vec<Event>, EncodeError> {
        let mut events = Vec::with_capacity(deaths.len() + plants.len() + defuses.len());
        for row in deaths {
            events.push(self.death(row)?);
        }
        for row in plants {
            events.push(self.plant(row)?);
        }
        for row in defuses {
            events.push(self.defuse(row)?);
        }
        events.sort_by_key(Event::tick);
        Ok(events)
    }
}

/// Render events as one Events line
pub fn format_events(events: &[Event]) -> String {
    events
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(EVENT_SEPARATOR)
}

/// Event token decode failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EventParseError {
    #[error("non-integer tick {0:?}")]
    NumericParse(String),

    #[error("expected {expected}")]
    Malformed { expected: &'static str },
}

/// Parse one event token against the roster.
///
/// Unknown codes come back as [`EventToken::Opaque`]. Player indices missing
/// from the roster come back as [`PlayerRef::Unresolved`].
pub fn parse_event(token: &str, roster: &Roster) -> Result<EventToken, EventParseError> {
    let token = token.trim();
    let Some((tick_str, body)) = token.split_once(':') else {
        return Ok(EventToken::Opaque(token.to_string()));
    };
    let (code, params) = body.split_once(',').unwrap_or((body, ""));
    if !matches!(code, "D" | "BP" | "BD") {
        return Ok(EventToken::Opaque(token.to_string()));
    }

    let tick: u64 = tick_str
        .trim()
        .parse()
        .map_err(|_| EventParseError::NumericParse(tick_str.to_string()))?;
    let params: Vec<&str> = params.split(',').map(str::trim).collect();

    let event = match (code, params.as_slice()) {
        ("D", [pair, weapon, rest @ ..]) => {
            let (killer, victim) = pair.split_once('>').ok_or(EventParseError::Malformed {
                expected: "death as P<killer>>P<victim>",
            })?;
            if weapon.is_empty() {
                return Err(EventParseError::Malformed {
                    expected: "weapon code",
                });
            }
            let headshot = match rest {
                [] => false,
                ["HS"] => true,
                _ => {
                    return Err(EventParseError::Malformed {
                        expected: "optional HS flag after weapon",
                    });
                }
            };
            Event::Death {
                tick,
                killer: parse_player(killer, roster)?,
                victim: parse_player(victim, roster)?,
                weapon_code: weapon.to_string(),
                headshot,
            }
        }
        ("D", _) => {
            return Err(EventParseError::Malformed {
                expected: "death as D,P<killer>>P<victim>,<weapon>[,HS]",
            });
        }
        ("BP", [planter, site]) => {
            let mut letters = site.chars();
            let site = match (letters.next(), letters.next()) {
                (Some(c), None) if c.is_ascii_alphabetic() => c,
                _ => {
                    return Err(EventParseError::Malformed {
                        expected: "single-letter site",
                    });
                }
            };
            Event::BombPlant {
                tick,
                planter: parse_player(planter, roster)?,
                site,
            }
        }
        ("BP", _) => {
            return Err(EventParseError::Malformed {
                expected: "plant as BP,P<planter>,<site>",
            });
        }
        ("BD", [defuser]) => Event::BombDefuse {
            tick,
            defuser: parse_player(defuser, roster)?,
        },
        _ => {
            return Err(EventParseError::Malformed {
                expected: "defuse as BD,P<defuser>",
            });
        }
    };

    Ok(EventToken::Event(event))
}

/// Parse a player reference; the `P` prefix is optional.
fn parse_player(raw: &str, roster: &Roster) -> Result<PlayerRef, EventParseError> {
    let digits = raw.strip_prefix('P').unwrap_or(raw);
    if digits.is_empty() {
        return Err(EventParseError::Malformed {
            expected: "player reference",
        });
    }
    Ok(match digits.parse::<u32>() {
        Ok(index) => roster.resolve(index),
        Err(_) => PlayerRef::Unresolved(format!("P{}", digits)),
    })
}

/// Parse every token on an Events line.
///
/// Each token succeeds or fails on its own.
pub fn parse_event_line<'a>(
    line: &'a str,
    roster: &'a Roster,
) -> impl Iterator<Item = (&'a str, Result<EventToken, EventParseError>)> + 'a {
    line.split('|')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(move |t| (t, parse_event(t, roster)))
}
