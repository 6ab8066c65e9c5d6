//! Player roster (index assignment and lookup)
//!
//! The roster is built once per match and then only read. Indices are
//! assigned in ascending external id order so that two encodes of the same
//! match always agree.

use hashbrown::{HashMap, HashSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::{ExternalId, PlayerRecord, PlayerRef};

/// Immutable player lookup table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<PlayerRecord>", into = "Vec<PlayerRecord>")]
pub struct Roster {
    players: Vec<PlayerRecord>,
    by_index: HashMap<u32, usize>,
    by_external: HashMap<ExternalId, u32>,
}

impl Roster {
    /// Build a roster from every `(external_id, name)` pair seen in a match.
    ///
    /// Duplicates are allowed; the first name seen for an id is kept.
    pub fn build<I, S>(observed: I) -> Self
    where
        I: IntoIterator<Item = (ExternalId, S)>,
        S: Into<String>,
    {
        let mut names: BTreeMap<ExternalId, String> = BTreeMap::new();
        for (id, name) in observed {
            names.entry(id).or_insert_with(|| name.into());
        }

        let players = names
            .into_iter()
            .enumerate()
            .map(|(index, (id, display_name))| PlayerRecord {
                index: index as u32,
                display_name,
                external_id: Some(id),
            })
            .collect();

        Self::from_records(players)
    }

    /// Build a roster from records recovered elsewhere (e.g. a document header).
    ///
    /// Records are kept in ascending index order. A repeated index keeps its
    /// first record.
    pub fn from_records(records: Vec<PlayerRecord>) -> Self {
        let mut players: Vec<PlayerRecord> = Vec::with_capacity(records.len());
        let mut seen = HashSet::new();
        for record in records {
            if seen.insert(record.index) {
                players.push(record);
            }
        }
        players.sort_by_key(|p| p.index);

        let by_index = players
            .iter()
            .enumerate()
            .map(|(pos, p)| (p.index, pos))
            .collect();
        let by_external = players
            .iter()
            .filter_map(|p| p.external_id.map(|id| (id, p.index)))
            .collect();

        Self {
            players,
            by_index,
            by_external,
        }
    }

    /// Index assigned to an upstream player id
    pub fn index_of(&self, external_id: ExternalId) -> Option<u32> {
        self.by_external.get(&external_id).copied()
    }

    /// Display name for an index
    pub fn name_of(&self, index: u32) -> Option<&str> {
        self.get(index).map(|p| p.display_name.as_str())
    }

    pub fn get(&self, index: u32) -> Option<&PlayerRecord> {
        self.by_index.get(&index).map(|&pos| &self.players[pos])
    }

    pub fn contains(&self, index: u32) -> bool {
        self.by_index.contains_key(&index)
    }

    /// Resolve a numeric index into a player reference.
    pub fn resolve(&self, index: u32) -> PlayerRef {
        if self.contains(index) {
            PlayerRef::Index(index)
        } else {
            PlayerRef::Unresolved(format!("P{}", index))
        }
    }

    /// Display name for a reference, or the reference text itself
    pub fn label(&self, player: &PlayerRef) -> String {
        player
            .index()
            .and_then(|i| self.name_of(i))
            .map(str::to_string)
            .unwrap_or_else(|| player.to_string())
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Records in ascending index order
    pub fn iter(&self) -> impl Iterator<Item = &PlayerRecord> {
        self.players.iter()
    }
}

impl From<Vec<PlayerRecord>> for Roster {
    fn from(records: Vec<PlayerRecord>) -> Self {
        Self::from_records(records)
    }
}

impl From<Roster> for Vec<PlayerRecord> {
    fn from(roster: Roster) -> Self {
        roster.players
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(v: u64) -> ExternalId {
        ExternalId(v)
    }

    #[test]
    fn test_indices_follow_external_id_order() {
        let roster = Roster::build(vec![
            (id(76561198000000300), "charlie"),
            (id(76561198000000100), "alpha"),
            (id(76561198000000200), "bravo"),
        ]);

        assert_eq!(roster.len(), 3);
        assert_eq!(roster.index_of(id(76561198000000100)), Some(0));
        assert_eq!(roster.index_of(id(76561198000000200)), Some(1));
        assert_eq!(roster.index_of(id(76561198000000300)), Some(2));
        assert_eq!(roster.name_of(0), Some("alpha"));
        assert_eq!(roster.name_of(2), Some("charlie"));
    }

    #[test]
    fn test_indices_form_bijection() {
        let observed: Vec<(ExternalId, String)> = (0..10u64)
            .rev()
            .flat_map(|i| vec![(id(i * 7 + 3), format!("p{}", i)); 3])
            .collect();
        let roster = Roster::build(observed);

        let mut indices: Vec<u32> = roster.iter().map(|p| p.index).collect();
        indices.sort_unstable();
        assert_eq!(indices, (0..10).collect::<Vec<_>>());

        for record in roster.iter() {
            let external = record.external_id.unwrap();
            assert_eq!(roster.index_of(external), Some(record.index));
        }
    }

    #[test]
    fn test_first_name_wins() {
        let roster = Roster::build(vec![
            (id(5), "original"),
            (id(5), "renamed"),
            (id(9), "other"),
        ]);

        assert_eq!(roster.len(), 2);
        assert_eq!(roster.name_of(0), Some("original"));
    }

    #[test]
    fn test_unresolved_lookups() {
        let roster = Roster::build(vec![(id(1), "solo")]);

        assert_eq!(roster.index_of(id(2)), None);
        assert_eq!(roster.name_of(7), None);
        assert_eq!(roster.resolve(0), PlayerRef::Index(0));
        assert_eq!(roster.resolve(7), PlayerRef::Unresolved("P7".to_string()));
        assert_eq!(roster.label(&PlayerRef::Index(0)), "solo");
        assert_eq!(roster.label(&roster.resolve(7)), "P7");
    }

    #[test]
    fn test_from_records_sparse_and_duplicates() {
        let roster = Roster::from_records(vec![
            PlayerRecord {
                index: 4,
                display_name: "four".to_string(),
                external_id: None,
            },
            PlayerRecord {
                index: 1,
                display_name: "one".to_string(),
                external_id: None,
            },
            PlayerRecord {
                index: 4,
                display_name: "dup".to_string(),
                external_id: None,
            },
        ]);

        assert_eq!(roster.len(), 2);
        assert_eq!(roster.name_of(4), Some("four"));
        assert!(!roster.contains(0));
        let order: Vec<u32> = roster.iter().map(|p| p.index).collect();
        assert_eq!(order, vec![1, 4]);
    }
}
