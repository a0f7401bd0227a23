//! Killmail references, priced item trees and derived fields.
//!
//! A [`KillmailReference`] is what producers push onto the queue. The pipeline turns the ESI
//! body it points at into [`PricedItem`] trees, [`KillmailValues`] and [`KillmailFlags`] which are
//! then persisted.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Queue entry identifying a killmail to import.
///
/// Serialized as `{"id": "<killmail id>", "hash": "<hash>"}`, numeric IDs are accepted on read.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KillmailReference {
    #[serde(with = "string_id")]
    pub id: i64,
    pub hash: String,
}

impl KillmailReference {
    pub fn new(id: i64, hash: impl Into<String>) -> Self {
        Self {
            id,
            hash: hash.into(),
        }
    }
}

impl fmt::Display for KillmailReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "killmail {} ({})", self.id, self.hash)
    }
}

mod string_id {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(id: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&id.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(i64),
        }

        match RawId::deserialize(deserializer)? {
            RawId::Text(text) => text.parse().map_err(de::Error::custom),
            RawId::Number(number) => Ok(number),
        }
    }
}

/// Pub/sub payload announcing a high value killmail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KillmailNotification {
    pub id: u64,
    pub hash: String,
}

/// Killmail item with its unit price and the value of the whole stack.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedItem {
    pub flag: i64,
    pub item_type_id: i64,
    pub quantity_destroyed: i64,
    pub quantity_dropped: i64,
    pub singleton: i64,
    pub item_value: f64,
    /// `item_value × (destroyed + dropped)`
    pub total_value: f64,
    pub items: Vec<PricedItem>,
}

/// ISK totals for a killmail.
///
/// `destroyed` includes the ship, `fitted` covers the ship plus items in fitted slots and
/// `total = destroyed + dropped`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct KillmailValues {
    pub ship_value: f64,
    pub destroyed: f64,
    pub dropped: f64,
    pub fitted: f64,
    pub total: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KillmailFlags {
    pub is_npc: bool,
    pub is_solo: bool,
    pub is_awox: bool,
}

/// Whether an item stack was destroyed or dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ItemFate {
    Destroyed,
    Dropped,
}

/// Item stack after merging duplicates of the same type, slot and fate.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedItem {
    pub item_type_id: i64,
    pub flag: i64,
    pub fate: ItemFate,
    pub singleton: i64,
    pub quantity: i64,
    pub item_value: f64,
    pub total_value: f64,
    pub items: Vec<MergedItem>,
}

/// Stored killmail with its victim, attackers and merged items
#[derive(Debug, Clone)]
pub struct KillmailGraph {
    pub killmail: entity::killmail::Model,
    pub victim: Option<entity::killmail_victim::Model>,
    pub attackers: Vec<entity::killmail_attacker::Model>,
    pub items: Vec<MergedItem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_serializes_id_as_string() {
        let reference = KillmailReference::new(117654321, "abcdef");

        let json = serde_json::to_string(&reference).unwrap();

        assert_eq!(json, r#"{"id":"117654321","hash":"abcdef"}"#);
    }

    #[test]
    fn reference_accepts_numeric_id() {
        let reference: KillmailReference =
            serde_json::from_str(r#"{"id":117654321,"hash":"abcdef"}"#).unwrap();

        assert_eq!(reference, KillmailReference::new(117654321, "abcdef"));
    }

    #[test]
    fn reference_rejects_garbage_id() {
        let result = serde_json::from_str::<KillmailReference>(r#"{"id":"nope","hash":"abcdef"}"#);

        assert!(result.is_err());
    }
}
