//! Translation records and fragment merge rules.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Per-document translations for one pack: either a keyed mapping or a raw
/// sequence of translation rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Entries {
    /// Sequence-shaped entries, preserved in discovery order.
    List(Vec<Value>),
    /// Mapping-shaped entries keyed by document id or name.
    Map(Map<String, Value>),
}

impl Entries {
    /// Number of entries.
    pub fn len(&self) -> usize {
        match self {
            Entries::List(rows) => rows.len(),
            Entries::Map(map) => map.len(),
        }
    }

    /// Whether there are no entries at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up a mapping-shaped entry by key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Entries::Map(map) => map.get(key),
            Entries::List(_) => None,
        }
    }
}

/// Merged translation data for one pack.
///
/// Produced from one or more on-disk fragments; see [`TranslationRecord::merge`]
/// for the collision rules.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranslationRecord {
    /// Translated display label for the pack.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Per-document translations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entries: Option<Entries>,

    /// Field-conversion spec per document type. Opaque to the engine; only
    /// converter names inside it are inspected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapping: Option<Map<String, Value>>,

    /// Original folder name to translated name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folders: Option<BTreeMap<String, String>>,

    /// Document type names this record covers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub types: Option<Vec<String>>,

    /// Other packs that must be loaded alongside this one. Accepts a single
    /// string or an array in fragment JSON.
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "string_or_seq"
    )]
    pub reference: Vec<String>,
}

impl TranslationRecord {
    /// Fold a later fragment into this record.
    ///
    /// Later fragments win on key collisions; sequence-shaped entries are
    /// concatenated in input order. When entry shapes disagree, the
    /// non-sequence side contributes nothing.
    pub fn merge(&mut self, other: TranslationRecord) {
        if other.label.is_some() {
            self.label = other.label;
        }

        if let Some(right) = other.entries {
            self.entries = Some(match self.entries.take() {
                None => right,
                Some(left) => merge_entries(left, right),
            });
        }

        if let Some(right) = other.mapping {
            let left = self.mapping.get_or_insert_with(Map::new);
            left.extend(right);
        }

        if let Some(right) = other.folders {
            let left = self.folders.get_or_insert_with(BTreeMap::new);
            left.extend(right);
        }

        if let Some(right) = other.types {
            let mut merged = self.types.take().unwrap_or_default();
            for ty in right {
                if !merged.contains(&ty) {
                    merged.push(ty);
                }
            }
            self.types = Some(merged);
        }

        for reference in other.reference {
            if !self.reference.contains(&reference) {
                self.reference.push(reference);
            }
        }
    }
}

fn merge_entries(left: Entries, right: Entries) -> Entries {
    match (left, right) {
        (Entries::Map(mut left), Entries::Map(right)) => {
            left.extend(right);
            Entries::Map(left)
        }
        (left, right) => {
            let mut rows = into_rows(left);
            rows.extend(into_rows(right));
            Entries::List(rows)
        }
    }
}

fn into_rows(entries: Entries) -> Vec<Value> {
    match entries {
        Entries::List(rows) => rows,
        Entries::Map(_) => Vec::new(),
    }
}

fn string_or_seq<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrSeq {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<StringOrSeq>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(StringOrSeq::One(reference)) => vec![reference],
        Some(StringOrSeq::Many(references)) => {
            let mut out: Vec<String> = Vec::with_capacity(references.len());
            for reference in references {
                if !out.contains(&reference) {
                    out.push(reference);
                }
            }
            out
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> TranslationRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn later_fragment_wins_on_label_and_entry_keys() {
        let mut merged = record(json!({"label": "A", "entries": {"1": "x"}}));
        merged.merge(record(json!({"label": "B", "entries": {"2": "y"}})));

        assert_eq!(merged.label.as_deref(), Some("B"));
        let entries = merged.entries.unwrap();
        assert_eq!(entries.get("1"), Some(&json!("x")));
        assert_eq!(entries.get("2"), Some(&json!("y")));
    }

    #[test]
    fn absent_label_keeps_earlier_value() {
        let mut merged = record(json!({"label": "A"}));
        merged.merge(record(json!({"entries": {"1": "x"}})));
        assert_eq!(merged.label.as_deref(), Some("A"));
    }

    #[test]
    fn sequence_entries_concatenate_in_order() {
        let mut merged = record(json!({"entries": [{"id": "1", "name": "x"}]}));
        merged.merge(record(json!({"entries": [{"id": "2", "name": "y"}]})));

        match merged.entries.unwrap() {
            Entries::List(rows) => {
                assert_eq!(rows.len(), 2);
                assert_eq!(rows[0]["id"], "1");
                assert_eq!(rows[1]["id"], "2");
            }
            Entries::Map(_) => panic!("expected sequence-shaped entries"),
        }
    }

    #[test]
    fn mismatched_entry_shapes_keep_only_the_sequence_side() {
        let mut merged = record(json!({"entries": {"1": "x"}}));
        merged.merge(record(json!({"entries": [{"id": "2", "name": "y"}]})));

        match merged.entries.unwrap() {
            Entries::List(rows) => assert_eq!(rows.len(), 1),
            Entries::Map(_) => panic!("expected sequence-shaped entries"),
        }
    }

    #[test]
    fn types_union_keeps_first_seen_order() {
        let mut merged = record(json!({"types": ["spell", "feat"]}));
        merged.merge(record(json!({"types": ["feat", "action"]})));
        assert_eq!(
            merged.types.unwrap(),
            vec!["spell".to_string(), "feat".to_string(), "action".to_string()]
        );
    }

    #[test]
    fn reference_accepts_string_or_array_and_dedupes() {
        let mut merged = record(json!({"reference": "a.b"}));
        merged.merge(record(json!({"reference": ["a.b", "a.c"]})));
        assert_eq!(merged.reference, vec!["a.b".to_string(), "a.c".to_string()]);
    }

    #[test]
    fn mapping_and_folders_union_with_right_side_overwrite() {
        let mut merged = record(json!({
            "mapping": {"name": "name", "desc": {"path": "old"}},
            "folders": {"Spells": "Sorts"}
        }));
        merged.merge(record(json!({
            "mapping": {"desc": {"path": "new"}},
            "folders": {"Feats": "Dons"}
        })));

        let mapping = merged.mapping.unwrap();
        assert_eq!(mapping["desc"]["path"], "new");
        assert_eq!(mapping["name"], "name");

        let folders = merged.folders.unwrap();
        assert_eq!(folders["Spells"], "Sorts");
        assert_eq!(folders["Feats"], "Dons");
    }
}
