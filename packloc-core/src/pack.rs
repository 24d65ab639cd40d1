//! Pack identity and installed translation artifacts.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::record::{Entries, TranslationRecord};

/// Catalog metadata for one pack, as supplied by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackMetadata {
    /// Owning package namespace (module or system id).
    pub namespace: String,
    /// Pack name inside the namespace.
    pub name: String,
    /// Document type of the pack's contents (e.g. `"Item"`, `"Adventure"`).
    #[serde(rename = "type")]
    pub kind: String,
    /// Display label shown in navigation.
    pub label: String,
}

impl PackMetadata {
    /// Create metadata with the label defaulting to the pack name.
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        let name = name.into();
        Self {
            namespace: namespace.into(),
            label: name.clone(),
            name,
            kind: kind.into(),
        }
    }

    /// Set the display label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Collection id for this pack: `"<namespace>.<name>"`.
    pub fn collection(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }
}

/// The installed translation artifact for one pack.
///
/// Installation marks the pack "translated"; the record itself is shared so
/// concurrent callers of the loader observe the same instance.
#[derive(Debug, Clone)]
pub struct TranslatedPack {
    /// The pack's catalog metadata.
    pub metadata: PackMetadata,
    /// The merged translation record.
    pub record: Arc<TranslationRecord>,
}

impl TranslatedPack {
    /// Create an artifact from metadata and a merged record.
    pub fn new(metadata: PackMetadata, record: Arc<TranslationRecord>) -> Self {
        Self { metadata, record }
    }

    /// Whether the record carries a translation for a document, looked up by
    /// id or name.
    pub fn has_translation(&self, key: &str) -> bool {
        match self.record.entries.as_ref() {
            None => false,
            Some(Entries::Map(map)) => map.contains_key(key),
            Some(Entries::List(rows)) => rows.iter().any(|row| {
                ["id", "_id", "name"]
                    .iter()
                    .filter_map(|field| row.get(*field))
                    .filter_map(|value| value.as_str())
                    .any(|value| value == key)
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn collection_id_joins_namespace_and_name() {
        let metadata = PackMetadata::new("pf2e", "spells-srd", "Item");
        assert_eq!(metadata.collection(), "pf2e.spells-srd");
        assert_eq!(metadata.label, "spells-srd");
    }

    #[test]
    fn has_translation_checks_both_entry_shapes() {
        let metadata = PackMetadata::new("a", "b", "Item");

        let keyed: TranslationRecord =
            serde_json::from_value(json!({"entries": {"Fireball": "Boule de feu"}})).unwrap();
        let pack = TranslatedPack::new(metadata.clone(), Arc::new(keyed));
        assert!(pack.has_translation("Fireball"));
        assert!(!pack.has_translation("Ice Storm"));

        let listed: TranslationRecord = serde_json::from_value(
            json!({"entries": [{"id": "abc", "name": "Boule de feu"}]}),
        )
        .unwrap();
        let pack = TranslatedPack::new(metadata, Arc::new(listed));
        assert!(pack.has_translation("abc"));
        assert!(pack.has_translation("Boule de feu"));
        assert!(!pack.has_translation("xyz"));
    }
}
