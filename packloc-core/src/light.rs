//! Pre-baked label/title indexes and their application.
//!
//! The light indexes carry only display strings, so catalogs can be
//! relabeled and their lightweight indexes translated at boot without
//! loading any full pack translation.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::pack::PackMetadata;

/// Pack id to translated display label.
pub type LabelIndex = BTreeMap<String, String>;

/// Pack id to its title/folder index entry.
pub type TitleIndex = BTreeMap<String, TitleIndexEntry>;

/// Title and folder translations for one pack.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleIndexEntry {
    /// Original key or name to translated name.
    #[serde(default)]
    pub titles: BTreeMap<String, String>,
    /// Original folder name to translated name.
    #[serde(default)]
    pub folders: BTreeMap<String, String>,
}

impl TitleIndexEntry {
    /// Whether the entry holds no translations at all.
    pub fn is_empty(&self) -> bool {
        self.titles.is_empty() && self.folders.is_empty()
    }
}

/// One row of a catalog's lightweight index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Document id.
    #[serde(rename = "_id")]
    pub id: String,
    /// Display name.
    pub name: String,
    /// Name before translation, kept recoverable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_name: Option<String>,
    /// Whether this row has already been translated.
    #[serde(default)]
    pub translated: bool,
    /// Whether a translation exists for this row.
    #[serde(default)]
    pub has_translation: bool,
}

impl IndexEntry {
    /// Create an untranslated row.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }
}

/// A catalog folder row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogFolder {
    /// Display name, rewritten in place on translation.
    pub name: String,
}

impl CatalogFolder {
    /// Create a folder row.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Applies the pre-baked label and title indexes to catalog metadata and
/// lightweight index rows.
#[derive(Debug, Clone, Default)]
pub struct LightIndexApplier {
    labels: LabelIndex,
    titles: TitleIndex,
}

impl LightIndexApplier {
    /// Create an applier over loaded indexes.
    pub fn new(labels: LabelIndex, titles: TitleIndex) -> Self {
        Self { labels, titles }
    }

    /// The loaded label index.
    pub fn labels(&self) -> &LabelIndex {
        &self.labels
    }

    /// The loaded title index.
    pub fn titles(&self) -> &TitleIndex {
        &self.titles
    }

    /// Replace the label index wholesale.
    pub fn set_labels(&mut self, labels: LabelIndex) {
        self.labels = labels;
    }

    /// Replace the title index wholesale.
    pub fn set_titles(&mut self, titles: TitleIndex) {
        self.titles = titles;
    }

    /// Rewrite catalog display labels in place wherever the collection id is
    /// known to the label index.
    pub fn apply_labels(&self, packs: &mut [PackMetadata]) {
        for metadata in packs {
            if let Some(label) = self.labels.get(&metadata.collection()) {
                metadata.label = label.clone();
            }
        }
    }

    /// Translate a catalog's lightweight index rows in place.
    ///
    /// Idempotent: rows already marked translated are skipped, so re-applying
    /// neither re-translates nor loses the recorded original name.
    pub fn translate_index(&self, pack_id: &str, entries: &mut [IndexEntry]) {
        let Some(titles) = self.titles.get(pack_id).map(|entry| &entry.titles) else {
            return;
        };
        for entry in entries {
            translate_entry(titles, entry, None);
        }
    }

    /// Translate `(key, row)` index rows carrying an explicit lookup key.
    pub fn translate_keyed_index(&self, pack_id: &str, entries: &mut [(String, IndexEntry)]) {
        let Some(titles) = self.titles.get(pack_id).map(|entry| &entry.titles) else {
            return;
        };
        for (key, entry) in entries {
            translate_entry(titles, entry, Some(key.as_str()));
        }
    }

    /// Rewrite folder display names by exact original name.
    pub fn translate_folders(&self, pack_id: &str, folders: &mut [CatalogFolder]) {
        let Some(translations) = self.titles.get(pack_id).map(|entry| &entry.folders) else {
            return;
        };
        for folder in folders {
            if let Some(translated) = translations.get(&folder.name) {
                folder.name = translated.clone();
            }
        }
    }
}

/// Translate one index row. The first non-empty key with a non-empty
/// translation wins: explicit key, id, recorded original name, current name.
fn translate_entry(
    titles: &BTreeMap<String, String>,
    entry: &mut IndexEntry,
    explicit_key: Option<&str>,
) {
    if entry.translated {
        return;
    }

    let candidates = [
        explicit_key,
        Some(entry.id.as_str()),
        entry.original_name.as_deref(),
        Some(entry.name.as_str()),
    ];
    let translated = candidates
        .into_iter()
        .flatten()
        .filter(|key| !key.is_empty())
        .find_map(|key| titles.get(key).filter(|name| !name.is_empty()));

    let Some(translated) = translated.cloned() else {
        return;
    };

    if entry.original_name.is_none() {
        entry.original_name = Some(entry.name.clone());
    }
    entry.name = translated;
    entry.translated = true;
    entry.has_translation = true;
}

/// Overlay a raw `labels.json` document onto a label index. Non-object
/// documents and non-string values contribute nothing.
pub fn merge_label_overlay(labels: &mut LabelIndex, overlay: Value) {
    let Value::Object(map) = overlay else {
        return;
    };
    for (collection, label) in map {
        if let Value::String(label) = label {
            labels.insert(collection, label);
        }
    }
}

/// Overlay a raw `titles.json` document onto a title index, merging each
/// pack's title and folder maps.
pub fn merge_title_overlay(titles: &mut TitleIndex, overlay: Value) {
    let Value::Object(map) = overlay else {
        return;
    };
    for (collection, data) in map {
        let Ok(entry) = serde_json::from_value::<TitleIndexEntry>(data) else {
            continue;
        };
        let slot = titles.entry(collection).or_default();
        slot.titles.extend(entry.titles);
        slot.folders.extend(entry.folders);
    }
}
