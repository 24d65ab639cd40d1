//! Light-index extraction from a translation tree.
//!
//! Scans fragment files and pulls out just the display strings: each
//! fragment's `label` goes into the label index, its entries' identifier to
//! name pairs and its `folders` map go into the title index. The outputs are
//! what the engine loads at boot instead of the full tree.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{CliError, CliResult};

/// Options controlling the scan.
#[derive(Debug, Clone)]
pub struct GeneratorOptions {
    /// Descend into subdirectories.
    pub recursive: bool,
    /// Also index `*_packs-folders.json` fragments.
    pub include_folders: bool,
    /// Index `name` fields of nested objects, keyed by the containing key.
    pub deep: bool,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            recursive: true,
            include_folders: false,
            deep: false,
        }
    }
}

/// Title and folder translations extracted for one pack.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PackTitles {
    /// Original key or name to translated name.
    pub titles: BTreeMap<String, String>,
    /// Original folder name to translated name.
    pub folders: BTreeMap<String, String>,
}

impl PackTitles {
    /// Whether nothing was extracted for this pack.
    pub fn is_empty(&self) -> bool {
        self.titles.is_empty() && self.folders.is_empty()
    }
}

/// The generated light indexes.
#[derive(Debug, Default)]
pub struct LightIndexes {
    /// Pack id to translated display label.
    pub labels: BTreeMap<String, String>,
    /// Pack id to extracted titles and folders.
    pub titles: BTreeMap<String, PackTitles>,
}

impl LightIndexes {
    /// Packs with at least one extracted title or folder.
    pub fn pack_count(&self) -> usize {
        self.titles.values().filter(|entry| !entry.is_empty()).count()
    }

    /// Total extracted titles across non-empty packs.
    pub fn title_count(&self) -> usize {
        self.titles.values().map(|entry| entry.titles.len()).sum()
    }

    /// Total extracted folder translations across non-empty packs.
    pub fn folder_count(&self) -> usize {
        self.titles.values().map(|entry| entry.folders.len()).sum()
    }

    /// Render the label index document, sorted by key.
    pub fn labels_json(&self, pretty: bool) -> CliResult<String> {
        render(&self.labels, pretty)
    }

    /// Render the title index document, sorted by key. Packs with zero
    /// titles and zero folders are omitted.
    pub fn titles_json(&self, pretty: bool) -> CliResult<String> {
        let non_empty: BTreeMap<&String, &PackTitles> = self
            .titles
            .iter()
            .filter(|(_, entry)| !entry.is_empty())
            .collect();
        render(&non_empty, pretty)
    }
}

fn render<T: Serialize>(document: &T, pretty: bool) -> CliResult<String> {
    let rendered = if pretty {
        serde_json::to_string_pretty(document)?
    } else {
        serde_json::to_string(document)?
    };
    Ok(rendered + "\n")
}

/// Scan a translation tree and build the light indexes.
pub fn generate(input: &Path, options: &GeneratorOptions) -> CliResult<LightIndexes> {
    let mut indexes = LightIndexes::default();

    for file in collect_files(input, options.recursive)? {
        let Some(name) = file.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        if skip_file(&name.to_lowercase(), options.include_folders) {
            continue;
        }

        let Ok(raw) = fs::read_to_string(&file) else {
            continue;
        };
        let Ok(document) = serde_json::from_str::<Value>(&raw) else {
            continue;
        };

        let Some(stem) = file.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };
        let collection = stem.to_string();

        if let Some(label) = document.get("label").and_then(Value::as_str) {
            if !label.trim().is_empty() {
                indexes.labels.insert(collection.clone(), label.to_string());
            }
        }

        let pack = indexes.titles.entry(collection).or_default();
        if let Some(entries) = document.get("entries") {
            extract_titles(entries, options.deep, &mut pack.titles);
        }
        if let Some(Value::Object(folders)) = document.get("folders") {
            for (original, translated) in folders {
                if let Value::String(translated) = translated {
                    pack.folders.insert(original.clone(), translated.clone());
                }
            }
        }
    }

    Ok(indexes)
}

fn collect_files(input: &Path, recursive: bool) -> CliResult<Vec<PathBuf>> {
    let mut walker = WalkDir::new(input).min_depth(1);
    if !recursive {
        walker = walker.max_depth(1);
    }

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| CliError::Walk {
            path: input.display().to_string(),
            message: e.to_string(),
        })?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

fn skip_file(name_lower: &str, include_folders: bool) -> bool {
    if !name_lower.ends_with(".json") {
        return true;
    }
    if matches!(name_lower, "labels.json" | "titles.json" | "mapping.json") {
        return true;
    }
    !include_folders && name_lower.ends_with("_packs-folders.json")
}

/// Extract identifier to translated-name pairs from a fragment's entries.
fn extract_titles(entries: &Value, deep: bool, titles: &mut BTreeMap<String, String>) {
    match entries {
        Value::Array(rows) => {
            for row in rows {
                let Some(fields) = row.as_object() else {
                    continue;
                };
                let key = fields
                    .get("id")
                    .and_then(Value::as_str)
                    .or_else(|| fields.get("_id").and_then(Value::as_str));
                let translated = fields.get("name").and_then(Value::as_str);
                if let (Some(key), Some(translated)) = (key, translated) {
                    if !translated.trim().is_empty() {
                        titles.insert(key.to_string(), translated.to_string());
                    }
                }
                if deep {
                    scan_nested(row, titles);
                }
            }
        }
        Value::Object(map) => {
            for (key, value) in map {
                match value {
                    Value::String(translated) => {
                        if !translated.trim().is_empty() {
                            titles.insert(key.clone(), translated.clone());
                        }
                    }
                    Value::Object(entry) => {
                        if let Some(translated) = entry.get("name").and_then(Value::as_str) {
                            if !translated.trim().is_empty() {
                                titles.insert(key.clone(), translated.to_string());
                            }
                        }
                        if deep {
                            scan_nested(value, titles);
                        }
                    }
                    _ => {}
                }
            }
        }
        _ => {}
    }
}

/// Walk nested objects collecting `name` fields keyed by the containing key.
fn scan_nested(node: &Value, titles: &mut BTreeMap<String, String>) {
    match node {
        Value::Array(values) => {
            for value in values {
                scan_nested(value, titles);
            }
        }
        Value::Object(map) => {
            for (key, value) in map {
                if let Value::Object(nested) = value {
                    if let Some(name) = nested.get("name").and_then(Value::as_str) {
                        if !name.trim().is_empty() {
                            titles.insert(key.clone(), name.to_string());
                        }
                    }
                    scan_nested(value, titles);
                }
            }
        }
        _ => {}
    }
}
