//! Converter availability and mapping registration.
//!
//! Converters themselves are external field-level transformation functions;
//! the engine only tracks which names are registered so packs whose mappings
//! reference an unregistered converter can be rebuilt once it appears.

use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};

use crate::record::TranslationRecord;

/// Registered converter names and default mappings per document kind.
#[derive(Debug, Default)]
pub struct ConverterRegistry {
    inner: RwLock<RegistryInner>,
}

#[derive(Debug, Default)]
struct RegistryInner {
    converters: HashSet<String>,
    default_mappings: HashMap<String, Map<String, Value>>,
}

impl ConverterRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record converter names as available.
    pub fn register_converters<I, S>(&self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut inner = self.inner.write();
        inner.converters.extend(names.into_iter().map(Into::into));
    }

    /// Register default mappings keyed by document kind. Returns the kinds
    /// that were (re)mapped.
    pub fn register_mapping(&self, mappings: Map<String, Value>) -> Vec<String> {
        let mut kinds = Vec::new();
        let mut inner = self.inner.write();
        for (kind, mapping) in mappings {
            let Value::Object(mapping) = mapping else {
                continue;
            };
            inner
                .default_mappings
                .entry(kind.clone())
                .or_default()
                .extend(mapping);
            kinds.push(kind);
        }
        kinds
    }

    /// Whether a converter name is registered.
    pub fn is_registered(&self, name: &str) -> bool {
        self.inner.read().converters.contains(name)
    }

    /// The default mapping for `kind` merged with the record's own overrides,
    /// record side winning per key.
    pub fn effective_mapping(&self, kind: &str, record: &TranslationRecord) -> Map<String, Value> {
        let mut effective = self
            .inner
            .read()
            .default_mappings
            .get(kind)
            .cloned()
            .unwrap_or_default();
        if let Some(overrides) = record.mapping.as_ref() {
            effective.extend(overrides.clone());
        }
        effective
    }

    /// Converter names referenced at the top level of `mapping` but not
    /// currently registered.
    pub fn collect_missing(&self, mapping: &Map<String, Value>) -> HashSet<String> {
        let inner = self.inner.read();
        let mut missing = HashSet::new();
        for value in mapping.values() {
            let Some(converter) = value
                .as_object()
                .and_then(|spec| spec.get("converter"))
                .and_then(Value::as_str)
            else {
                continue;
            };
            if !converter.is_empty() && !inner.converters.contains(converter) {
                missing.insert(converter.to_string());
            }
        }
        missing
    }
}

/// Whether any value in `mapping`, walked recursively, names a converter in
/// `targets`.
pub fn mapping_uses_converters(mapping: &Map<String, Value>, targets: &[&str]) -> bool {
    mapping.values().any(|value| value_uses_converters(value, targets))
}

fn value_uses_converters(value: &Value, targets: &[&str]) -> bool {
    let Some(spec) = value.as_object() else {
        return false;
    };
    if let Some(converter) = spec.get("converter").and_then(Value::as_str) {
        if targets.contains(&converter) {
            return true;
        }
    }
    spec.values().any(|nested| value_uses_converters(nested, targets))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn mapping(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn collect_missing_is_top_level_only() {
        let registry = ConverterRegistry::new();
        registry.register_converters(["known"]);

        let missing = registry.collect_missing(&mapping(json!({
            "name": "name",
            "desc": {"path": "system.description", "converter": "known"},
            "items": {"path": "items", "converter": "unknown"},
            "nested": {"inner": {"converter": "deep-unknown"}}
        })));

        assert_eq!(missing, HashSet::from(["unknown".to_string()]));
    }

    #[test]
    fn mapping_uses_converters_walks_nested_specs() {
        let spec = mapping(json!({
            "nested": {"inner": {"converter": "npc-data-translation"}}
        }));
        assert!(mapping_uses_converters(&spec, &["npc-data-translation"]));
        assert!(!mapping_uses_converters(&spec, &["other"]));
    }

    #[test]
    fn effective_mapping_lets_the_record_override_defaults() {
        let registry = ConverterRegistry::new();
        let kinds = registry.register_mapping(mapping(json!({
            "Item": {"name": "name", "desc": {"path": "old"}}
        })));
        assert_eq!(kinds, vec!["Item".to_string()]);

        let record: TranslationRecord =
            serde_json::from_value(json!({"mapping": {"desc": {"path": "new"}}})).unwrap();
        let effective = registry.effective_mapping("Item", &record);

        assert_eq!(effective["name"], "name");
        assert_eq!(effective["desc"]["path"], "new");
    }
}
