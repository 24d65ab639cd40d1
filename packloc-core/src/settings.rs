//! Settings persistence seam.
//!
//! A namespaced key-value surface the loader uses for persisted file lists
//! (the browse-permission fallback) and for sharing the light label/title
//! indexes without re-deriving them.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;

use crate::error::Result;

/// Namespace under which the loader persists its settings.
pub const SETTINGS_NAMESPACE: &str = "packloc";

/// Key holding the shared label index.
pub const SETTING_LABELS: &str = "labels";

/// Key holding the shared title index.
pub const SETTING_TITLE_INDEX: &str = "titleIndex";

/// Key holding the persisted translation file list.
pub const SETTING_TRANSLATION_FILES: &str = "translationFiles";

/// Key holding the persisted mapping file list.
pub const SETTING_MAPPING_FILES: &str = "mappingFiles";

/// Host-owned settings persistence.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Read a namespaced value.
    async fn get(&self, namespace: &str, key: &str) -> Result<Option<Value>>;

    /// Write a namespaced value.
    async fn set(&self, namespace: &str, key: &str, value: Value) -> Result<()>;
}

/// In-memory settings store.
#[derive(Debug, Default)]
pub struct MemorySettings {
    values: RwLock<HashMap<(String, String), Value>>,
}

impl MemorySettings {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a value.
    pub fn with_value(self, namespace: impl Into<String>, key: impl Into<String>, value: Value) -> Self {
        self.values
            .write()
            .insert((namespace.into(), key.into()), value);
        self
    }
}

#[async_trait]
impl SettingsStore for MemorySettings {
    async fn get(&self, namespace: &str, key: &str) -> Result<Option<Value>> {
        Ok(self
            .values
            .read()
            .get(&(namespace.to_string(), key.to_string()))
            .cloned())
    }

    async fn set(&self, namespace: &str, key: &str, value: Value) -> Result<()> {
        self.values
            .write()
            .insert((namespace.to_string(), key.to_string()), value);
        Ok(())
    }
}
