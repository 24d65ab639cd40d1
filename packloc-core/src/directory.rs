//! Candidate-file discovery and caching.

use serde_json::Value;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::config::LoaderConfig;
use crate::settings::{
    SETTING_MAPPING_FILES, SETTING_TRANSLATION_FILES, SETTINGS_NAMESPACE, SettingsStore,
};
use crate::transport::FileTransport;

/// Resolves and caches the candidate translation and mapping file lists.
///
/// Each list is enumerated at most once per process; per-directory browse
/// failures contribute zero files. Without browse permission, a previously
/// persisted file list is used instead of live enumeration.
pub struct DirectoryIndex {
    config: LoaderConfig,
    transport: Arc<dyn FileTransport>,
    settings: Arc<dyn SettingsStore>,
    translation_files: OnceCell<Vec<String>>,
    mapping_files: OnceCell<Vec<String>>,
}

impl DirectoryIndex {
    /// Create an index over the configured directories.
    pub fn new(
        config: LoaderConfig,
        transport: Arc<dyn FileTransport>,
        settings: Arc<dyn SettingsStore>,
    ) -> Self {
        Self {
            config,
            transport,
            settings,
            translation_files: OnceCell::new(),
            mapping_files: OnceCell::new(),
        }
    }

    /// Candidate translation fragment paths.
    pub async fn translation_files(&self) -> &[String] {
        self.translation_files
            .get_or_init(|| async {
                self.list(
                    self.config.translation_directories(),
                    SETTING_TRANSLATION_FILES,
                    |_| true,
                )
                .await
            })
            .await
    }

    /// Candidate mapping file paths. Only `mapping.json` files qualify.
    pub async fn mapping_files(&self) -> &[String] {
        self.mapping_files
            .get_or_init(|| async {
                self.list(self.config.mapping_directories(), SETTING_MAPPING_FILES, |f| {
                    f.ends_with("/mapping.json")
                })
                .await
            })
            .await
    }

    async fn list(
        &self,
        dirs: Vec<String>,
        fallback_key: &str,
        keep: impl Fn(&str) -> bool,
    ) -> Vec<String> {
        if !self.transport.can_browse() {
            warn!(key = fallback_key, "no browse permission, using persisted file list");
            return self.persisted_list(fallback_key).await;
        }

        let mut files = Vec::new();
        for dir in dirs {
            match self.transport.browse(&dir).await {
                Ok(listed) => files.extend(listed.into_iter().filter(|f| keep(f))),
                Err(e) => debug!(dir, error = %e, "directory enumeration failed"),
            }
        }
        files
    }

    async fn persisted_list(&self, key: &str) -> Vec<String> {
        match self.settings.get(SETTINGS_NAMESPACE, key).await {
            Ok(Some(Value::Array(paths))) => paths
                .into_iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            Ok(_) => Vec::new(),
            Err(e) => {
                debug!(key, error = %e, "persisted file list unavailable");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TranslationModule;
    use crate::settings::MemorySettings;
    use crate::transport::MemoryTransport;
    use serde_json::json;

    fn config() -> LoaderConfig {
        LoaderConfig::new("fr").with_module(TranslationModule::new("fr-pack", "fr", "translations"))
    }

    #[tokio::test]
    async fn lists_translation_files_once() {
        let transport = Arc::new(
            MemoryTransport::new()
                .with_file("modules/fr-pack/translations/a.b.json", json!({}))
                .with_file("modules/fr-pack/translations/mapping.json", json!({})),
        );
        let index = DirectoryIndex::new(config(), transport, Arc::new(MemorySettings::new()));

        let files = index.translation_files().await;
        assert_eq!(files.len(), 2);

        let mappings = index.mapping_files().await;
        assert_eq!(
            mappings,
            &["modules/fr-pack/translations/mapping.json".to_string()]
        );
    }

    #[tokio::test]
    async fn missing_directories_contribute_nothing() {
        let transport = Arc::new(MemoryTransport::new());
        let index = DirectoryIndex::new(config(), transport, Arc::new(MemorySettings::new()));
        assert!(index.translation_files().await.is_empty());
    }

    #[tokio::test]
    async fn falls_back_to_persisted_list_without_browse_permission() {
        let transport = Arc::new(
            MemoryTransport::new()
                .with_file("modules/fr-pack/translations/a.b.json", json!({}))
                .without_browse(),
        );
        let settings = Arc::new(MemorySettings::new().with_value(
            SETTINGS_NAMESPACE,
            SETTING_TRANSLATION_FILES,
            json!(["modules/fr-pack/translations/a.b.json"]),
        ));
        let index = DirectoryIndex::new(config(), transport, settings);

        let files = index.translation_files().await;
        assert_eq!(files, &["modules/fr-pack/translations/a.b.json".to_string()]);
        assert!(index.mapping_files().await.is_empty());
    }
}
